//! Reference remote endpoint for MicroHub sync.
//!
//! Serves the single-URL action protocol the hub speaks: `POST /` with an
//! `action` body, `GET /` for snapshots.

pub mod config;
pub mod error;
pub mod keys;
pub mod rate_limit;
pub mod routes;
pub mod store;

pub use config::ApiConfig;
pub use error::AppError;
pub use routes::{app_router, AppState};
pub use store::StoreRegistry;
