//! microhub-core - Core library for MicroHub
//!
//! This crate contains the models, local store, remote endpoint contract and
//! the sync coordinator shared by every MicroHub surface (CLI, reference API).

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod store;
pub mod sync;
pub mod timer;
pub mod util;

pub use error::{Error, Result};
pub use models::{Connection, EntityId, JournalEntry, Movie, Task};
pub use state::HubState;
pub use sync::SyncCoordinator;

#[cfg(test)]
mod test_support;
