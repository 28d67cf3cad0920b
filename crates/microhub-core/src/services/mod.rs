//! External collaborators used by the leaf apps.
//!
//! None of these touch hub state or sync; failures surface to the caller as
//! [`ServiceError`] and are never retried.

mod ai;
mod images;
mod movies;

use thiserror::Error;

pub use ai::{GeminiClient, TextGenerator, EMPTY_ANSWER};
pub use images::{ImageGenerator, PlaceholderImageGenerator};
pub use movies::{rank_titles, MovieDbClient, MovieLookup, DEFAULT_MOVIE_DB_URL};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Service error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("Invalid service payload: {0}")]
    InvalidPayload(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

fn require_prompt(prompt: &str) -> ServiceResult<&str> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ServiceError::InvalidInput("prompt must not be empty".to_string()));
    }
    Ok(prompt)
}

/// Turn a non-success response into [`ServiceError::Api`].
async fn check_status(response: reqwest::Response) -> ServiceResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Api {
        status: status.as_u16(),
        message: crate::util::compact_text(&body),
    })
}
