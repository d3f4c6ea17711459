//! Read-side failures of the observer API.
//!
//! Command endpoints never produce these for unknown ids; they answer
//! `{ "ok": false }` instead.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// A request the observer API could not serve.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// No entity has the id in the path.
    #[error("{0} not found")]
    NotFound(String),

    /// The path segment is not a UUID.
    #[error("malformed id `{0}`")]
    InvalidUuid(String),

    /// The body parsed but its values are unusable.
    #[error("rejected: {0}")]
    InvalidRequest(String),
}

impl ObserverError {
    /// HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidUuid(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
