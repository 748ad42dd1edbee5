use models::errors::ModelError;
use thiserror::Error;

use crate::storage::StoreError;

/// Errors surfaced to the console's views.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdminError {
    /// Login rejected; shown inline on the login form.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// The server rejected the bearer token; the session has been torn down.
    #[error("session expired, please sign in again")]
    AuthorizationExpired,
    /// No usable session (never signed in, signed out, or not yet restored).
    #[error("not signed in")]
    NotAuthenticated,
    /// Client-side check failed before anything was sent.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Network or server failure; never retried automatically.
    #[error("request failed: {0}")]
    Remote(String),
    #[error("session storage error: {0}")]
    Storage(String),
}

impl AdminError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AdminError::Authentication(_) => 1001,
            AdminError::AuthorizationExpired => 1002,
            AdminError::NotAuthenticated => 1003,
            AdminError::Validation(_) => 1004,
            AdminError::Remote(_) => 1101,
            AdminError::Storage(_) => 1200,
        }
    }

    /// Whether the user has to sign in (again) to continue.
    pub fn requires_login(&self) -> bool {
        matches!(self, AdminError::AuthorizationExpired | AdminError::NotAuthenticated)
    }
}

impl From<ModelError> for AdminError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => AdminError::Validation(msg),
        }
    }
}

impl From<StoreError> for AdminError {
    fn from(e: StoreError) -> Self {
        AdminError::Storage(e.to_string())
    }
}
