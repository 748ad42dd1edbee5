use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }

    /// Both fields must be present before anything is sent.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.email.trim().is_empty() {
            return Err(ModelError::required("email"));
        }
        if self.password.is_empty() {
            return Err(ModelError::required("password"));
        }
        Ok(())
    }
}

/// Identity of the signed-in administrator as issued by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(alias = "_id", default)]
    pub id: String,
    #[serde(alias = "name", default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

/// Token pair returned by `POST /auth/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthTokens {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Raw login response; every field is optional so that a partial body can be
/// rejected explicitly instead of failing deserialization halfway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub tokens: Option<AuthTokens>,
    #[serde(default)]
    pub user: Option<Identity>,
}
