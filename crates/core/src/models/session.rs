use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// The signed-in user as the auth endpoints describe them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// An authenticated session: `{ user, token }`.
///
/// Where the session is persisted between runs is the embedding
/// application's business; the core only passes it around.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Login form payload.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub user_id: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.user_id.trim().is_empty() || self.password.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Both ID and password are required".into(),
            ));
        }
        Ok(())
    }
}

/// Registration form payload.
#[derive(Clone, Serialize)]
pub struct Registration {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub password: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [&self.user_id, &self.email, &self.name, &self.password];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(CoreError::ValidationError("All fields are required".into()));
        }
        if !self.email.contains('@') {
            return Err(CoreError::ValidationError(format!(
                "'{}' is not an email address",
                self.email
            )));
        }
        Ok(())
    }
}

/// Error body the auth endpoints return on 401/403.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}
