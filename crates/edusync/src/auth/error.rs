//! Authentication errors.

use thiserror::Error;

use crate::issuer::IssuerError;
use crate::session::StoreError;

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors.
///
/// Every variant is recoverable: the session stays anonymous and the message is
/// shown to the user.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credential is not a three-segment base64url token with a JSON payload.
    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    /// Role claim missing, or not one of the permitted roles.
    #[error("{}", unrecognized_role_message(.0.as_deref()))]
    UnrecognizedRole(Option<String>),

    /// Identity does not satisfy the session invariant.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// Login form rejected before any network call.
    #[error("{0}")]
    InvalidInput(String),

    /// Credential issuer rejected the request or could not be reached.
    #[error("login failed: {0}")]
    IssuanceFailure(#[from] IssuerError),

    /// Another login is already in flight.
    #[error("a login request is already in progress")]
    LoginInProgress,

    /// Session store failure.
    #[error("session store error: {0}")]
    Store(#[from] StoreError),
}

fn unrecognized_role_message(role: Option<&str>) -> String {
    match role {
        Some(role) => format!("unrecognized role: {role}"),
        None => "credential carries no role claim".to_string(),
    }
}

impl AuthError {
    /// Stable machine-readable code for the error.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MalformedCredential(_) => "malformed_credential",
            AuthError::UnrecognizedRole(_) => "unrecognized_role",
            AuthError::InvalidIdentity(_) => "invalid_identity",
            AuthError::InvalidInput(_) => "invalid_input",
            AuthError::IssuanceFailure(_) => "issuance_failure",
            AuthError::LoginInProgress => "login_in_progress",
            AuthError::Store(_) => "store_error",
        }
    }
}
