//! Login flow: form validation, credential exchange, session creation.

use std::sync::Arc;

use log::{info, warn};

use crate::auth::{AuthError, AuthResult, decode_credential};
use crate::issuer::{CredentialIssuer, LoginRequest};
use crate::session::{Identity, SessionManager};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Submitted login form.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Client-side checks, run before any network call.
    pub fn validate(&self) -> AuthResult<()> {
        if !self.email.contains('@') {
            return Err(AuthError::InvalidInput(
                "Please enter a valid email address".to_string(),
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Runs one login attempt end to end.
///
/// On any failure the session manager is left untouched, so the client stays
/// anonymous (or keeps its previous session) and the error is shown inline.
pub struct LoginFlow {
    issuer: Arc<dyn CredentialIssuer>,
    sessions: Arc<SessionManager>,
}

impl LoginFlow {
    pub fn new(issuer: Arc<dyn CredentialIssuer>, sessions: Arc<SessionManager>) -> Self {
        Self { issuer, sessions }
    }

    /// Submit the form.
    ///
    /// Holds the manager's in-flight lock for the whole exchange; a second
    /// submission meanwhile fails with `LoginInProgress`.
    pub async fn submit(&self, form: &LoginForm) -> AuthResult<Identity> {
        let _in_flight = self.sessions.begin_login()?;
        form.validate()?;

        let request = LoginRequest {
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        };
        let response = self.issuer.issue(&request).await.map_err(|e| {
            warn!("credential exchange failed for {}: {}", request.email, e);
            AuthError::from(e)
        })?;

        let claims = decode_credential(&response.token)?;
        let mut account = response.account();
        if account.email.trim().is_empty() {
            account.email = request.email.clone();
        }
        let identity = Identity::new(account.display_name(), claims.role(), response.token)
            .with_account(account);

        self.sessions.login(identity.clone())?;
        info!("login succeeded for {}", request.email);
        Ok(identity)
    }
}
