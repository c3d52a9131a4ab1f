//! Session data models.

use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, AuthResult, Role, decode_credential};

/// User attributes returned by the credential issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Account {
    /// "First Last", skipping empty parts.
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    /// Full name, or the email when the issuer sent no name.
    pub fn display_name(&self) -> String {
        let name = self.full_name();
        if name.is_empty() {
            self.email.trim().to_string()
        } else {
            name
        }
    }
}

fn join_name(first: &str, last: &str) -> String {
    [first.trim(), last.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The logged-in user.
///
/// Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Display name.
    pub name: String,
    /// Access level.
    pub role: Role,
    /// Opaque signed credential, sent as the bearer token.
    pub credential: String,
    /// Issuer attributes, when the identity came from a login exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
}

impl Identity {
    /// Create an identity without issuer attributes.
    pub fn new(name: impl Into<String>, role: Role, credential: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            credential: credential.into(),
            account: None,
        }
    }

    /// Attach issuer attributes.
    pub fn with_account(mut self, account: Account) -> Self {
        self.account = Some(account);
        self
    }

    /// Check the session invariant: non-empty name, and a credential that
    /// decodes to this identity's role.
    pub fn validate(&self) -> AuthResult<()> {
        if self.name.trim().is_empty() {
            return Err(AuthError::InvalidIdentity("name is empty".to_string()));
        }
        if self.credential.trim().is_empty() {
            return Err(AuthError::InvalidIdentity("credential is empty".to_string()));
        }
        if self.credential.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidIdentity(
                "credential contains whitespace".to_string(),
            ));
        }
        let claims = decode_credential(&self.credential).map_err(|e| {
            AuthError::InvalidIdentity(format!("credential does not decode: {e}"))
        })?;
        if claims.role() != self.role {
            return Err(AuthError::InvalidIdentity(format!(
                "credential role {} does not match {}",
                claims.role(),
                self.role
            )));
        }
        Ok(())
    }

    /// User identifier used by resource endpoints.
    pub fn user_id(&self) -> Option<&str> {
        self.account
            .as_ref()
            .map(|a| a.id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// Durable form of this identity.
    pub fn to_record(&self) -> SessionRecord {
        match &self.account {
            Some(account) => SessionRecord {
                id: account.id.clone(),
                first_name: account.first_name.clone(),
                last_name: account.last_name.clone(),
                email: account.email.clone(),
                token: self.credential.clone(),
            },
            None => SessionRecord {
                id: String::new(),
                first_name: self.name.clone(),
                last_name: String::new(),
                email: String::new(),
                token: self.credential.clone(),
            },
        }
    }

    /// Rebuild an identity from its durable form.
    ///
    /// The role is not stored; it is re-derived from the credential, so a record
    /// whose token no longer decodes yields an error instead of a session.
    pub fn from_record(record: &SessionRecord) -> AuthResult<Self> {
        let claims = decode_credential(&record.token)?;
        let stored = Account {
            id: record.id.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
        };
        let name = stored.display_name();

        let account = if record.id.is_empty() && record.email.is_empty() {
            None
        } else {
            Some(stored)
        };

        let identity = Identity {
            name,
            role: claims.role(),
            credential: record.token.clone(),
            account,
        };
        identity.validate()?;
        Ok(identity)
    }
}

/// Persisted session, in the shape the issuer returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub token: String,
}

/// Current authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(Identity),
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(identity) => Some(identity),
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|identity| identity.role)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// Explicit logout.
    UserRequested,
    /// A resource API answered 401.
    Unauthorized,
    /// The stored record could not be turned back into an identity.
    InvalidStoredSession,
}

impl std::fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogoutReason::UserRequested => write!(f, "user requested"),
            LogoutReason::Unauthorized => write!(f, "credential rejected by server"),
            LogoutReason::InvalidStoredSession => write!(f, "stored session is invalid"),
        }
    }
}

/// Session change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { name: String, role: Role },
    LoggedOut { reason: LogoutReason },
}
