//! Credential claims and user roles.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AuthError, AuthResult};

/// Claim keys carrying the role, in lookup order.
pub const ROLE_CLAIM_KEYS: [&str; 2] = [
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
    "role",
];

/// Claim keys carrying the user identifier, in lookup order.
pub const SUBJECT_CLAIM_KEYS: [&str; 2] = [
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
    "sub",
];

/// User role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Student.
    Student,
    /// Administrator.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// Decoded credential claims.
///
/// Produced only by [`decode_credential`], so a `Claims` value always carries a
/// permitted role.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    role: Role,
    subject: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    raw: Map<String, Value>,
}

impl Claims {
    /// Effective role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// User identifier, if the issuer included one.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Expiry from the `exp` claim. Informational only.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Look up any claim by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// All claims as issued.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

/// Decode a `header.payload.signature` credential into claims.
///
/// The signature is not verified; that is the issuer's job. Fails with
/// `MalformedCredential` when the token shape is wrong and with `UnrecognizedRole`
/// when no permitted role can be read from the payload.
pub fn decode_credential(token: &str) -> AuthResult<Claims> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(AuthError::MalformedCredential(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let header = decode_segment("header", segments[0])?;
    let payload = decode_segment("payload", segments[1])?;
    decode_segment("signature", segments[2])?;

    json_object("header", &header)?;
    let raw = json_object("payload", &payload)?;

    let role = extract_role(&raw)?;
    let subject = first_present(&raw, &SUBJECT_CLAIM_KEYS).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    let expires_at = raw
        .get("exp")
        .and_then(Value::as_i64)
        .and_then(|ts| DateTime::from_timestamp(ts, 0));

    Ok(Claims {
        role,
        subject,
        expires_at,
        raw,
    })
}

fn decode_segment(name: &str, segment: &str) -> AuthResult<Vec<u8>> {
    if segment.is_empty() {
        return Err(AuthError::MalformedCredential(format!("empty {name} segment")));
    }
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| AuthError::MalformedCredential(format!("{name} is not base64url: {e}")))
}

fn json_object(name: &str, bytes: &[u8]) -> AuthResult<Map<String, Value>> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AuthError::MalformedCredential(format!(
            "{name} is not a JSON object"
        ))),
        Err(e) => Err(AuthError::MalformedCredential(format!(
            "{name} is not valid JSON: {e}"
        ))),
    }
}

/// First claim among `keys` holding a non-null, non-empty value.
fn first_present<'a>(raw: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
}

fn extract_role(raw: &Map<String, Value>) -> AuthResult<Role> {
    let value = first_present(raw, &ROLE_CLAIM_KEYS).ok_or(AuthError::UnrecognizedRole(None))?;

    let text = match value {
        Value::String(s) => s.as_str(),
        // Single-role tokens from some issuers wrap the role in an array.
        Value::Array(items) if items.len() == 1 => items[0]
            .as_str()
            .ok_or_else(|| AuthError::UnrecognizedRole(Some(value.to_string())))?,
        other => return Err(AuthError::UnrecognizedRole(Some(other.to_string()))),
    };

    text.parse::<Role>()
        .map_err(|_| AuthError::UnrecognizedRole(Some(text.to_string())))
}
