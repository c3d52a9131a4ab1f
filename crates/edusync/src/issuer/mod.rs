//! Credential issuer client module.
//!
//! Exchanges an email/password pair for a signed credential and the user's
//! account attributes.

mod client;
mod error;
mod types;

pub use client::{CredentialIssuer, DEFAULT_LOGIN_PATH, HttpIssuer};
pub use error::{IssuerError, IssuerResult};
pub use types::{LoginRequest, LoginResponse};
