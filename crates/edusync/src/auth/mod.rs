//! Authentication module.
//!
//! Provides:
//! - role derivation from issued credentials (no signature verification)
//! - the error taxonomy shared by the login flow and the session manager

mod claims;
mod error;

pub use claims::{Claims, ROLE_CLAIM_KEYS, Role, SUBJECT_CLAIM_KEYS, decode_credential};
pub use error::{AuthError, AuthResult};
