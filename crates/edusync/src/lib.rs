//! EduSync client core.
//!
//! Session lifecycle, credential decoding, route authorization and role-scoped
//! navigation for the student/administrator LMS client.

pub mod auth;
pub mod config;
pub mod issuer;
pub mod login;
pub mod nav;
pub mod resource;
pub mod routes;
pub mod session;
