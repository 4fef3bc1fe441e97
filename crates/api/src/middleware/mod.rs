//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller from a JWT Bearer token.
//! - [`rbac::RequireStaff`] -- Rejects parent sessions; staff only.

pub mod auth;
pub mod rbac;
