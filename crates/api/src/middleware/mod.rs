//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated caller from a JWT Bearer token.
//! - [`rbac::RequireModerator`] -- Requires the `moderator` role.

pub mod auth;
pub mod rbac;
