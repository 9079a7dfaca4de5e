//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- JWT access-token generation and validation.

pub mod jwt;
pub mod password;

/// Role claim carried by moderator tokens.
pub const ROLE_MODERATOR: &str = "moderator";
