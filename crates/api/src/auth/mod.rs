//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- Access-token generation/validation and refresh-token helpers.
//! - [`session`] -- Issues a token pair plus session row for an identity.

pub mod jwt;
pub mod password;
pub mod session;
