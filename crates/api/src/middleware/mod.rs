//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated identity from a JWT Bearer token.
//!   `Option<AuthUser>` accepts requests without an `Authorization` header.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::RequireResearcher`] -- Requires `researcher` or `admin` role.

pub mod auth;
pub mod rbac;
