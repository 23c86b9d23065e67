//! Domain logic for study enrollment and participant progress.
//!
//! Everything in this crate is pure: no database access, no HTTP. The `db`
//! crate persists the values defined here and the `api` crate orchestrates
//! them per request.

pub mod age;
pub mod block_content;
pub mod consent;
pub mod enrollment;
pub mod error;
pub mod flow;
pub mod form;
pub mod identity;
pub mod progress;
pub mod roles;
pub mod status;
pub mod types;
