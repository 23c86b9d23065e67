//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - `Deserialize` create/update DTOs where the API writes the table
//!
//! Enumerations are stored as SMALLINT ids; the `*_id` columns are decoded
//! into the core enums through [`decode`].

pub mod block;
pub mod block_status;
pub mod consent;
pub mod flow;
pub mod form_submission;
pub mod module;
pub mod note;
pub mod project;
pub mod project_user;
pub mod role;
pub mod session;
pub mod user;

use cohort_core::error::CoreError;
use cohort_core::status::StatusId;

/// Decode a stored lookup id, reporting an unknown id as an internal error.
pub fn decode<T>(
    id: StatusId,
    from_id: fn(StatusId) -> Option<T>,
    column: &'static str,
) -> Result<T, CoreError> {
    from_id(id).ok_or_else(|| CoreError::Internal(format!("Unknown {column} id {id}")))
}
