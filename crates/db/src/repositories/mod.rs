//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod block_repo;
pub mod block_status_repo;
pub mod consent_repo;
pub mod flow_repo;
pub mod form_submission_repo;
pub mod module_repo;
pub mod note_repo;
pub mod project_repo;
pub mod project_user_repo;
pub mod role_repo;
pub mod session_repo;
pub mod user_repo;

pub use block_repo::BlockRepo;
pub use block_status_repo::BlockStatusRepo;
pub use consent_repo::{ConsentFormRepo, ConsentResponseRepo};
pub use flow_repo::FlowRepo;
pub use form_submission_repo::FormSubmissionRepo;
pub use module_repo::ModuleRepo;
pub use note_repo::NoteRepo;
pub use project_repo::ProjectRepo;
pub use project_user_repo::ProjectUserRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
