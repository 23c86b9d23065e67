pub mod admin_content;
pub mod admin_projects;
pub mod auth;
pub mod consent;
pub mod participation;
