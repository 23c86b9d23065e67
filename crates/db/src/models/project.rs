//! Project entity model and DTOs.

use cohort_core::enrollment::EnrollmentPolicy;
use cohort_core::error::CoreError;
use cohort_core::status::{ProjectStatus, SignupMode, StatusId, VisibilityMode};
use cohort_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::decode;

/// A project row from the `projects` table.
///
/// The participant count is not a column: count `project_users` instead.
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub status_id: StatusId,
    pub signup_mode_id: StatusId,
    pub short_code: Option<String>,
    pub max_participants: i32,
    pub min_age_years: i32,
    pub visibility_mode_id: StatusId,
    pub connect_participant_to_consent: bool,
    pub completion_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn status(&self) -> Result<ProjectStatus, CoreError> {
        decode(self.status_id, ProjectStatus::from_id, "project status")
    }

    pub fn signup_mode(&self) -> Result<SignupMode, CoreError> {
        decode(self.signup_mode_id, SignupMode::from_id, "signup mode")
    }

    pub fn visibility_mode(&self) -> Result<VisibilityMode, CoreError> {
        decode(self.visibility_mode_id, VisibilityMode::from_id, "visibility mode")
    }

    /// Snapshot of the settings the enrollment gate evaluates.
    pub fn enrollment_policy(&self) -> Result<EnrollmentPolicy, CoreError> {
        Ok(EnrollmentPolicy {
            status: self.status()?,
            signup_mode: self.signup_mode()?,
            short_code: self.short_code.clone(),
            max_participants: self.max_participants,
            min_age_years: self.min_age_years,
        })
    }
}

/// Administrator view of a project, with decoded enums and the live count.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectResponse {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub signup_mode: SignupMode,
    pub short_code: Option<String>,
    pub max_participants: i32,
    pub min_age_years: i32,
    pub visibility_mode: VisibilityMode,
    pub connect_participant_to_consent: bool,
    pub completion_message: Option<String>,
    pub participant_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProjectResponse {
    pub fn new(project: Project, participant_count: i64) -> Result<Self, CoreError> {
        Ok(Self {
            status: project.status()?,
            signup_mode: project.signup_mode()?,
            visibility_mode: project.visibility_mode()?,
            id: project.id,
            name: project.name,
            description: project.description,
            short_code: project.short_code,
            max_participants: project.max_participants,
            min_age_years: project.min_age_years,
            connect_participant_to_consent: project.connect_participant_to_consent,
            completion_message: project.completion_message,
            participant_count,
            created_at: project.created_at,
            updated_at: project.updated_at,
        })
    }
}

/// DTO for creating a new project. Omitted settings take the column defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub signup_mode: Option<SignupMode>,
    pub short_code: Option<String>,
    pub max_participants: Option<i32>,
    pub min_age_years: Option<i32>,
    pub visibility_mode: Option<VisibilityMode>,
    pub connect_participant_to_consent: Option<bool>,
    pub completion_message: Option<String>,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub signup_mode: Option<SignupMode>,
    pub short_code: Option<String>,
    pub max_participants: Option<i32>,
    pub min_age_years: Option<i32>,
    pub visibility_mode: Option<VisibilityMode>,
    pub connect_participant_to_consent: Option<bool>,
    pub completion_message: Option<String>,
}
