//! Consent form and consent response models.

use cohort_core::error::CoreError;
use cohort_core::status::{ConsentDecision, StatusId};
use cohort_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::decode;

/// A row from the `consent_forms` table. At most one per project.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConsentForm {
    pub id: DbId,
    pub project_id: DbId,
    pub content: String,
    pub contact_info: Option<String>,
    pub institution: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertConsentForm {
    pub content: String,
    pub contact_info: Option<String>,
    pub institution: Option<String>,
}

/// A row from the append-only `consent_responses` table.
///
/// `user_id` is `0` for projects that do not connect consent to participants.
#[derive(Debug, Clone, FromRow)]
pub struct ConsentResponse {
    pub id: DbId,
    pub project_id: DbId,
    pub consent_form_id: Option<DbId>,
    pub user_id: DbId,
    pub decision_id: StatusId,
    pub participant_comment: Option<String>,
    pub researcher_comment: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact_info: Option<String>,
    pub created_at: Timestamp,
}

impl ConsentResponse {
    pub fn decision(&self) -> Result<ConsentDecision, CoreError> {
        decode(self.decision_id, ConsentDecision::from_id, "consent decision")
    }
}

/// Consent response as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ConsentResponseView {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: DbId,
    pub decision: ConsentDecision,
    pub participant_comment: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact_info: Option<String>,
    pub created_at: Timestamp,
}

impl ConsentResponseView {
    pub fn new(response: ConsentResponse) -> Result<Self, CoreError> {
        Ok(Self {
            decision: response.decision()?,
            id: response.id,
            project_id: response.project_id,
            user_id: response.user_id,
            participant_comment: response.participant_comment,
            first_name: response.first_name,
            last_name: response.last_name,
            contact_info: response.contact_info,
            created_at: response.created_at,
        })
    }
}

pub struct CreateConsentResponse {
    pub project_id: DbId,
    pub consent_form_id: Option<DbId>,
    pub user_id: DbId,
    pub decision: ConsentDecision,
    pub participant_comment: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact_info: Option<String>,
}
