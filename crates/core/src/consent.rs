//! Consent submission rules and the consent-form edit lock.

use serde::Deserialize;

use crate::error::{CoreError, DenialReason};
use crate::identity::IdentityPayload;
use crate::status::ConsentDecision;

/// Maximum length of free-text consent comments.
pub const MAX_COMMENT_LENGTH: usize = 5_000;

/// A participant's consent submission for one project.
///
/// The name and contact fields are what the participant writes on the
/// consent form itself. They are stored with the response and never copied
/// from, or into, the account record.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsentSubmission {
    pub decision: ConsentDecision,
    /// Signup code for `with_code` projects.
    pub code: Option<String>,
    /// Required when the caller is not authenticated.
    pub identity: Option<IdentityPayload>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact_info: Option<String>,
    pub participant_comment: Option<String>,
}

/// Validate the consent-specific fields of a submission.
pub fn validate_submission(submission: &ConsentSubmission) -> Result<(), CoreError> {
    if let Some(comment) = &submission.participant_comment {
        if comment.len() > MAX_COMMENT_LENGTH {
            return Err(CoreError::Validation(format!(
                "participant_comment must be at most {MAX_COMMENT_LENGTH} characters"
            )));
        }
    }

    // Consent on behalf of someone else must say on whose behalf.
    if submission.decision == ConsentDecision::AcceptedForOther {
        let named = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !named(&submission.first_name) || !named(&submission.last_name) {
            return Err(CoreError::Validation(
                "accepted_for_other requires first_name and last_name of the represented person"
                    .to_string(),
            ));
        }
    }
    Ok(())
}

/// Validate consent form content before saving.
pub fn validate_form_content(content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::Validation(
            "Consent form content must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Check whether a consent form may be saved or deleted.
///
/// Once a project has participants the text they agreed to is frozen. Only an
/// administrator passing an explicit override may change it.
pub fn check_form_mutation(
    participant_count: i64,
    override_requested: bool,
    caller_is_admin: bool,
) -> Result<(), CoreError> {
    if participant_count == 0 || (override_requested && caller_is_admin) {
        Ok(())
    } else {
        Err(CoreError::Denied(DenialReason::ParticipantsNotZero))
    }
}
