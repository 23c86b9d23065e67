use crate::types::DbId;

/// Reasons a policy check refused an operation.
///
/// The enrollment gate and the consent-form edit lock report through this
/// enum so callers can surface a stable machine-readable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    ProjectUnavailable,
    SignupClosed,
    CodeMismatch,
    CapacityReached,
    AgeNotMet,
    ParticipantsNotZero,
}

impl DenialReason {
    /// Stable error code returned to API clients.
    pub fn code(self) -> &'static str {
        match self {
            DenialReason::ProjectUnavailable => "PROJECT_UNAVAILABLE",
            DenialReason::SignupClosed => "SIGNUP_CLOSED",
            DenialReason::CodeMismatch => "CODE_MISMATCH",
            DenialReason::CapacityReached => "CAPACITY_REACHED",
            DenialReason::AgeNotMet => "AGE_NOT_MET",
            DenialReason::ParticipantsNotZero => "PARTICIPANTS_NOT_ZERO",
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            DenialReason::ProjectUnavailable => "Project is not available",
            DenialReason::SignupClosed => "Signup for this project is closed",
            DenialReason::CodeMismatch => "The project code is not valid",
            DenialReason::CapacityReached => "The project has reached its participant limit",
            DenialReason::AgeNotMet => "The minimum participant age is not met",
            DenialReason::ParticipantsNotZero => {
                "The project already has participants; consent form changes require an override"
            }
        };
        f.write_str(msg)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Wrong endpoint: {0}")]
    WrongEndpoint(String),

    #[error("{0}")]
    Denied(DenialReason),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DenialReason> for CoreError {
    fn from(reason: DenialReason) -> Self {
        CoreError::Denied(reason)
    }
}
