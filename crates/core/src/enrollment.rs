//! Enrollment gate: may this candidate be linked to this project right now?
//!
//! The gate is a pure function over a snapshot of the project's settings, the
//! live participant count and the candidate. Checks run in a fixed order and
//! the first failure wins, so the same inputs always yield the same reason.

use crate::age::{age_in_years, parse_date_of_birth};
use crate::error::{CoreError, DenialReason};
use crate::status::{ProjectStatus, SignupMode};
use crate::types::Timestamp;

/// The project settings the gate looks at.
#[derive(Debug, Clone)]
pub struct EnrollmentPolicy {
    pub status: ProjectStatus,
    pub signup_mode: SignupMode,
    pub short_code: Option<String>,
    /// `0` means unlimited.
    pub max_participants: i32,
    /// `0` disables the age check.
    pub min_age_years: i32,
}

/// The identity asking to join.
#[derive(Debug, Clone, Default)]
pub struct Candidate<'a> {
    /// Whether a project link already exists for this identity.
    pub already_linked: bool,
    /// Raw stored date of birth, parsed only when an age check applies.
    pub date_of_birth: Option<&'a str>,
}

/// Evaluate the gate.
///
/// `participant_count` must be counted from the link table at call time.
/// Once the project is active, an already linked candidate is admitted
/// without further checks: re-enrollment is idempotent and never takes a
/// new slot.
pub fn evaluate(
    policy: &EnrollmentPolicy,
    participant_count: i64,
    candidate: &Candidate<'_>,
    provided_code: Option<&str>,
    now: Timestamp,
) -> Result<(), DenialReason> {
    if policy.status != ProjectStatus::Active {
        return Err(DenialReason::ProjectUnavailable);
    }
    if candidate.already_linked {
        return Ok(());
    }

    match policy.signup_mode {
        SignupMode::Closed => return Err(DenialReason::SignupClosed),
        SignupMode::WithCode => {
            let expected = policy.short_code.as_deref().unwrap_or_default();
            // A missing code and a wrong code are deliberately indistinguishable.
            if expected.is_empty() || provided_code != Some(expected) {
                return Err(DenialReason::CodeMismatch);
            }
        }
        SignupMode::Open => {}
    }

    if policy.max_participants > 0 && participant_count >= i64::from(policy.max_participants) {
        return Err(DenialReason::CapacityReached);
    }

    if policy.min_age_years > 0 {
        let age = candidate
            .date_of_birth
            .and_then(parse_date_of_birth)
            .map(|birth| age_in_years(birth, now));
        match age {
            Some(years) if years >= policy.min_age_years => {}
            _ => return Err(DenialReason::AgeNotMet),
        }
    }

    Ok(())
}

/// Settings an administrator submits when creating or editing a project.
#[derive(Debug, Clone, Copy)]
pub struct ProjectSettings<'a> {
    pub signup_mode: SignupMode,
    pub short_code: Option<&'a str>,
    pub max_participants: i32,
    pub min_age_years: i32,
}

/// Validate project enrollment settings before they are stored.
pub fn validate_project_settings(settings: &ProjectSettings<'_>) -> Result<(), CoreError> {
    if settings.signup_mode == SignupMode::WithCode
        && settings.short_code.map_or(true, |c| c.trim().is_empty())
    {
        return Err(CoreError::Validation(
            "Signup mode 'with_code' requires a non-empty short_code".to_string(),
        ));
    }
    if settings.max_participants < 0 {
        return Err(CoreError::Validation(
            "max_participants must be 0 (unlimited) or positive".to_string(),
        ));
    }
    if settings.min_age_years < 0 {
        return Err(CoreError::Validation(
            "min_age_years must be 0 (no check) or positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn open_policy() -> EnrollmentPolicy {
        EnrollmentPolicy {
            status: ProjectStatus::Active,
            signup_mode: SignupMode::Open,
            short_code: None,
            max_participants: 0,
            min_age_years: 0,
        }
    }

    fn coded_policy() -> EnrollmentPolicy {
        EnrollmentPolicy {
            signup_mode: SignupMode::WithCode,
            short_code: Some("ABC123".to_string()),
            max_participants: 1,
            min_age_years: 18,
            ..open_policy()
        }
    }

    fn adult() -> Candidate<'static> {
        Candidate {
            already_linked: false,
            date_of_birth: Some("2006-01-01"),
        }
    }

    #[test]
    fn open_project_admits_anyone() {
        assert!(evaluate(&open_policy(), 500, &Candidate::default(), None, now()).is_ok());
    }

    #[test]
    fn inactive_projects_are_unavailable() {
        for status in [
            ProjectStatus::Pending,
            ProjectStatus::Disabled,
            ProjectStatus::Completed,
        ] {
            let policy = EnrollmentPolicy {
                status,
                ..open_policy()
            };
            assert_eq!(
                evaluate(&policy, 0, &Candidate::default(), None, now()),
                Err(DenialReason::ProjectUnavailable)
            );
        }
    }

    #[test]
    fn closed_signup_is_refused() {
        let policy = EnrollmentPolicy {
            signup_mode: SignupMode::Closed,
            ..open_policy()
        };
        assert_eq!(
            evaluate(&policy, 0, &Candidate::default(), None, now()),
            Err(DenialReason::SignupClosed)
        );
    }

    #[test]
    fn code_must_match_exactly() {
        let policy = coded_policy();
        assert!(evaluate(&policy, 0, &adult(), Some("ABC123"), now()).is_ok());
        assert_eq!(
            evaluate(&policy, 0, &adult(), Some("abc123"), now()),
            Err(DenialReason::CodeMismatch)
        );
        assert_eq!(
            evaluate(&policy, 0, &adult(), Some("XYZ"), now()),
            Err(DenialReason::CodeMismatch)
        );
    }

    #[test]
    fn missing_code_reports_same_reason_as_wrong_code() {
        assert_eq!(
            evaluate(&coded_policy(), 0, &adult(), None, now()),
            Err(DenialReason::CodeMismatch)
        );
    }

    #[test]
    fn capacity_is_strictly_less_than_max() {
        let policy = coded_policy();
        assert_eq!(
            evaluate(&policy, 1, &adult(), Some("ABC123"), now()),
            Err(DenialReason::CapacityReached)
        );
    }

    #[test]
    fn linked_candidate_does_not_consume_a_slot() {
        let linked = Candidate {
            already_linked: true,
            ..adult()
        };
        assert!(evaluate(&coded_policy(), 1, &linked, Some("ABC123"), now()).is_ok());
    }

    #[test]
    fn linked_candidate_reenrolls_after_signup_changes() {
        let linked = Candidate {
            already_linked: true,
            date_of_birth: None,
        };
        let closed = EnrollmentPolicy {
            signup_mode: SignupMode::Closed,
            ..open_policy()
        };
        assert!(evaluate(&closed, 0, &linked, None, now()).is_ok());
        assert!(evaluate(&coded_policy(), 1, &linked, None, now()).is_ok());
        assert!(evaluate(&coded_policy(), 1, &linked, Some("wrong"), now()).is_ok());
    }

    #[test]
    fn linked_candidate_still_needs_an_active_project() {
        let linked = Candidate {
            already_linked: true,
            ..adult()
        };
        let disabled = EnrollmentPolicy {
            status: ProjectStatus::Disabled,
            ..open_policy()
        };
        assert_eq!(
            evaluate(&disabled, 0, &linked, None, now()),
            Err(DenialReason::ProjectUnavailable)
        );
    }

    #[test]
    fn age_gate_boundaries() {
        let policy = EnrollmentPolicy {
            min_age_years: 18,
            ..open_policy()
        };
        let passes = Candidate {
            already_linked: false,
            date_of_birth: Some("2008-06-14T12:00:00Z"),
        };
        let fails = Candidate {
            already_linked: false,
            date_of_birth: Some("2008-06-16T12:00:00Z"),
        };
        assert!(evaluate(&policy, 0, &passes, None, now()).is_ok());
        assert_eq!(
            evaluate(&policy, 0, &fails, None, now()),
            Err(DenialReason::AgeNotMet)
        );
    }

    #[test]
    fn unparseable_or_missing_birth_date_fails_age_rule() {
        let policy = EnrollmentPolicy {
            min_age_years: 18,
            ..open_policy()
        };
        let garbage = Candidate {
            already_linked: false,
            date_of_birth: Some("yesterday"),
        };
        assert_eq!(
            evaluate(&policy, 0, &garbage, None, now()),
            Err(DenialReason::AgeNotMet)
        );
        assert_eq!(
            evaluate(&policy, 0, &Candidate::default(), None, now()),
            Err(DenialReason::AgeNotMet)
        );
    }

    #[test]
    fn checks_run_in_fixed_order() {
        // Every rule would fail; the status check must win.
        let policy = EnrollmentPolicy {
            status: ProjectStatus::Disabled,
            ..coded_policy()
        };
        assert_eq!(
            evaluate(&policy, 9, &Candidate::default(), Some("nope"), now()),
            Err(DenialReason::ProjectUnavailable)
        );
        // Code mismatch beats capacity and age.
        assert_eq!(
            evaluate(&coded_policy(), 9, &Candidate::default(), Some("nope"), now()),
            Err(DenialReason::CodeMismatch)
        );
        // Capacity beats age.
        assert_eq!(
            evaluate(&coded_policy(), 9, &Candidate::default(), Some("ABC123"), now()),
            Err(DenialReason::CapacityReached)
        );
    }

    #[test]
    fn with_code_requires_short_code() {
        let settings = ProjectSettings {
            signup_mode: SignupMode::WithCode,
            short_code: Some("  "),
            max_participants: 0,
            min_age_years: 0,
        };
        assert_matches!(
            validate_project_settings(&settings),
            Err(CoreError::Validation(msg)) if msg.contains("short_code")
        );
    }

    #[test]
    fn negative_limits_are_rejected() {
        let settings = ProjectSettings {
            signup_mode: SignupMode::Open,
            short_code: None,
            max_participants: -1,
            min_age_years: 0,
        };
        assert!(validate_project_settings(&settings).is_err());

        let settings = ProjectSettings {
            max_participants: 10,
            min_age_years: -3,
            ..settings
        };
        assert!(validate_project_settings(&settings).is_err());
    }

    #[test]
    fn valid_settings_pass() {
        let settings = ProjectSettings {
            signup_mode: SignupMode::WithCode,
            short_code: Some("ABC123"),
            max_participants: 50,
            min_age_years: 18,
        };
        assert!(validate_project_settings(&settings).is_ok());
    }
}
