//! Participant identity rules for the consent flow.
//!
//! Which fields a new identity needs depends on the project's visibility
//! mode. `code` projects never store a name or email: their participants get
//! a generated numeric participant code instead.

use rand::Rng;
use serde::Deserialize;
use validator::Validate;

use crate::error::CoreError;
use crate::status::VisibilityMode;
use crate::types::{DbId, Timestamp};

/// Number of random digits in a participant code.
pub const PARTICIPANT_CODE_DIGITS: usize = 5;

/// Identity fields a participant submits together with their consent.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct IdentityPayload {
    #[validate(length(min = 1, max = 200))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub password: Option<String>,
    pub date_of_birth: Option<String>,
    #[validate(length(max = 50))]
    pub title: Option<String>,
    #[validate(length(max = 50))]
    pub pronouns: Option<String>,
}

/// A validated request to create an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewIdentity {
    /// Code identity: only what the age check and login need.
    Anonymous {
        date_of_birth: Option<String>,
        password: Option<String>,
    },
    Full {
        first_name: String,
        last_name: String,
        email: String,
        password: String,
        date_of_birth: String,
        title: Option<String>,
        pronouns: Option<String>,
    },
}

impl NewIdentity {
    pub fn date_of_birth(&self) -> Option<&str> {
        match self {
            NewIdentity::Anonymous { date_of_birth, .. } => date_of_birth.as_deref(),
            NewIdentity::Full { date_of_birth, .. } => Some(date_of_birth),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, NewIdentity::Anonymous { .. })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Turn a submitted payload into a [`NewIdentity`] for the given mode.
///
/// In `code` mode every personal field is dropped before validation, so a
/// client sending a name or email to a code project is not an error; the
/// values are simply never stored.
pub fn prepare_new_identity(
    mode: VisibilityMode,
    payload: IdentityPayload,
) -> Result<NewIdentity, CoreError> {
    if mode == VisibilityMode::Code {
        return Ok(NewIdentity::Anonymous {
            date_of_birth: non_blank(payload.date_of_birth),
            password: payload.password.filter(|p| !p.is_empty()),
        });
    }

    payload
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let first_name = non_blank(payload.first_name);
    let last_name = non_blank(payload.last_name);
    let email = non_blank(payload.email);
    let password = payload.password.filter(|p| !p.is_empty());
    let date_of_birth = non_blank(payload.date_of_birth);

    let mut missing = Vec::new();
    if first_name.is_none() {
        missing.push("first_name");
    }
    if last_name.is_none() {
        missing.push("last_name");
    }
    if email.is_none() {
        missing.push("email");
    }
    if password.is_none() {
        missing.push("password");
    }
    if date_of_birth.is_none() {
        missing.push("date_of_birth");
    }

    match (first_name, last_name, email, password, date_of_birth) {
        (Some(first_name), Some(last_name), Some(email), Some(password), Some(date_of_birth)) => {
            Ok(NewIdentity::Full {
                first_name,
                last_name,
                email: email.to_lowercase(),
                password,
                date_of_birth,
                title: non_blank(payload.title),
                pronouns: non_blank(payload.pronouns),
            })
        }
        _ => Err(CoreError::Validation(format!(
            "Missing required identity fields: {}",
            missing.join(", ")
        ))),
    }
}

/// Build a participant code from its parts: the project id, the random
/// digits, then the seconds value of the creation time.
pub fn participant_code(
    project_id: DbId,
    digits: &[u8; PARTICIPANT_CODE_DIGITS],
    seconds: u32,
) -> String {
    let random: String = digits.iter().map(|d| char::from(b'0' + (d % 10))).collect();
    format!("{project_id}{random}{seconds}")
}

/// Generate a fresh participant code.
///
/// Uniqueness is not guaranteed here; the `users.username` unique constraint
/// catches collisions and the caller retries with a new code.
pub fn generate_participant_code(project_id: DbId, now: Timestamp) -> String {
    use chrono::Timelike;

    let mut rng = rand::rng();
    let mut digits = [0u8; PARTICIPANT_CODE_DIGITS];
    for digit in &mut digits {
        *digit = rng.random_range(0..10);
    }
    participant_code(project_id, &digits, now.second())
}
