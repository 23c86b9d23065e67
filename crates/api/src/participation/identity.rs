//! Resolves the identity behind a consent submission.
//!
//! Resolution runs in two phases so nothing is written for a submission the
//! enrollment gate refuses: [`IdentityResolver::plan`] only reads, and
//! [`IdentityResolver::materialize`] creates the identity and its session.

use std::sync::Arc;

use chrono::Utc;
use cohort_core::error::CoreError;
use cohort_core::identity::{
    generate_participant_code, prepare_new_identity, IdentityPayload, NewIdentity,
};
use cohort_core::roles::{PARTICIPANT_ROLE_ID, ROLE_PARTICIPANT};
use cohort_core::status::VisibilityMode;
use cohort_core::types::DbId;
use cohort_db::models::user::{CreateUser, User};
use cohort_db::repositories::{RoleRepo, UserRepo};
use sqlx::PgPool;

use crate::auth::password::{generate_secret, hash_password, validate_password_strength};
use crate::auth::session::{issue_session, AuthResponse};
use crate::config::ServerConfig;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::middleware::auth::AuthUser;

const USERNAME_CONSTRAINT: &str = "uq_users_username";

/// What [`IdentityResolver::materialize`] will do.
#[derive(Debug)]
pub enum IdentityPlan {
    /// Use a stored identity as is.
    Existing(User),
    /// Create a new participant identity.
    Create(NewIdentity),
}

impl IdentityPlan {
    /// Date of birth the enrollment gate should check.
    pub fn date_of_birth(&self) -> Option<&str> {
        match self {
            IdentityPlan::Existing(user) => user.date_of_birth.as_deref(),
            IdentityPlan::Create(new) => new.date_of_birth(),
        }
    }

    pub fn existing_id(&self) -> Option<DbId> {
        match self {
            IdentityPlan::Existing(user) => Some(user.id),
            IdentityPlan::Create(_) => None,
        }
    }
}

/// The identity a submission is recorded against.
#[derive(Debug)]
pub struct ResolvedParticipant {
    pub user: User,
    pub role: String,
    /// Tokens for a newly created identity. `None` when an existing identity
    /// was reused.
    pub session: Option<AuthResponse>,
}

pub struct IdentityResolver {
    pool: PgPool,
    config: Arc<ServerConfig>,
}

impl IdentityResolver {
    pub fn new(pool: PgPool, config: Arc<ServerConfig>) -> Self {
        Self { pool, config }
    }

    /// Decide which identity a submission belongs to. Read-only.
    ///
    /// An authenticated caller is reloaded from the store. In `code` projects a
    /// caller with a full account gets a fresh anonymous identity instead, so
    /// the consent record never points at a named account. An anonymous
    /// caller is reused, which keeps re-consent idempotent.
    pub async fn plan(
        &self,
        caller: Option<&AuthUser>,
        mode: VisibilityMode,
        payload: Option<IdentityPayload>,
    ) -> AppResult<IdentityPlan> {
        if let Some(caller) = caller {
            let user = UserRepo::find_by_id(&self.pool, caller.user_id)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Unauthorized("Identity no longer exists".into()))
                })?;
            if !user.is_active {
                return Err(AppError::Core(CoreError::Forbidden(
                    "Account is deactivated".into(),
                )));
            }

            if mode == VisibilityMode::Code && !user.is_anonymous {
                let submitted = prepare_new_identity(mode, payload.unwrap_or_default())?;
                let date_of_birth = submitted
                    .date_of_birth()
                    .map(str::to_string)
                    .or_else(|| user.date_of_birth.clone());
                tracing::debug!(
                    user_id = user.id,
                    "Full account enrolling in code project, minting anonymous identity"
                );
                return Ok(IdentityPlan::Create(NewIdentity::Anonymous {
                    date_of_birth,
                    password: None,
                }));
            }
            return Ok(IdentityPlan::Existing(user));
        }

        let payload = payload.ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "Identity fields are required when not logged in".into(),
            ))
        })?;
        let new = prepare_new_identity(mode, payload)?;

        let password = match &new {
            NewIdentity::Anonymous { password, .. } => password.as_deref(),
            NewIdentity::Full { password, .. } => Some(password.as_str()),
        };
        if let Some(password) = password {
            validate_password_strength(password, self.config.min_password_length)
                .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
        }

        if let NewIdentity::Full { email, .. } = &new {
            if UserRepo::find_by_username(&self.pool, email).await?.is_some() {
                return Err(AppError::Core(CoreError::Conflict(
                    "An account with this email already exists. Log in to continue.".into(),
                )));
            }
        }
        Ok(IdentityPlan::Create(new))
    }

    /// Carry out a plan. New identities get a participant role and a session.
    pub async fn materialize(
        &self,
        plan: IdentityPlan,
        project_id: DbId,
    ) -> AppResult<ResolvedParticipant> {
        let new = match plan {
            IdentityPlan::Existing(user) => {
                let role = RoleRepo::resolve_name(&self.pool, user.role_id).await?;
                return Ok(ResolvedParticipant {
                    user,
                    role,
                    session: None,
                });
            }
            IdentityPlan::Create(new) => new,
        };

        let user = match new {
            NewIdentity::Full {
                first_name,
                last_name,
                email,
                password,
                date_of_birth,
                title,
                pronouns,
            } => {
                let input = CreateUser {
                    username: email.clone(),
                    email: Some(email),
                    first_name: Some(first_name),
                    last_name: Some(last_name),
                    title,
                    pronouns,
                    date_of_birth: Some(date_of_birth),
                    is_anonymous: false,
                    password_hash: hash(&password)?,
                    role_id: PARTICIPANT_ROLE_ID,
                };
                match UserRepo::create(&self.pool, &input).await {
                    Ok(user) => user,
                    Err(e) if is_unique_violation(&e, USERNAME_CONSTRAINT) => {
                        return Err(AppError::Core(CoreError::Conflict(
                            "An account with this email already exists. Log in to continue."
                                .into(),
                        )));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            NewIdentity::Anonymous {
                date_of_birth,
                password,
            } => {
                let secret = password.unwrap_or_else(generate_secret);
                self.create_code_identity(project_id, date_of_birth, hash(&secret)?)
                    .await?
            }
        };

        tracing::info!(
            user_id = user.id,
            project_id,
            anonymous = user.is_anonymous,
            "Participant identity created"
        );

        let session = issue_session(&self.pool, &self.config.jwt, &user, ROLE_PARTICIPANT).await?;
        Ok(ResolvedParticipant {
            user,
            role: ROLE_PARTICIPANT.to_string(),
            session: Some(session),
        })
    }

    /// Insert an anonymous identity, drawing a new participant code whenever
    /// the previous one is taken.
    async fn create_code_identity(
        &self,
        project_id: DbId,
        date_of_birth: Option<String>,
        password_hash: String,
    ) -> AppResult<User> {
        let codes = std::iter::repeat_with(|| generate_participant_code(project_id, Utc::now()));
        self.create_code_identity_with(codes, project_id, date_of_birth, password_hash)
            .await
    }

    /// Insert an anonymous identity under the first free code from `codes`.
    ///
    /// At most `participant_code_attempts` codes are tried. When every one
    /// of them is taken the call fails with a conflict.
    pub async fn create_code_identity_with<I>(
        &self,
        codes: I,
        project_id: DbId,
        date_of_birth: Option<String>,
        password_hash: String,
    ) -> AppResult<User>
    where
        I: IntoIterator<Item = String>,
    {
        let attempts = self.config.participant_code_attempts;
        for (attempt, code) in (1..=attempts).zip(codes) {
            let input = CreateUser {
                username: code,
                date_of_birth: date_of_birth.clone(),
                is_anonymous: true,
                password_hash: password_hash.clone(),
                role_id: PARTICIPANT_ROLE_ID,
                ..Default::default()
            };
            match UserRepo::create(&self.pool, &input).await {
                Ok(user) => return Ok(user),
                Err(e) if is_unique_violation(&e, USERNAME_CONSTRAINT) => {
                    tracing::warn!(
                        project_id,
                        attempt,
                        code = %input.username,
                        "Participant code collision"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(AppError::Core(CoreError::Conflict(format!(
            "Could not allocate a participant code after {attempts} attempts"
        ))))
    }
}

fn hash(password: &str) -> AppResult<String> {
    hash_password(password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))
}
