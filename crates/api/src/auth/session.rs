//! Session issuing shared by login, refresh and identity creation.

use chrono::Utc;
use cohort_db::models::session::CreateSession;
use cohort_db::models::user::{User, UserResponse};
use cohort_db::repositories::SessionRepo;
use serde::Serialize;
use sqlx::PgPool;

use super::jwt::{generate_access_token, generate_refresh_token, IdentitySnapshot, JwtConfig};
use crate::error::{AppError, AppResult};

/// Access and refresh token pair plus the identity they belong to.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Generate access + refresh tokens, persist a session row, and build the
/// response.
pub async fn issue_session(
    pool: &PgPool,
    jwt: &JwtConfig,
    user: &User,
    role: &str,
) -> AppResult<AuthResponse> {
    let snapshot = IdentitySnapshot {
        username: user.username.clone(),
        anonymous: user.is_anonymous,
    };
    let access_token = generate_access_token(user.id, role, &snapshot, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();

    let session_input = CreateSession {
        user_id: user.id,
        refresh_token_hash: refresh_hash,
        expires_at: Utc::now() + chrono::Duration::days(jwt.refresh_token_expiry_days),
        user_agent: None,
        ip_address: None,
    };
    SessionRepo::create(pool, &session_input).await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: jwt.access_token_expiry_mins * 60,
        user: UserResponse::new(user, role.to_string()),
    })
}
