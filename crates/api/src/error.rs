use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cohort_core::error::CoreError;
use serde_json::json;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Error returned by every handler.
///
/// Renders as `{"error": <message>, "code": <CODE>}`. Internal failures are
/// logged and replaced with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed request outside the domain rules (bad token, bad body).
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Status, stable code and client-facing message of an error.
struct Rendered {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl Rendered {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn internal(detail: &dyn std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", INTERNAL_MESSAGE)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let rendered = match &self {
            AppError::Core(core) => render_core(core),
            AppError::Database(err) => render_sqlx(err),
            AppError::BadRequest(msg) => Rendered::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::InternalError(msg) => Rendered::internal(msg),
        };

        let body = json!({ "error": rendered.message, "code": rendered.code });
        (rendered.status, axum::Json(body)).into_response()
    }
}

fn render_core(err: &CoreError) -> Rendered {
    match err {
        CoreError::NotFound { entity, id } => Rendered::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => {
            Rendered::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg)
        }
        CoreError::WrongEndpoint(msg) => {
            Rendered::new(StatusCode::BAD_REQUEST, "WRONG_ENDPOINT", msg)
        }
        // Each refusal keeps its own code so clients can tell them apart.
        CoreError::Denied(reason) => {
            Rendered::new(StatusCode::FORBIDDEN, reason.code(), reason.to_string())
        }
        CoreError::Conflict(msg) => Rendered::new(StatusCode::CONFLICT, "CONFLICT", msg),
        CoreError::Unauthorized(msg) => {
            Rendered::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
        }
        CoreError::Forbidden(msg) => Rendered::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg),
        CoreError::Internal(msg) => Rendered::internal(msg),
    }
}

/// Map sqlx failures onto client errors where the schema names the cause.
///
/// `RowNotFound` is a 404. Violations of `uq_*` constraints are conflicts.
/// Foreign key and `ck_*` check violations are validation errors. Anything
/// else is internal.
fn render_sqlx(err: &sqlx::Error) -> Rendered {
    let db_err = match err {
        sqlx::Error::RowNotFound => {
            return Rendered::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
        }
        sqlx::Error::Database(db_err) => db_err,
        other => return Rendered::internal(other),
    };

    let constraint = db_err.constraint().unwrap_or("unknown");
    match db_err.code().as_deref() {
        Some(UNIQUE_VIOLATION) if constraint.starts_with("uq_") => Rendered::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        ),
        Some(FOREIGN_KEY_VIOLATION) => Rendered::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Referenced record does not exist",
        ),
        Some(CHECK_VIOLATION) if constraint.starts_with("ck_") => Rendered::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            format!("Value violates check constraint: {constraint}"),
        ),
        _ => Rendered::internal(db_err),
    }
}

/// Whether a sqlx error is a unique violation on the named constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}
