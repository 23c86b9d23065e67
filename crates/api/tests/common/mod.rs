//! Shared setup for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{Datelike, Utc};
use cohort_api::auth::jwt::JwtConfig;
use cohort_api::auth::password::hash_password;
use cohort_api::config::ServerConfig;
use cohort_api::router::build_app_router;
use cohort_api::state::AppState;
use cohort_core::block_content::{BlockContent, TextContent};
use cohort_core::form::FormDefinition;
use cohort_core::status::{ModuleStatus, ProjectStatus};
use cohort_core::types::DbId;
use cohort_db::models::block::CreateBlock;
use cohort_db::models::consent::UpsertConsentForm;
use cohort_db::models::flow::{LinkBlock, LinkModule};
use cohort_db::models::module::CreateModule;
use cohort_db::models::project::CreateProject;
use cohort_db::models::user::{CreateUser, User};
use cohort_db::repositories::{
    BlockRepo, ConsentFormRepo, FlowRepo, ModuleRepo, ProjectRepo, UserRepo,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

pub const ADMIN_ROLE_ID: DbId = 1;
pub const RESEARCHER_ROLE_ID: DbId = 2;
pub const PARTICIPANT_ROLE_ID: DbId = 3;

pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        min_password_length: 8,
        participant_code_attempts: 3,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
    }
}

/// Build the production router over the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a user with [`TEST_PASSWORD`] directly in the database.
pub async fn create_user(pool: &PgPool, username: &str, role_id: DbId) -> User {
    let input = CreateUser {
        username: username.to_string(),
        email: Some(format!("{username}@test.com")),
        date_of_birth: Some(date_of_birth_years_ago(30)),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role_id,
        ..Default::default()
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Log in through the API and return the access token.
pub async fn login_token(app: Router, username: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let json = body_json(response).await;
    json["data"]["access_token"].as_str().unwrap().to_string()
}

/// Create a researcher and return their access token.
pub async fn researcher_token(pool: &PgPool) -> String {
    create_user(pool, "researcher", RESEARCHER_ROLE_ID).await;
    login_token(build_test_app(pool.clone()), "researcher").await
}

/// Create an admin and return their access token.
pub async fn admin_token(pool: &PgPool) -> String {
    create_user(pool, "admin", ADMIN_ROLE_ID).await;
    login_token(build_test_app(pool.clone()), "admin").await
}

/// `YYYY-MM-DD` for a birthday `years` ago, a month in the past so the
/// anniversary has already passed this year.
pub fn date_of_birth_years_ago(years: i32) -> String {
    let today = Utc::now().date_naive() - chrono::Duration::days(31);
    let year = today.year() - years;
    let day = today.day().min(28);
    format!("{year:04}-{:02}-{day:02}", today.month())
}

/// An active, open project with defaults for everything else.
pub fn project_input(name: &str) -> CreateProject {
    CreateProject {
        name: name.to_string(),
        description: None,
        status: Some(ProjectStatus::Active),
        signup_mode: None,
        short_code: None,
        max_participants: None,
        min_age_years: None,
        visibility_mode: None,
        connect_participant_to_consent: None,
        completion_message: None,
    }
}

/// Create a project and give it a consent form.
pub async fn create_project(pool: &PgPool, input: CreateProject) -> DbId {
    let project = ProjectRepo::create(pool, &input).await.unwrap();
    ConsentFormRepo::upsert(
        pool,
        project.id,
        &UpsertConsentForm {
            content: "I agree to take part in this study.".to_string(),
            contact_info: Some("study@test.com".to_string()),
            institution: Some("Test University".to_string()),
        },
    )
    .await
    .unwrap();
    project.id
}

pub async fn create_module(pool: &PgPool, name: &str, status: ModuleStatus) -> DbId {
    let input = CreateModule {
        name: name.to_string(),
        description: None,
        status: Some(status),
    };
    ModuleRepo::create(pool, &input).await.unwrap().id
}

pub async fn create_text_block(pool: &PgPool, name: &str) -> DbId {
    let input = CreateBlock {
        name: name.to_string(),
        content: BlockContent::Text(TextContent {
            body: format!("{name} body"),
        }),
    };
    BlockRepo::create(pool, &input).await.unwrap().id
}

/// A form block with one required single-choice question `mood`.
pub async fn create_form_block(pool: &PgPool, name: &str) -> DbId {
    let form: FormDefinition = serde_json::from_value(serde_json::json!({
        "questions": [
            { "id": "mood", "label": "Mood", "kind": "single_choice",
              "required": true, "options": ["good", "bad"] },
            { "id": "notes", "label": "Notes", "kind": "text" }
        ]
    }))
    .unwrap();
    let input = CreateBlock {
        name: name.to_string(),
        content: BlockContent::Form(form),
    };
    BlockRepo::create(pool, &input).await.unwrap().id
}

pub async fn link_module(pool: &PgPool, project_id: DbId, module_id: DbId, sort_order: i32) {
    FlowRepo::link_module(pool, project_id, &LinkModule { module_id, sort_order })
        .await
        .unwrap();
}

pub async fn link_block(pool: &PgPool, module_id: DbId, block_id: DbId, sort_order: i32) {
    FlowRepo::link_block(pool, module_id, &LinkBlock { block_id, sort_order })
        .await
        .unwrap();
}

/// Full-mode identity payload for an unauthenticated consent submission.
pub fn full_identity(email: &str, date_of_birth: &str) -> Value {
    serde_json::json!({
        "first_name": "Test",
        "last_name": "Participant",
        "email": email,
        "password": TEST_PASSWORD,
        "date_of_birth": date_of_birth,
    })
}
