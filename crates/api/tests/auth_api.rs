//! HTTP-level integration tests for login, token refresh and logout.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, get_auth, post_json, post_json_auth, ADMIN_ROLE_ID,
    PARTICIPANT_ROLE_ID, TEST_PASSWORD,
};
use sqlx::PgPool;

async fn login(pool: &PgPool, username: &str, password: &str) -> axum::response::Response {
    let body = serde_json::json!({ "username": username, "password": password });
    post_json(common::build_test_app(pool.clone()), "/api/v1/auth/login", body).await
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let user = create_user(&pool, "loginuser", ADMIN_ROLE_ID).await;

    let response = login(&pool, "loginuser", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert!(data["access_token"].is_string());
    assert!(data["refresh_token"].is_string());
    assert!(data["expires_in"].is_number());
    assert_eq!(data["user"]["id"], user.id);
    assert_eq!(data["user"]["username"], "loginuser");
    assert_eq!(data["user"]["role"], "admin");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_is_case_insensitive_on_username(pool: PgPool) {
    create_user(&pool, "casey@test.com", PARTICIPANT_ROLE_ID).await;

    let response = login(&pool, "  Casey@Test.com ", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    create_user(&pool, "wrongpw", PARTICIPANT_ROLE_ID).await;

    let response = login(&pool, "wrongpw", "incorrect_password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_nonexistent_user(pool: PgPool) {
    let response = login(&pool, "ghost", "whatever").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_account_locks_after_repeated_failures(pool: PgPool) {
    create_user(&pool, "lockme", PARTICIPANT_ROLE_ID).await;

    for _ in 0..5 {
        let response = login(&pool, "lockme", "bad_password").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while locked.
    let response = login(&pool, "lockme", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Refresh and logout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_token_refresh_rotates(pool: PgPool) {
    create_user(&pool, "refresher", PARTICIPANT_ROLE_ID).await;
    let json = body_json(login(&pool, "refresher", TEST_PASSWORD).await).await;
    let refresh_token = json["data"]["refresh_token"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/refresh",
        body.clone(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert_ne!(rotated["data"]["refresh_token"].as_str().unwrap(), refresh_token);

    // The old refresh token was revoked by the rotation.
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_with_invalid_token(pool: PgPool) {
    let body = serde_json::json!({ "refresh_token": "not-a-real-token" });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout_revokes_refresh_tokens(pool: PgPool) {
    create_user(&pool, "leaver", PARTICIPANT_ROLE_ID).await;
    let json = body_json(login(&pool, "leaver", TEST_PASSWORD).await).await;
    let access = json["data"]["access_token"].as_str().unwrap().to_string();
    let refresh_token = json["data"]["refresh_token"].as_str().unwrap().to_string();

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/logout",
        serde_json::json!({}),
        &access,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_bearer_token_is_rejected(pool: PgPool) {
    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/admin/projects",
        "garbage.token.value",
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
