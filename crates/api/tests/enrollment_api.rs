//! HTTP-level tests for the consent and enrollment flow.

mod common;

use axum::http::StatusCode;
use cohort_core::status::{ProjectStatus, SignupMode, VisibilityMode};
use cohort_db::repositories::{ProjectUserRepo, UserRepo};
use common::{
    body_json, create_project, create_user, date_of_birth_years_ago, full_identity, get,
    login_token, post_json, post_json_auth, project_input, put_json_auth, PARTICIPANT_ROLE_ID,
};
use serde_json::json;
use sqlx::PgPool;

fn consent_uri(project_id: i64) -> String {
    format!("/api/v1/projects/{project_id}/consent")
}

// ---------------------------------------------------------------------------
// Reading the consent form
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_consent_form_is_public(pool: PgPool) {
    let mut input = project_input("Sleep study");
    input.signup_mode = Some(SignupMode::WithCode);
    input.short_code = Some("ABC123".into());
    let project_id = create_project(&pool, input).await;

    let response = get(common::build_test_app(pool), &consent_uri(project_id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["project_name"], "Sleep study");
    assert_eq!(json["data"]["requires_code"], true);
    assert_eq!(json["data"]["signup_mode"], "with_code");
    assert!(json["data"]["content"].as_str().unwrap().contains("agree"));
    // The code itself is never shown to participants.
    assert!(json["data"].get("short_code").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_inactive_project_hides_consent(pool: PgPool) {
    let mut input = project_input("Draft study");
    input.status = Some(ProjectStatus::Pending);
    let project_id = create_project(&pool, input).await;

    let response = get(common::build_test_app(pool.clone()), &consent_uri(project_id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json!({
        "decision": "accepted",
        "identity": full_identity("early@test.com", &date_of_birth_years_ago(30)),
    });
    let response =
        post_json(common::build_test_app(pool.clone()), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(UserRepo::find_by_username(&pool, "early@test.com").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Enrollment gate
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_capacity_and_idempotent_reconsent(pool: PgPool) {
    let mut input = project_input("Capped study");
    input.signup_mode = Some(SignupMode::WithCode);
    input.short_code = Some("ABC123".into());
    input.max_participants = Some(1);
    input.min_age_years = Some(18);
    let project_id = create_project(&pool, input).await;
    let adult = date_of_birth_years_ago(20);

    // A enrolls without an account.
    let body = json!({
        "decision": "accepted",
        "code": "ABC123",
        "identity": full_identity("a@test.com", &adult),
    });
    let response =
        post_json(common::build_test_app(pool.clone()), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["linked"], true);
    assert_eq!(json["data"]["participant_count"], 1);
    let token_a = json["data"]["session"]["access_token"].as_str().unwrap().to_string();
    let a_id = json["data"]["participant_id"].as_i64().unwrap();
    assert_eq!(json["data"]["response"]["user_id"], a_id);

    // B is refused: the single slot is taken. No account is created for B.
    let body = json!({
        "decision": "accepted",
        "code": "ABC123",
        "identity": full_identity("b@test.com", &adult),
    });
    let response =
        post_json(common::build_test_app(pool.clone()), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "CAPACITY_REACHED");
    assert!(UserRepo::find_by_username(&pool, "b@test.com").await.unwrap().is_none());

    // A consents again while logged in: accepted, still one participant.
    let body = json!({ "decision": "accepted", "code": "ABC123" });
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &consent_uri(project_id),
        body,
        &token_a,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["participant_id"], a_id);
    assert_eq!(json["data"]["participant_count"], 1);
    assert!(json["data"]["session"].is_null());
    assert_eq!(ProjectUserRepo::count_for_project(&pool, project_id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_linked_participant_reconsents_after_signup_closes(pool: PgPool) {
    let mut input = project_input("Closing study");
    input.signup_mode = Some(SignupMode::WithCode);
    input.short_code = Some("ABC123".into());
    input.max_participants = Some(1);
    let project_id = create_project(&pool, input).await;

    let body = json!({
        "decision": "accepted",
        "code": "ABC123",
        "identity": full_identity("a@test.com", &date_of_birth_years_ago(25)),
    });
    let response = post_json(
        common::build_test_app(pool.clone()),
        &consent_uri(project_id),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let token_a = json["data"]["session"]["access_token"].as_str().unwrap().to_string();
    let a_id = json["data"]["participant_id"].as_i64().unwrap();

    let researcher = common::researcher_token(&pool).await;
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/admin/projects/{project_id}"),
        json!({ "signup_mode": "closed" }),
        &researcher,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Signup is closed and no code is sent, yet the linked participant is
    // accepted again.
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &consent_uri(project_id),
        json!({ "decision": "accepted" }),
        &token_a,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["participant_id"], a_id);
    assert_eq!(json["data"]["linked"], true);
    assert_eq!(json["data"]["participant_count"], 1);

    // A newcomer is still refused.
    let body = json!({
        "decision": "accepted",
        "identity": full_identity("b@test.com", &date_of_birth_years_ago(25)),
    });
    let response = post_json(common::build_test_app(pool), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "SIGNUP_CLOSED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_wrong_or_missing_code_is_refused(pool: PgPool) {
    let mut input = project_input("Coded study");
    input.signup_mode = Some(SignupMode::WithCode);
    input.short_code = Some("ABC123".into());
    let project_id = create_project(&pool, input).await;
    let adult = date_of_birth_years_ago(30);

    for code in [json!("abc123"), json!(null)] {
        let body = json!({
            "decision": "accepted",
            "code": code,
            "identity": full_identity("c@test.com", &adult),
        });
        let response =
            post_json(common::build_test_app(pool.clone()), &consent_uri(project_id), body).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["code"], "CODE_MISMATCH");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_minimum_age_is_enforced(pool: PgPool) {
    let mut input = project_input("Adults only");
    input.min_age_years = Some(18);
    let project_id = create_project(&pool, input).await;

    let body = json!({
        "decision": "accepted",
        "identity": full_identity("young@test.com", &date_of_birth_years_ago(16)),
    });
    let response =
        post_json(common::build_test_app(pool.clone()), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "AGE_NOT_MET");
    assert!(UserRepo::find_by_username(&pool, "young@test.com").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_closed_signup_is_refused(pool: PgPool) {
    let mut input = project_input("Closed study");
    input.signup_mode = Some(SignupMode::Closed);
    let project_id = create_project(&pool, input).await;

    let body = json!({
        "decision": "accepted",
        "identity": full_identity("d@test.com", &date_of_birth_years_ago(30)),
    });
    let response = post_json(common::build_test_app(pool), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "SIGNUP_CLOSED");
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_existing_email_requires_login(pool: PgPool) {
    create_user(&pool, "taken@test.com", PARTICIPANT_ROLE_ID).await;
    let project_id = create_project(&pool, project_input("Open study")).await;

    let body = json!({
        "decision": "accepted",
        "identity": full_identity("Taken@Test.com", &date_of_birth_years_ago(30)),
    });
    let response = post_json(common::build_test_app(pool), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_identity_fields_are_listed(pool: PgPool) {
    let project_id = create_project(&pool, project_input("Open study")).await;

    let body = json!({
        "decision": "accepted",
        "identity": { "email": "partial@test.com" },
    });
    let response = post_json(common::build_test_app(pool), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("first_name"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_code_project_mints_anonymous_identity_for_full_account(pool: PgPool) {
    let caller = create_user(&pool, "full@test.com", PARTICIPANT_ROLE_ID).await;
    let mut input = project_input("Anonymous study");
    input.visibility_mode = Some(VisibilityMode::Code);
    let project_id = create_project(&pool, input).await;
    let token = login_token(common::build_test_app(pool.clone()), "full@test.com").await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &consent_uri(project_id),
        json!({ "decision": "accepted" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let participant_id = json["data"]["participant_id"].as_i64().unwrap();
    assert_ne!(participant_id, caller.id);
    assert_eq!(json["data"]["session"]["user"]["is_anonymous"], true);

    let minted = UserRepo::find_by_id(&pool, participant_id).await.unwrap().unwrap();
    assert!(minted.is_anonymous);
    assert!(minted.email.is_none());
    assert!(minted.username.starts_with(&project_id.to_string()));
    assert!(minted.username.chars().all(|c| c.is_ascii_digit()));
    // The caller's own DOB carried over for age checks.
    assert_eq!(minted.date_of_birth, caller.date_of_birth);

    assert!(ProjectUserRepo::is_linked(&pool, project_id, participant_id).await.unwrap());
    assert!(!ProjectUserRepo::is_linked(&pool, project_id, caller.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_anonymous_caller_is_reused_in_code_project(pool: PgPool) {
    let mut input = project_input("Anonymous study");
    input.visibility_mode = Some(VisibilityMode::Code);
    let project_id = create_project(&pool, input).await;

    let body = json!({
        "decision": "accepted",
        "identity": { "date_of_birth": date_of_birth_years_ago(30) },
    });
    let response = post_json(
        common::build_test_app(pool.clone()),
        &consent_uri(project_id),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let code_id = json["data"]["participant_id"].as_i64().unwrap();
    let token = json["data"]["session"]["access_token"].as_str().unwrap().to_string();

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &consent_uri(project_id),
        json!({ "decision": "accepted" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["participant_id"], code_id);
    assert!(json["data"]["session"].is_null());
    assert_eq!(json["data"]["participant_count"], 1);

    let anonymous: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_anonymous = true")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(anonymous, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_code_project_drops_personal_fields(pool: PgPool) {
    let mut input = project_input("Anonymous study");
    input.visibility_mode = Some(VisibilityMode::Code);
    let project_id = create_project(&pool, input).await;

    let body = json!({
        "decision": "accepted",
        "identity": full_identity("named@test.com", &date_of_birth_years_ago(30)),
    });
    let response =
        post_json(common::build_test_app(pool.clone()), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let participant_id = json["data"]["participant_id"].as_i64().unwrap();
    let user = UserRepo::find_by_id(&pool, participant_id).await.unwrap().unwrap();
    assert!(user.is_anonymous);
    assert!(user.email.is_none());
    assert!(user.first_name.is_none());
    assert!(UserRepo::find_by_username(&pool, "named@test.com").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Response ledger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unconnected_consent_is_not_linked(pool: PgPool) {
    let mut input = project_input("Survey only");
    input.connect_participant_to_consent = Some(false);
    let project_id = create_project(&pool, input).await;

    let body = json!({
        "decision": "accepted",
        "identity": full_identity("loose@test.com", &date_of_birth_years_ago(30)),
    });
    let response =
        post_json(common::build_test_app(pool.clone()), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["response"]["user_id"], 0);
    assert_eq!(json["data"]["linked"], false);
    assert_eq!(json["data"]["participant_count"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_declined_consent_is_recorded_without_link(pool: PgPool) {
    let project_id = create_project(&pool, project_input("Open study")).await;

    let body = json!({
        "decision": "declined",
        "participant_comment": "Not this time",
        "identity": full_identity("no@test.com", &date_of_birth_years_ago(30)),
    });
    let response =
        post_json(common::build_test_app(pool.clone()), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["response"]["decision"], "declined");
    assert_eq!(json["data"]["linked"], false);
    assert_eq!(ProjectUserRepo::count_for_project(&pool, project_id).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_consent_for_other_needs_their_name(pool: PgPool) {
    let project_id = create_project(&pool, project_input("Family study")).await;
    let identity = full_identity("parent@test.com", &date_of_birth_years_ago(40));

    let body = json!({ "decision": "accepted_for_other", "identity": identity });
    let response =
        post_json(common::build_test_app(pool.clone()), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json!({
        "decision": "accepted_for_other",
        "first_name": "Kid",
        "last_name": "Participant",
        "identity": identity,
    });
    let response = post_json(common::build_test_app(pool), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["response"]["first_name"], "Kid");
}

// ---------------------------------------------------------------------------
// Consent form lock
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_consent_form_locks_once_participants_exist(pool: PgPool) {
    let researcher = common::researcher_token(&pool).await;
    let admin = common::admin_token(&pool).await;
    let project_id = create_project(&pool, project_input("Locked study")).await;
    let uri = format!("/api/v1/admin/projects/{project_id}/consent-form");
    let form = json!({ "content": "Revised consent text." });

    let response =
        put_json_auth(common::build_test_app(pool.clone()), &uri, form.clone(), &researcher).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json!({
        "decision": "accepted",
        "identity": full_identity("first@test.com", &date_of_birth_years_ago(30)),
    });
    let response =
        post_json(common::build_test_app(pool.clone()), &consent_uri(project_id), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response =
        put_json_auth(common::build_test_app(pool.clone()), &uri, form.clone(), &researcher).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "PARTICIPANTS_NOT_ZERO");

    // Only administrators may override the lock.
    let override_uri = format!("{uri}?override=true");
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &override_uri,
        form.clone(),
        &researcher,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(common::build_test_app(pool), &override_uri, form, &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["content"], "Revised consent text.");
}
