//! Fixtures shared by the repository integration tests.

#![allow(dead_code)]

use cohort_core::block_content::{BlockContent, TextContent};
use cohort_core::roles::PARTICIPANT_ROLE_ID;
use cohort_core::status::{ModuleStatus, ProjectStatus};
use cohort_core::types::DbId;
use cohort_db::models::block::CreateBlock;
use cohort_db::models::flow::{LinkBlock, LinkModule};
use cohort_db::models::module::CreateModule;
use cohort_db::models::project::CreateProject;
use cohort_db::models::user::CreateUser;
use cohort_db::repositories::{BlockRepo, FlowRepo, ModuleRepo, ProjectRepo, UserRepo};
use sqlx::PgPool;

pub fn new_project(name: &str, max_participants: i32) -> CreateProject {
    CreateProject {
        name: name.to_string(),
        description: None,
        status: Some(ProjectStatus::Active),
        signup_mode: None,
        short_code: None,
        max_participants: Some(max_participants),
        min_age_years: None,
        visibility_mode: None,
        connect_participant_to_consent: None,
        completion_message: None,
    }
}

pub async fn create_project(pool: &PgPool, max_participants: i32) -> DbId {
    ProjectRepo::create(pool, &new_project("Sleep study", max_participants))
        .await
        .unwrap()
        .id
}

pub async fn create_participant(pool: &PgPool, username: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: Some(username.to_string()),
            password_hash: "not-a-real-hash".to_string(),
            role_id: PARTICIPANT_ROLE_ID,
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn create_module(pool: &PgPool, name: &str, status: ModuleStatus) -> DbId {
    ModuleRepo::create(
        pool,
        &CreateModule {
            name: name.to_string(),
            description: None,
            status: Some(status),
        },
    )
    .await
    .unwrap()
    .id
}

pub async fn create_text_block(pool: &PgPool, name: &str) -> DbId {
    BlockRepo::create(
        pool,
        &CreateBlock {
            name: name.to_string(),
            content: BlockContent::Text(TextContent {
                body: format!("{name} body"),
            }),
        },
    )
    .await
    .unwrap()
    .id
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
