//! Block progress for one participant: opening blocks, explicit status
//! writes, form submissions, resets and full removal.

use cohort_core::error::CoreError;
use cohort_core::flow::{next_step, FlowStep};
use cohort_core::form::{validate_submission, Answers};
use cohort_core::progress::{
    check_submission_target, parse_status_write, rollup, status_after_read, ProjectRollup,
    ResetScope,
};
use cohort_core::status::{BlockKind, BlockStatus};
use cohort_core::types::{DbId, Timestamp};
use cohort_db::models::block::BlockResponse;
use cohort_db::models::block_status::{BlockKey, BlockUserStatus};
use cohort_db::models::flow::FlowRow;
use cohort_db::models::form_submission::FormSubmission;
use cohort_db::models::project::Project;
use cohort_db::repositories::{
    BlockRepo, BlockStatusRepo, ConsentResponseRepo, FlowRepo, FormSubmissionRepo, NoteRepo,
    ProjectUserRepo,
};
use serde::Serialize;
use sqlx::PgPool;

use super::flow::FlowAssembler;
use crate::error::{AppError, AppResult};

/// A block as returned when a participant opens it.
#[derive(Debug, Serialize)]
pub struct OpenedBlock {
    pub module_id: DbId,
    pub block: BlockResponse,
    pub status: BlockStatus,
    pub updated_at: Timestamp,
    /// The caller's own earlier answers to a form block, newest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub submissions: Vec<FormSubmission>,
}

/// A participant's progress through a project.
#[derive(Debug, Serialize)]
pub struct ProgressReport {
    #[serde(flatten)]
    pub rollup: ProjectRollup,
    pub next: Option<FlowStep>,
    /// The project's completion message, once every block is completed.
    pub completion_message: Option<String>,
}

/// Status of one block after a write, with the resulting project progress.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub module_id: DbId,
    pub block_id: DbId,
    pub status: BlockStatus,
    pub updated_at: Timestamp,
    pub progress: ProgressReport,
}

#[derive(Debug, Serialize)]
pub struct SubmissionReport {
    pub submission_id: DbId,
    pub submitted_at: Timestamp,
    #[serde(flatten)]
    pub report: StatusReport,
}

/// Rows removed by a full participant removal.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct RemovalSummary {
    pub consent_responses: u64,
    pub block_statuses: u64,
    pub form_submissions: u64,
    pub notes: u64,
    pub unlinked: bool,
}

pub struct ProgressTracker {
    pool: PgPool,
}

impl ProgressTracker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a block. The first open moves it from `not_started` to `started`.
    pub async fn open_block(
        &self,
        project: &Project,
        user_id: DbId,
        module_id: DbId,
        block_id: DbId,
    ) -> AppResult<OpenedBlock> {
        self.active_step(project.id, module_id, block_id).await?;
        let block = BlockRepo::find_by_id(&self.pool, block_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Block",
                id: block_id,
            }))?;

        let key = BlockKey {
            user_id,
            project_id: project.id,
            module_id,
            block_id,
        };
        let mut row = BlockStatusRepo::find(&self.pool, &key).await?;
        let current = row.as_ref().map(BlockUserStatus::status).transpose()?;

        if status_after_read(current).is_some() {
            // A concurrent write may have moved past `not_started`; re-read then.
            row = match BlockStatusRepo::mark_started(&self.pool, &key).await? {
                Some(started) => {
                    tracing::debug!(
                        user_id,
                        project_id = project.id,
                        module_id,
                        block_id,
                        "Block started"
                    );
                    Some(started)
                }
                None => BlockStatusRepo::find(&self.pool, &key).await?,
            };
        }
        let row = row.ok_or_else(|| {
            AppError::InternalError(format!("Status row missing after opening block {block_id}"))
        })?;

        let submissions = if block.kind()? == BlockKind::Form {
            FormSubmissionRepo::list_for_block(&self.pool, &key).await?
        } else {
            Vec::new()
        };

        Ok(OpenedBlock {
            module_id,
            block: BlockResponse::new(&block)?,
            status: row.status()?,
            updated_at: row.updated_at,
            submissions,
        })
    }

    /// Overwrite a block's status. Form blocks are refused.
    pub async fn write_status(
        &self,
        project: &Project,
        user_id: DbId,
        module_id: DbId,
        block_id: DbId,
        raw_status: &str,
    ) -> AppResult<StatusReport> {
        let step = self.active_step(project.id, module_id, block_id).await?;
        let status = parse_status_write(step.block_kind()?, raw_status)?;

        let key = BlockKey {
            user_id,
            project_id: project.id,
            module_id,
            block_id,
        };
        let row = BlockStatusRepo::upsert(&self.pool, &key, status).await?;
        tracing::info!(
            user_id,
            project_id = project.id,
            module_id,
            block_id,
            status = status.name(),
            "Block status written"
        );

        self.status_report(project, user_id, &row).await
    }

    /// Submit a full set of answers to a form block, completing it.
    pub async fn submit_form(
        &self,
        project: &Project,
        user_id: DbId,
        module_id: DbId,
        block_id: DbId,
        answers: Answers,
    ) -> AppResult<SubmissionReport> {
        let step = self.active_step(project.id, module_id, block_id).await?;
        check_submission_target(step.block_kind()?)?;

        let block = BlockRepo::find_by_id(&self.pool, block_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Block",
                id: block_id,
            }))?;
        let content = block.typed_content()?;
        let form = content.as_form().ok_or_else(|| {
            AppError::InternalError(format!("Form block {block_id} has no form content"))
        })?;
        validate_submission(form, &answers)?;

        let key = BlockKey {
            user_id,
            project_id: project.id,
            module_id,
            block_id,
        };
        let (submission, row) = FormSubmissionRepo::submit(&self.pool, &key, &answers).await?;
        tracing::info!(
            user_id,
            project_id = project.id,
            module_id,
            block_id,
            submission_id = submission.id,
            "Form submitted"
        );

        let report = self.status_report(project, user_id, &row).await?;
        Ok(SubmissionReport {
            submission_id: submission.id,
            submitted_at: submission.created_at,
            report,
        })
    }

    /// Delete status rows for one block, one module or the whole project.
    /// `0` path ids mean "not given"; the most specific given id wins.
    pub async fn reset(
        &self,
        project: &Project,
        user_id: DbId,
        module_id: DbId,
        block_id: DbId,
    ) -> AppResult<u64> {
        let scope = ResetScope::from_path(module_id, block_id)?;
        match scope {
            ResetScope::Block {
                module_id,
                block_id,
            } => {
                self.active_step(project.id, module_id, block_id).await?;
            }
            ResetScope::Module { module_id } => {
                if !FlowRepo::has_active_module(&self.pool, project.id, module_id).await? {
                    return Err(AppError::Core(CoreError::NotFound {
                        entity: "Module",
                        id: module_id,
                    }));
                }
            }
            ResetScope::Project => {}
        }

        let deleted = BlockStatusRepo::delete_scope(&self.pool, project.id, user_id, scope).await?;
        tracing::info!(
            user_id,
            project_id = project.id,
            ?scope,
            deleted,
            "Progress reset"
        );
        Ok(deleted)
    }

    /// Remove everything a participant has in a project, link last.
    ///
    /// Each step is an idempotent delete, so re-running after a partial
    /// failure finishes the job.
    pub async fn remove_participant(
        &self,
        project_id: DbId,
        user_id: DbId,
    ) -> AppResult<RemovalSummary> {
        let summary = RemovalSummary {
            consent_responses: ConsentResponseRepo::delete_for_participant(
                &self.pool, project_id, user_id,
            )
            .await?,
            block_statuses: BlockStatusRepo::delete_scope(
                &self.pool,
                project_id,
                user_id,
                ResetScope::Project,
            )
            .await?,
            form_submissions: FormSubmissionRepo::delete_for_participant(
                &self.pool, project_id, user_id,
            )
            .await?,
            notes: NoteRepo::delete_for_participant(&self.pool, project_id, user_id).await?,
            unlinked: ProjectUserRepo::unlink(&self.pool, project_id, user_id).await?,
        };
        tracing::info!(project_id, user_id, ?summary, "Participant removed from project");
        Ok(summary)
    }

    /// Roll the participant's flow up into project progress.
    pub async fn progress(&self, project: &Project, user_id: DbId) -> AppResult<ProgressReport> {
        let steps = FlowAssembler::new(self.pool.clone())
            .flow(project.id, user_id)
            .await?;
        let rollup = rollup(&steps);
        let completion_message = if rollup.complete {
            project.completion_message.clone()
        } else {
            None
        };
        Ok(ProgressReport {
            next: next_step(&steps).cloned(),
            rollup,
            completion_message,
        })
    }

    async fn status_report(
        &self,
        project: &Project,
        user_id: DbId,
        row: &BlockUserStatus,
    ) -> AppResult<StatusReport> {
        let progress = self.progress(project, user_id).await?;
        if progress.rollup.complete {
            tracing::info!(user_id, project_id = project.id, "Participant completed project");
        }
        Ok(StatusReport {
            module_id: row.module_id,
            block_id: row.block_id,
            status: row.status()?,
            updated_at: row.updated_at,
            progress,
        })
    }

    /// The (module, block) pair, if it is part of the project's active flow.
    async fn active_step(
        &self,
        project_id: DbId,
        module_id: DbId,
        block_id: DbId,
    ) -> AppResult<FlowRow> {
        FlowRepo::find_active_step(&self.pool, project_id, module_id, block_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Block",
                id: block_id,
            }))
    }
}
