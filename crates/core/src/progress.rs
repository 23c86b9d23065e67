//! Block progress state machine and completion rollups.
//!
//! States move `not_started -> started -> completed`. The only implicit
//! transition is the first read of a block; everything else is an explicit
//! write, a form submission, or a reset that deletes rows.

use serde::Serialize;

use crate::error::CoreError;
use crate::flow::FlowStep;
use crate::status::{BlockKind, BlockStatus};
use crate::types::DbId;

/// Status to store after a participant opens a block, if any.
///
/// An absent row counts as `not_started`.
pub fn status_after_read(current: Option<BlockStatus>) -> Option<BlockStatus> {
    match current {
        None | Some(BlockStatus::NotStarted) => Some(BlockStatus::Started),
        Some(_) => None,
    }
}

/// Parse an explicit status write for a block of the given kind.
///
/// Form blocks are completed through their submission endpoint only.
pub fn parse_status_write(kind: BlockKind, raw: &str) -> Result<BlockStatus, CoreError> {
    if kind == BlockKind::Form {
        return Err(CoreError::WrongEndpoint(
            "Form blocks are completed by submitting the form".to_string(),
        ));
    }
    BlockStatus::from_name(raw).ok_or_else(|| {
        CoreError::Validation(format!(
            "Invalid status '{raw}'. Must be one of: {}",
            BlockStatus::accepted_names()
        ))
    })
}

/// Ensure a submission targets a form block.
pub fn check_submission_target(kind: BlockKind) -> Result<(), CoreError> {
    if kind == BlockKind::Form {
        Ok(())
    } else {
        Err(CoreError::WrongEndpoint(format!(
            "Only form blocks accept submissions, this block is '{kind}'"
        )))
    }
}

/// Which progress rows a reset deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    Block { module_id: DbId, block_id: DbId },
    Module { module_id: DbId },
    Project,
}

impl ResetScope {
    /// Select the scope from path ids, where `0` means "not given".
    ///
    /// The most specific non-zero id wins. A block is addressed within its
    /// module, so a block id without a module id is rejected.
    pub fn from_path(module_id: DbId, block_id: DbId) -> Result<Self, CoreError> {
        if module_id < 0 || block_id < 0 {
            return Err(CoreError::Validation(
                "Path ids must be zero or positive".to_string(),
            ));
        }
        match (module_id, block_id) {
            (0, 0) => Ok(ResetScope::Project),
            (0, _) => Err(CoreError::Validation(
                "A block reset needs its module id".to_string(),
            )),
            (module_id, 0) => Ok(ResetScope::Module { module_id }),
            (module_id, block_id) => Ok(ResetScope::Block {
                module_id,
                block_id,
            }),
        }
    }
}

/// Whether a set of block statuses counts as complete: at least one block,
/// and every block completed.
pub fn is_complete<I>(statuses: I) -> bool
where
    I: IntoIterator<Item = BlockStatus>,
{
    let mut any = false;
    for status in statuses {
        if status != BlockStatus::Completed {
            return false;
        }
        any = true;
    }
    any
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleRollup {
    pub module_id: DbId,
    pub total_blocks: usize,
    pub completed_blocks: usize,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRollup {
    pub total_blocks: usize,
    pub completed_blocks: usize,
    pub complete: bool,
    pub modules: Vec<ModuleRollup>,
}

/// Roll an assembled flow up into module and project completion.
pub fn rollup(steps: &[FlowStep]) -> ProjectRollup {
    let mut modules: Vec<ModuleRollup> = Vec::new();
    for step in steps {
        let done = step.status == BlockStatus::Completed;
        match modules.iter_mut().find(|m| m.module_id == step.module_id) {
            Some(module) => {
                module.total_blocks += 1;
                module.completed_blocks += usize::from(done);
            }
            None => modules.push(ModuleRollup {
                module_id: step.module_id,
                total_blocks: 1,
                completed_blocks: usize::from(done),
                complete: false,
            }),
        }
    }
    for module in &mut modules {
        module.complete = module.total_blocks > 0 && module.completed_blocks == module.total_blocks;
    }

    ProjectRollup {
        total_blocks: steps.len(),
        completed_blocks: steps
            .iter()
            .filter(|s| s.status == BlockStatus::Completed)
            .count(),
        complete: is_complete(steps.iter().map(|s| s.status)),
        modules,
    }
}
