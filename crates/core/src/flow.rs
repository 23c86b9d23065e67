//! Flow assembly: a project's modules and blocks in participant order, joined
//! with one participant's progress.

use std::collections::HashMap;

use serde::Serialize;

use crate::status::{BlockKind, BlockStatus, ModuleStatus};
use crate::types::{DbId, Timestamp};

/// One (module, block) pair linked into a project, with both sort keys.
#[derive(Debug, Clone)]
pub struct FlowEntry {
    pub module_id: DbId,
    pub module_name: String,
    pub module_status: ModuleStatus,
    pub module_order: i32,
    pub block_id: DbId,
    pub block_name: String,
    pub block_kind: BlockKind,
    pub block_order: i32,
}

/// A stored progress row for one block of the flow.
#[derive(Debug, Clone, Copy)]
pub struct RecordedStatus {
    pub module_id: DbId,
    pub block_id: DbId,
    pub status: BlockStatus,
    pub updated_at: Timestamp,
}

/// A flow element as shown to the participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowStep {
    pub module_id: DbId,
    pub module_name: String,
    pub block_id: DbId,
    pub block_name: String,
    pub block_kind: BlockKind,
    pub status: BlockStatus,
    pub updated_at: Timestamp,
}

/// Build the ordered flow.
///
/// `entries` are expected in link insertion order; that order breaks ties
/// between equal sort keys. Inactive modules are dropped. Blocks without a
/// recorded status are reported as `not_started` as of `now`. Nothing is
/// written back.
pub fn assemble(
    entries: Vec<FlowEntry>,
    recorded: &[RecordedStatus],
    now: Timestamp,
) -> Vec<FlowStep> {
    let by_block: HashMap<(DbId, DbId), &RecordedStatus> = recorded
        .iter()
        .map(|r| ((r.module_id, r.block_id), r))
        .collect();

    // Modules with equal sort order keep their blocks together, in the order
    // the modules were first linked.
    let mut first_seen: HashMap<DbId, usize> = HashMap::new();
    for (idx, entry) in entries.iter().enumerate() {
        first_seen.entry(entry.module_id).or_insert(idx);
    }

    let mut active: Vec<FlowEntry> = entries
        .into_iter()
        .filter(|e| e.module_status == ModuleStatus::Active)
        .collect();
    active.sort_by_key(|e| (e.module_order, first_seen[&e.module_id], e.block_order));

    active
        .into_iter()
        .map(|e| {
            let (status, updated_at) = by_block
                .get(&(e.module_id, e.block_id))
                .map_or((BlockStatus::NotStarted, now), |r| (r.status, r.updated_at));
            FlowStep {
                module_id: e.module_id,
                module_name: e.module_name,
                block_id: e.block_id,
                block_name: e.block_name,
                block_kind: e.block_kind,
                status,
                updated_at,
            }
        })
        .collect()
}

/// The first step the participant has not completed yet.
pub fn next_step(steps: &[FlowStep]) -> Option<&FlowStep> {
    steps.iter().find(|s| s.status != BlockStatus::Completed)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn entry(module_id: DbId, module_order: i32, block_id: DbId, block_order: i32) -> FlowEntry {
        FlowEntry {
            module_id,
            module_name: format!("module {module_id}"),
            module_status: ModuleStatus::Active,
            module_order,
            block_id,
            block_name: format!("block {block_id}"),
            block_kind: BlockKind::Text,
            block_order,
        }
    }

    fn ids(steps: &[FlowStep]) -> Vec<(DbId, DbId)> {
        steps.iter().map(|s| (s.module_id, s.block_id)).collect()
    }

    #[test]
    fn orders_by_module_then_block() {
        let entries = vec![
            entry(2, 1, 20, 1),
            entry(2, 1, 21, 0),
            entry(1, 0, 10, 5),
            entry(1, 0, 11, 2),
        ];
        let steps = assemble(entries, &[], now());
        assert_eq!(ids(&steps), vec![(1, 11), (1, 10), (2, 21), (2, 20)]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let entries = vec![
            entry(1, 0, 10, 0),
            entry(2, 0, 20, 0),
            entry(1, 0, 11, 0),
            entry(2, 0, 21, 0),
        ];
        let steps = assemble(entries.clone(), &[], now());
        assert_eq!(ids(&steps), vec![(1, 10), (1, 11), (2, 20), (2, 21)]);
        // Repeatable for the same input.
        assert_eq!(ids(&assemble(entries, &[], now())), ids(&steps));
    }

    #[test]
    fn inactive_modules_are_hidden() {
        let mut hidden = entry(2, 1, 20, 0);
        hidden.module_status = ModuleStatus::Pending;
        let mut disabled = entry(3, 2, 30, 0);
        disabled.module_status = ModuleStatus::Disabled;
        let steps = assemble(vec![entry(1, 0, 10, 0), hidden, disabled], &[], now());
        assert_eq!(ids(&steps), vec![(1, 10)]);
    }

    #[test]
    fn missing_status_materializes_as_not_started_now() {
        let earlier = now() - chrono::Duration::days(2);
        let recorded = [RecordedStatus {
            module_id: 1,
            block_id: 10,
            status: BlockStatus::Completed,
            updated_at: earlier,
        }];
        let steps = assemble(vec![entry(1, 0, 10, 0), entry(1, 0, 11, 1)], &recorded, now());
        assert_eq!(steps[0].status, BlockStatus::Completed);
        assert_eq!(steps[0].updated_at, earlier);
        assert_eq!(steps[1].status, BlockStatus::NotStarted);
        assert_eq!(steps[1].updated_at, now());
        assert_eq!(next_step(&steps).map(|s| s.block_id), Some(11));
    }

    #[test]
    fn status_is_scoped_to_module() {
        // The same block linked into two modules tracks progress separately.
        let recorded = [RecordedStatus {
            module_id: 2,
            block_id: 10,
            status: BlockStatus::Started,
            updated_at: now(),
        }];
        let steps = assemble(vec![entry(1, 0, 10, 0), entry(2, 1, 10, 0)], &recorded, now());
        assert_eq!(steps[0].status, BlockStatus::NotStarted);
        assert_eq!(steps[1].status, BlockStatus::Started);
    }
}
