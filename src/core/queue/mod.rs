//! Shared work queue for concurrent worker loops

use crate::core::types::RawRecord;
use parking_lot::Mutex;

/// A record handed to a worker, tagged with its 1-based sheet ordinal
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub ordinal: usize,
    pub record: RawRecord,
}

#[derive(Debug)]
struct QueueState {
    cursor: usize,
    completed: usize,
}

/// Single-cursor dispenser shared by every worker loop.
///
/// `next` hands out each record exactly once, in sheet order. The cursor
/// advances under a plain mutex and the critical section never suspends,
/// so no worker can observe a half-advanced queue.
///
/// Completion is tracked separately from hand-out: `mark_done` may lag
/// `next` while records are in flight, and `progress` reports only
/// records that were fully persisted.
#[derive(Debug)]
pub struct WorkQueue {
    records: Vec<RawRecord>,
    base_ordinal: usize,
    state: Mutex<QueueState>,
}

impl WorkQueue {
    /// Queue over a full backlog, ordinals starting at 1
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self::with_base_ordinal(records, 1)
    }

    /// Queue over a backlog slice whose first record sits at
    /// `base_ordinal` in the original sheet
    pub fn with_base_ordinal(records: Vec<RawRecord>, base_ordinal: usize) -> Self {
        Self {
            records,
            base_ordinal,
            state: Mutex::new(QueueState {
                cursor: 0,
                completed: 0,
            }),
        }
    }

    /// Hand out the next unprocessed record, or `None` once drained.
    ///
    /// A drained queue stays drained; repeated calls keep returning
    /// `None`.
    pub fn next(&self) -> Option<WorkItem> {
        let mut state = self.state.lock();
        let index = state.cursor;
        let record = self.records.get(index)?;
        state.cursor += 1;
        Some(WorkItem {
            ordinal: self.base_ordinal + index,
            record: record.clone(),
        })
    }

    /// Record one fully persisted record
    pub fn mark_done(&self) {
        self.state.lock().completed += 1;
    }

    /// Records not yet handed out
    pub fn remaining(&self) -> usize {
        self.records.len() - self.state.lock().cursor
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `(completed, total)` pair; counts completions, not hand-outs
    pub fn progress(&self) -> (usize, usize) {
        (self.state.lock().completed, self.records.len())
    }
}
