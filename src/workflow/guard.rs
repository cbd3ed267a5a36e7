//! Per-block dedup/lock state.
//!
//! Prevents two things: concurrent workflows for the same block, and
//! re-triggering on a reference the block already completed with.

use dashmap::DashMap;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
struct GuardEntry {
    last_handled_url: Option<String>,
    locked: bool,
}

/// Process-wide ledger of block workflow state. Created at startup,
/// cleared entry-by-entry as workflows end, never persisted.
#[derive(Default)]
pub struct ProcessingLedger {
    entries: DashMap<Uuid, GuardEntry>,
}

impl ProcessingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic check-and-set: admits `candidate_url` for `block_uuid`
    /// unless the block is locked or the URL matches the last one
    /// handled. Admission locks the block in the same step - the entry
    /// lock is held across check and set, with no await point between.
    pub fn should_process(&self, block_uuid: Uuid, candidate_url: &str) -> bool {
        let mut entry = self.entries.entry(block_uuid).or_default();
        if entry.locked {
            return false;
        }
        if entry.last_handled_url.as_deref() == Some(candidate_url) {
            return false;
        }
        entry.locked = true;
        entry.last_handled_url = Some(candidate_url.to_string());
        true
    }

    /// Unlock the block. `Some(url)` records the workflow's final URL so
    /// an identical re-insertion is skipped; `None` clears the entry
    /// entirely, leaving the block eligible for the same reference again.
    pub fn release(&self, block_uuid: Uuid, final_url: Option<&str>) {
        match final_url {
            Some(url) => {
                self.entries.insert(
                    block_uuid,
                    GuardEntry {
                        last_handled_url: Some(url.to_string()),
                        locked: false,
                    },
                );
            }
            None => {
                self.entries.remove(&block_uuid);
            }
        }
    }

    /// Whether a workflow currently holds the block.
    pub fn is_locked(&self, block_uuid: Uuid) -> bool {
        self.entries
            .get(&block_uuid)
            .map(|entry| entry.locked)
            .unwrap_or(false)
    }

    pub fn last_handled_url(&self, block_uuid: Uuid) -> Option<String> {
        self.entries
            .get(&block_uuid)
            .and_then(|entry| entry.last_handled_url.clone())
    }
}
