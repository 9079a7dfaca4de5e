//! Local record of the projects this device has voted on.
//!
//! Advisory only: it drives the disabled state of vote buttons without a
//! round trip and is trivially reset by clearing client storage. The store's
//! `(project_id, voter_id)` uniqueness constraint is the real deduplication.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::storage::{ClientStorage, StorageError};
use crate::types::DbId;

/// Storage key holding the JSON array of voted project ids.
pub const VOTED_PROJECTS_KEY: &str = "gv_voted_projects";

pub struct LocalVoteLedger {
    storage: Arc<dyn ClientStorage>,
}

impl LocalVoteLedger {
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self { storage }
    }

    /// Whether this device has a recorded vote for `project_id`.
    ///
    /// Unreadable storage counts as "not voted"; the store still rejects
    /// duplicates.
    pub fn has_voted(&self, project_id: DbId) -> bool {
        match self.load() {
            Ok(ids) => ids.contains(&project_id),
            Err(e) => {
                tracing::warn!(error = %e, project_id, "Failed to read vote ledger");
                false
            }
        }
    }

    /// Add `project_id` to the ledger. Idempotent.
    pub fn record_vote(&self, project_id: DbId) {
        self.modify(project_id, |ids| ids.insert(project_id));
    }

    /// Remove `project_id` from the ledger, used when a vote is reverted.
    pub fn forget(&self, project_id: DbId) {
        self.modify(project_id, |ids| ids.remove(&project_id));
    }

    /// All project ids recorded on this device.
    pub fn voted(&self) -> BTreeSet<DbId> {
        self.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read vote ledger");
            BTreeSet::new()
        })
    }

    fn load(&self) -> Result<BTreeSet<DbId>, StorageError> {
        match self.storage.get(VOTED_PROJECTS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(BTreeSet::new()),
        }
    }

    fn modify(&self, project_id: DbId, apply: impl FnOnce(&mut BTreeSet<DbId>) -> bool) {
        let loaded = match self.load() {
            Err(StorageError::Corrupt(e)) => {
                tracing::warn!(error = %e, "Discarding corrupt vote ledger");
                Ok(BTreeSet::new())
            }
            other => other,
        };
        let result = loaded.and_then(|mut ids| {
            if apply(&mut ids) {
                self.storage
                    .set(VOTED_PROJECTS_KEY, &serde_json::to_string(&ids)?)?;
            }
            Ok(())
        });
        if let Err(e) = result {
            tracing::warn!(error = %e, project_id, "Failed to update vote ledger");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn recorded_vote_is_reported() {
        let ledger = LocalVoteLedger::new(Arc::new(MemoryStorage::new()));
        assert!(!ledger.has_voted(7));
        ledger.record_vote(7);
        assert!(ledger.has_voted(7));
        assert!(!ledger.has_voted(8));
    }

    #[test]
    fn record_vote_is_idempotent() {
        let ledger = LocalVoteLedger::new(Arc::new(MemoryStorage::new()));
        ledger.record_vote(3);
        ledger.record_vote(3);
        assert_eq!(ledger.voted().into_iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn vote_survives_reload_within_same_storage() {
        let storage = MemoryStorage::new();
        LocalVoteLedger::new(Arc::new(storage.clone())).record_vote(42);

        let reloaded = LocalVoteLedger::new(Arc::new(storage));
        assert!(reloaded.has_voted(42));
    }

    #[test]
    fn forget_removes_only_that_project() {
        let ledger = LocalVoteLedger::new(Arc::new(MemoryStorage::new()));
        ledger.record_vote(1);
        ledger.record_vote(2);
        ledger.forget(1);
        assert!(!ledger.has_voted(1));
        assert!(ledger.has_voted(2));
    }

    #[test]
    fn clearing_storage_resets_the_ledger() {
        let storage = MemoryStorage::new();
        let ledger = LocalVoteLedger::new(Arc::new(storage.clone()));
        ledger.record_vote(5);
        storage.clear();
        assert!(!ledger.has_voted(5));
    }

    #[test]
    fn corrupt_ledger_reads_as_empty() {
        let storage = MemoryStorage::new();
        storage.set(VOTED_PROJECTS_KEY, "{oops").unwrap();
        let ledger = LocalVoteLedger::new(Arc::new(storage));
        assert!(!ledger.has_voted(1));
        assert!(ledger.voted().is_empty());

        ledger.record_vote(1);
        assert!(ledger.has_voted(1));
    }
}
