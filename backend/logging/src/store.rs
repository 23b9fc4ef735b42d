//! Bounded, newest-first buffer of audit entries.
//!
//! New entries go to the head; once the bound is exceeded the tail (oldest)
//! entry is evicted. Every mutation is one synchronous critical section with
//! no suspension point inside it.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uarwatch_core::{AuditResult, LogEntry};

/// Default bound on stored entries.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

pub struct EventStore {
    entries: RwLock<VecDeque<Arc<LogEntry>>>,
    max_entries: usize,
}

impl EventStore {
    /// Create a store holding at most `max_entries` entries (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(max_entries.min(1024))),
            max_entries,
        }
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Insert at the head, evicting the oldest entry when over the bound.
    pub fn append(&self, entry: Arc<LogEntry>) {
        let mut entries = self.write();
        entries.push_front(entry);
        while entries.len() > self.max_entries {
            entries.pop_back();
        }
    }

    /// Build an entry under the write lock and insert it at the head.
    ///
    /// Anything `build` stamps (time, ids) is ordered the same way as the
    /// insert, so concurrent writers cannot leave the head older than its
    /// successor.
    pub fn append_with<F>(&self, build: F) -> Arc<LogEntry>
    where
        F: FnOnce() -> LogEntry,
    {
        let mut entries = self.write();
        let entry = Arc::new(build());
        entries.push_front(entry.clone());
        while entries.len() > self.max_entries {
            entries.pop_back();
        }
        entry
    }

    /// Newest-first snapshot. Later appends are not reflected in it.
    pub fn all(&self) -> Vec<Arc<LogEntry>> {
        self.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn find_by_process_id(&self, process_id: &str) -> Option<Arc<LogEntry>> {
        self.read()
            .iter()
            .find(|e| e.process_id == process_id)
            .cloned()
    }

    /// Pretty JSON array of every entry, newest first.
    pub fn export(&self) -> AuditResult<String> {
        let snapshot = self.all();
        let refs: Vec<&LogEntry> = snapshot.iter().map(Arc::as_ref).collect();
        Ok(serde_json::to_string_pretty(&refs)?)
    }

    fn read(&self) -> RwLockReadGuard<'_, VecDeque<Arc<LogEntry>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<Arc<LogEntry>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
