//! # Singular Threads
//!
//! A thread (or session) is one caller's start/stop lifecycle over a subset
//! of the registered units. Its start order is frozen when it starts and
//! replayed in reverse when it stops, so overlapping threads can share units
//! through reference counting.
pub mod error;
pub mod manager;

use std::collections::BTreeMap;

pub use error::ThreadError;
pub(crate) use manager::ThreadManager;

use crate::kernel::constants::FIRST_THREAD_ID;
use crate::scope::Scope;

/// Thread identifier
pub type ThreadId = u64;

/// A started thread, as returned to the caller
#[derive(Debug, Clone)]
pub struct Thread {
    id: ThreadId,
    required: Vec<String>,
    order: Vec<String>,
    scope: Scope,
}

impl Thread {
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Units the caller asked for
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Units this thread started or shares, in start order
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Instances of the required units
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn into_scope(self) -> Scope {
        self.scope
    }
}

/// Bookkeeping kept for a running thread
#[derive(Debug, Clone)]
pub(crate) struct ThreadRecord {
    pub(crate) id: ThreadId,
    pub(crate) required: Vec<String>,
    pub(crate) order: Vec<String>,
}

/// Running threads by id
#[derive(Debug)]
pub(crate) struct ThreadTable {
    threads: BTreeMap<ThreadId, ThreadRecord>,
    next_id: ThreadId,
}

impl Default for ThreadTable {
    fn default() -> Self {
        Self {
            threads: BTreeMap::new(),
            next_id: FIRST_THREAD_ID,
        }
    }
}

impl ThreadTable {
    pub(crate) fn contains(&self, id: ThreadId) -> bool {
        self.threads.contains_key(&id)
    }

    /// Hand out the next id that is not in use
    pub(crate) fn allocate_id(&mut self) -> ThreadId {
        while self.threads.contains_key(&self.next_id) {
            self.next_id += 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn insert(&mut self, record: ThreadRecord) {
        self.threads.insert(record.id, record);
    }

    pub(crate) fn remove(&mut self, id: ThreadId) -> Option<ThreadRecord> {
        self.threads.remove(&id)
    }

    pub(crate) fn ids(&self) -> Vec<ThreadId> {
        self.threads.keys().copied().collect()
    }

    pub(crate) fn get(&self, id: ThreadId) -> Option<&ThreadRecord> {
        self.threads.get(&id)
    }
}
