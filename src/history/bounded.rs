//! Bounded History: fixed-capacity, newest-first record buffer.
//!
//! ```text
//!   push(r4), capacity 3
//!   before: [r3, r2, r1]
//!   after:  [r4, r3, r2]   (r1 evicted)
//! ```
//!
//! Each history carries its own lock, held for one push or one read.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::history::record::Record;

pub struct BoundedHistory {
    capacity: usize,
    entries: Mutex<VecDeque<Arc<Record>>>,
}

impl BoundedHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Inserts at the head, evicting exactly one record (the oldest) when full.
    pub fn push(&self, record: Arc<Record>) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_back();
        }
        entries.push_front(record);
    }

    /// Up to `limit` most recent records, newest first.
    pub fn latest(&self, limit: usize) -> Vec<Arc<Record>> {
        let entries = self.entries.lock();
        entries.iter().take(limit).cloned().collect()
    }

    /// Retained records with `offset >= from`, newest first.
    pub fn from_offset(&self, from: i64) -> Vec<Arc<Record>> {
        let entries = self.entries.lock();
        entries
            .iter()
            .filter(|record| record.offset >= from)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
