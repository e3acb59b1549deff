//! History Store: topic -> key -> bounded history, shared by every task.
//!
//! Structure:
//! - HistoryStore: DashMap of topics. Insert-if-absent only on the first record of a topic.
//! - TopicHistory: DashMap of real keys plus the sentinel history, created with the topic.
//! - BoundedHistory: one lock per history, so different keys never contend.
//!
//! Every record lands twice: in its own key's history and in the topic's sentinel history.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::HistoryConfig;
use crate::history::bounded::BoundedHistory;
use crate::history::record::Record;

/// Per-topic directory. The sentinel history always exists.
struct TopicHistory {
    keys: DashMap<String, Arc<BoundedHistory>>,
    all: Arc<BoundedHistory>,
}

impl TopicHistory {
    fn new(capacity: usize) -> Self {
        Self {
            keys: DashMap::new(),
            all: Arc::new(BoundedHistory::new(capacity)),
        }
    }

    fn key_or_insert(&self, key: &str, capacity: usize) -> Arc<BoundedHistory> {
        if let Some(history) = self.keys.get(key) {
            return history.clone();
        }
        // Racing creators both land here; entry() lets exactly one insert and both reuse it.
        self.keys
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(BoundedHistory::new(capacity)))
            .clone()
    }
}

/// Result of resolving a topic/key pair to its history.
pub enum HistoryLookup {
    Found(Arc<BoundedHistory>),
    UnknownTopic,
    UnknownKey,
}

pub struct HistoryStore {
    topics: DashMap<String, Arc<TopicHistory>>,
    capacity: usize,
    sentinel_key: String,
}

impl HistoryStore {
    pub fn new(capacity: usize, sentinel_key: impl Into<String>) -> Self {
        Self {
            topics: DashMap::new(),
            capacity: capacity.max(1),
            sentinel_key: sentinel_key.into(),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.capacity, config.sentinel_key.clone())
    }

    pub fn sentinel_key(&self) -> &str {
        &self.sentinel_key
    }

    // ========================================
    // WRITE PATH
    // ========================================

    /// Stores the record under its key and under the sentinel. Never fails.
    pub fn append(&self, record: Record) {
        let record = Arc::new(record);
        let topic = self.topic_or_insert(&record.topic);

        // A real key equal to the sentinel would otherwise be stored twice in the same history.
        if record.key != self.sentinel_key {
            topic
                .key_or_insert(&record.key, self.capacity)
                .push(Arc::clone(&record));
        }
        topic.all.push(record);
    }

    fn topic_or_insert(&self, topic: &str) -> Arc<TopicHistory> {
        if let Some(existing) = self.topics.get(topic) {
            return existing.clone();
        }
        let capacity = self.capacity;
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| Arc::new(TopicHistory::new(capacity)))
            .clone()
    }

    // ========================================
    // READ PATH
    // ========================================

    /// Resolves a history. `None` as key means the sentinel.
    pub fn lookup(&self, topic: &str, key: Option<&str>) -> HistoryLookup {
        let Some(topic) = self.topics.get(topic).map(|t| t.clone()) else {
            return HistoryLookup::UnknownTopic;
        };
        match key {
            None => HistoryLookup::Found(topic.all.clone()),
            Some(key) if key == self.sentinel_key => HistoryLookup::Found(topic.all.clone()),
            Some(key) => match topic.keys.get(key) {
                Some(history) => HistoryLookup::Found(history.clone()),
                None => HistoryLookup::UnknownKey,
            },
        }
    }

    /// Up to `limit` newest records, or `None` if the topic or key has no history.
    pub fn query_by_limit(&self, topic: &str, key: Option<&str>, limit: usize) -> Option<Vec<Arc<Record>>> {
        match self.lookup(topic, key) {
            HistoryLookup::Found(history) => Some(history.latest(limit)),
            _ => None,
        }
    }

    /// Retained records with offset at or after `offset`, newest first.
    pub fn query_from_offset(&self, topic: &str, key: Option<&str>, offset: i64) -> Option<Vec<Arc<Record>>> {
        match self.lookup(topic, key) {
            HistoryLookup::Found(history) => Some(history.from_offset(offset)),
            _ => None,
        }
    }

    /// Topics with at least one record, sorted.
    pub fn list_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.iter().map(|entry| entry.key().clone()).collect();
        topics.sort();
        topics
    }

    /// Real keys of a topic, sorted. `None` if the topic was never seen.
    pub fn list_keys(&self, topic: &str) -> Option<Vec<String>> {
        let topic = self.topics.get(topic).map(|t| t.clone())?;
        let mut keys: Vec<String> = topic.keys.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        Some(keys)
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}
