use std::sync::Arc;

use crate::history::Record;

/// How many / which records a consume call wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeCriterion {
    /// The newest `n` records (n >= 1).
    Limit(usize),
    /// Retained records at or after this offset.
    Offset(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Found,
    /// The topic exists but nothing matched.
    EmptyTopic,
    UnknownTopic,
    UnknownKey,
}

impl QueryStatus {
    pub fn is_found(self) -> bool {
        self == QueryStatus::Found
    }
}

#[derive(Debug, Clone)]
pub struct ConsumeResult {
    pub topic: String,
    /// The requested key, or the sentinel when none was given.
    pub key: String,
    pub status: QueryStatus,
    /// Newest first. Empty unless `status` is `Found`.
    pub records: Vec<Arc<Record>>,
}

#[derive(Debug, Clone)]
pub struct TopicList {
    pub status: QueryStatus,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct KeyList {
    pub topic: String,
    pub status: QueryStatus,
    pub keys: Vec<String>,
}
