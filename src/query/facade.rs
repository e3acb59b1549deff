//! Query Facade: read-only view over the history store for the HTTP layer.

use std::sync::Arc;

use crate::history::{HistoryLookup, HistoryStore};
use crate::query::types::{ConsumeCriterion, ConsumeResult, KeyList, QueryStatus, TopicList};

#[derive(Clone)]
pub struct QueryFacade {
    history: Arc<HistoryStore>,
}

impl QueryFacade {
    pub fn new(history: Arc<HistoryStore>) -> Self {
        Self { history }
    }

    /// `key = None` reads the topic-wide sentinel history.
    pub fn consume(&self, topic: &str, key: Option<&str>, criterion: ConsumeCriterion) -> ConsumeResult {
        let resolved_key = key.unwrap_or(self.history.sentinel_key()).to_string();

        let (status, records) = match self.history.lookup(topic, key) {
            HistoryLookup::UnknownTopic => (QueryStatus::UnknownTopic, Vec::new()),
            HistoryLookup::UnknownKey => (QueryStatus::UnknownKey, Vec::new()),
            HistoryLookup::Found(history) => {
                let records = match criterion {
                    ConsumeCriterion::Limit(limit) => history.latest(limit),
                    ConsumeCriterion::Offset(offset) => history.from_offset(offset),
                };
                if records.is_empty() {
                    (QueryStatus::EmptyTopic, records)
                } else {
                    (QueryStatus::Found, records)
                }
            }
        };

        ConsumeResult {
            topic: topic.to_string(),
            key: resolved_key,
            status,
            records,
        }
    }

    pub fn list_topics(&self) -> TopicList {
        let topics = self.history.list_topics();
        let status = if topics.is_empty() {
            QueryStatus::EmptyTopic
        } else {
            QueryStatus::Found
        };
        TopicList { status, topics }
    }

    pub fn list_keys(&self, topic: &str) -> KeyList {
        let (status, keys) = match self.history.list_keys(topic) {
            None => (QueryStatus::UnknownTopic, Vec::new()),
            Some(keys) if keys.is_empty() => (QueryStatus::EmptyTopic, keys),
            Some(keys) => (QueryStatus::Found, keys),
        };
        KeyList {
            topic: topic.to_string(),
            status,
            keys,
        }
    }
}
