//! Memory Stream: in-process partitioned log with a consumer client.
//!
//! The broker side keeps `topic -> partitions -> messages`; offsets are the
//! index in the partition. Consumers start from the earliest offset and
//! track their own positions, like a fresh consumer group would.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::consumer::client::{StreamClient, StreamMessage};
use crate::error::StreamError;

#[derive(Default)]
pub struct MemoryBroker {
    topics: RwLock<BTreeMap<String, Vec<Vec<StreamMessage>>>>,
    new_data_notifier: Notify,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the topic if absent. Existing topics keep their partition count.
    pub fn create_topic(&self, topic: &str, partitions: usize) {
        let mut topics = self.topics.write();
        topics
            .entry(topic.to_string())
            .or_insert_with(|| vec![Vec::new(); partitions.max(1)]);
    }

    /// Appends to a partition and returns the offset. An unknown topic is
    /// created with a single partition; the partition must exist.
    pub fn produce(&self, topic: &str, partition: i32, key: Option<&str>, payload: impl Into<Bytes>) -> Result<i64, StreamError> {
        let offset = {
            let mut topics = self.topics.write();
            let partitions = topics
                .entry(topic.to_string())
                .or_insert_with(|| vec![Vec::new()]);
            let count = partitions.len();
            let log = usize::try_from(partition)
                .ok()
                .and_then(|index| partitions.get_mut(index))
                .ok_or_else(|| {
                    StreamError::Client(format!(
                        "partition {} out of range for topic {} ({} partitions)",
                        partition, topic, count
                    ))
                })?;
            let offset = log.len() as i64;
            log.push(StreamMessage {
                topic: topic.to_string(),
                partition,
                offset,
                key: key.map(str::to_string),
                payload: Some(payload.into()),
            });
            offset
        };
        self.new_data_notifier.notify_waiters();
        Ok(offset)
    }

    pub fn topics(&self) -> HashSet<String> {
        self.topics.read().keys().cloned().collect()
    }

    /// Reads from `(topic, partition)` positions, advancing them. At most `max` records.
    fn fetch(&self, positions: &mut HashMap<(String, i32), usize>, subscription: &HashSet<String>, max: usize) -> Vec<StreamMessage> {
        let topics = self.topics.read();
        let mut batch = Vec::new();
        for (topic, partitions) in topics.iter().filter(|(name, _)| subscription.contains(*name)) {
            for (index, log) in partitions.iter().enumerate() {
                let position = positions.entry((topic.clone(), index as i32)).or_insert(0);
                while *position < log.len() && batch.len() < max {
                    batch.push(log[*position].clone());
                    *position += 1;
                }
                if batch.len() >= max {
                    return batch;
                }
            }
        }
        batch
    }
}

pub struct MemoryConsumer {
    broker: Arc<MemoryBroker>,
    subscription: HashSet<String>,
    positions: HashMap<(String, i32), usize>,
    max_poll_records: usize,
    closed: bool,
}

impl MemoryConsumer {
    pub fn new(broker: Arc<MemoryBroker>, max_poll_records: usize) -> Self {
        Self {
            broker,
            subscription: HashSet::new(),
            positions: HashMap::new(),
            max_poll_records: max_poll_records.max(1),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl StreamClient for MemoryConsumer {
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<StreamMessage>, StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        if self.subscription.is_empty() {
            return Err(StreamError::NotSubscribed);
        }

        let deadline = Instant::now() + timeout;
        loop {
            // Register before reading so a produce in between still wakes us.
            let notified = self.broker.new_data_notifier.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let batch = self.broker.fetch(&mut self.positions, &self.subscription, self.max_poll_records);
            if !batch.is_empty() {
                return Ok(batch);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn list_topics(&mut self) -> Result<HashSet<String>, StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        Ok(self.broker.topics())
    }

    fn subscribe(&mut self, topics: &HashSet<String>) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        self.subscription = topics.clone();
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.closed = true;
        self.subscription.clear();
        Ok(())
    }
}
