//! Kafka Stream Client built on rdkafka's `StreamConsumer`.

use std::collections::HashSet;
use std::time::Duration;

use bytes::Bytes;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::{ClientConfig, Message};
use tokio::time::Instant;

use crate::config::ConsumerConfig;
use crate::consumer::client::{StreamClient, StreamMessage};
use crate::error::StreamError;

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

pub struct KafkaStreamClient {
    consumer: StreamConsumer,
    subscribed: bool,
    max_poll_records: usize,
}

impl KafkaStreamClient {
    pub fn new(config: &ConsumerConfig) -> Result<Self, StreamError> {
        let group_id = config.group_id();
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("group.id", &group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|e| StreamError::Client(format!("Kafka create error: {}", e)))?;

        tracing::info!(group_id = %group_id, servers = %config.bootstrap_servers, "Kafka consumer created");

        Ok(Self {
            consumer,
            subscribed: false,
            max_poll_records: config.max_poll_records.max(1),
        })
    }

    fn to_message<M: Message>(message: &M) -> StreamMessage {
        StreamMessage {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            key: message.key().map(|k| String::from_utf8_lossy(k).into_owned()),
            payload: message.payload().map(Bytes::copy_from_slice),
        }
    }
}

impl StreamClient for KafkaStreamClient {
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<StreamMessage>, StreamError> {
        if !self.subscribed {
            return Err(StreamError::NotSubscribed);
        }

        let deadline = Instant::now() + timeout;
        let mut batch = Vec::new();
        while batch.len() < self.max_poll_records {
            match tokio::time::timeout_at(deadline, self.consumer.recv()).await {
                Ok(Ok(message)) => batch.push(Self::to_message(&message)),
                Ok(Err(e)) if batch.is_empty() => {
                    return Err(StreamError::Client(format!("Kafka receive error: {}", e)));
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Kafka receive error after partial batch");
                    break;
                }
                Err(_) => break,
            }
        }
        Ok(batch)
    }

    async fn list_topics(&mut self) -> Result<HashSet<String>, StreamError> {
        // fetch_metadata blocks the calling thread
        let metadata = tokio::task::block_in_place(|| {
            self.consumer.fetch_metadata(None, METADATA_TIMEOUT)
        })
        .map_err(|e| StreamError::Client(format!("Kafka metadata error: {}", e)))?;

        Ok(metadata
            .topics()
            .iter()
            .map(|topic| topic.name().to_string())
            .collect())
    }

    fn subscribe(&mut self, topics: &HashSet<String>) -> Result<(), StreamError> {
        if topics.is_empty() {
            self.consumer.unsubscribe();
            self.subscribed = false;
            return Ok(());
        }
        let names: Vec<&str> = topics.iter().map(String::as_str).collect();
        self.consumer
            .subscribe(&names)
            .map_err(|e| StreamError::Client(format!("Kafka subscribe error: {}", e)))?;
        self.subscribed = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.consumer.unsubscribe();
        self.subscribed = false;
        Ok(())
    }
}
