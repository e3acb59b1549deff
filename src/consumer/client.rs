//! Stream Client: the upstream boundary the consumer loops talk to.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::error::StreamError;
use crate::history::Record;

/// A record as delivered by a stream client, before it enters the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub payload: Option<Bytes>,
}

impl From<StreamMessage> for Record {
    fn from(message: StreamMessage) -> Self {
        Record {
            payload: message.payload.unwrap_or_default(),
            key: message.key.unwrap_or_default(),
            topic: message.topic,
            partition: message.partition,
            offset: message.offset,
        }
    }
}

/// Operations the gateway needs from a stream consumer.
///
/// Implementations are not expected to be safe for concurrent use: callers go
/// through [`SharedClient`], which serializes every call. A poll in progress is
/// interrupted by dropping its future.
pub trait StreamClient: Send + 'static {
    /// Waits up to `timeout` for new records. Fails with
    /// [`StreamError::NotSubscribed`] while nothing is subscribed.
    fn poll(&mut self, timeout: Duration) -> impl Future<Output = Result<Vec<StreamMessage>, StreamError>> + Send;

    /// Names of every topic the stream currently knows about.
    fn list_topics(&mut self) -> impl Future<Output = Result<HashSet<String>, StreamError>> + Send;

    /// Replaces the whole subscription set.
    fn subscribe(&mut self, topics: &HashSet<String>) -> Result<(), StreamError>;

    fn close(&mut self) -> Result<(), StreamError>;
}

/// The single client handle shared by the ingestion loop and the subscription manager.
pub type SharedClient<C> = Arc<Mutex<C>>;

pub fn shared<C: StreamClient>(client: C) -> SharedClient<C> {
    Arc::new(Mutex::new(client))
}
