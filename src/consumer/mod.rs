pub mod client;
pub mod memory;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod subscription;
pub mod ingestion;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::{ConsumerConfig, StreamBackend};
use crate::error::StreamError;
use crate::history::HistoryStore;

pub use client::{shared, SharedClient, StreamClient, StreamMessage};
pub use ingestion::{IngestionLoop, IngestionState, IngestionStats};
pub use memory::{MemoryBroker, MemoryConsumer};
pub use subscription::{SubscriptionManager, TopicFilter};

/// Running consumer: the ingestion loop and the subscription manager.
pub struct ConsumerHandle {
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl ConsumerHandle {
    /// Signals both loops and waits until they have exited.
    pub async fn close(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

/// Spawns both loops over one shared client.
pub fn spawn<C: StreamClient>(client: C, history: Arc<HistoryStore>, config: &ConsumerConfig) -> ConsumerHandle {
    let client = shared(client);
    let cancel = CancellationToken::new();
    let tracker = TaskTracker::new();

    let subscriptions = SubscriptionManager::new(client.clone(), config.subscription_interval());
    tracker.spawn(subscriptions.run(cancel.child_token()));

    let ingestion = IngestionLoop::new(client, history, config.poll_timeout());
    tracker.spawn(ingestion.run(cancel.child_token()));

    ConsumerHandle { cancel, tracker }
}

/// Builds the configured backend and starts consuming into `history`.
pub fn connect(config: &ConsumerConfig, history: Arc<HistoryStore>) -> Result<ConsumerHandle, StreamError> {
    match config.backend {
        StreamBackend::Memory => {
            tracing::warn!("Using the in-memory stream backend, no external records will arrive");
            let broker = Arc::new(MemoryBroker::new());
            Ok(spawn(MemoryConsumer::new(broker, config.max_poll_records), history, config))
        }
        #[cfg(feature = "kafka")]
        StreamBackend::Kafka => {
            let client = kafka::KafkaStreamClient::new(config)?;
            Ok(spawn(client, history, config))
        }
        #[cfg(not(feature = "kafka"))]
        StreamBackend::Kafka => Err(StreamError::Client(
            "built without the `kafka` feature".to_string(),
        )),
    }
}
