//! Ingestion Loop: polls the stream and appends every record to the history store.
//!
//! States: Polling -> Stopped (only on cancellation). Batches are appended in
//! poll order so per-partition offset order survives into the histories.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::consumer::client::{SharedClient, StreamClient};
use crate::error::StreamError;
use crate::history::{HistoryStore, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionState {
    Polling,
    Stopped,
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionStats {
    pub polls: u64,
    pub records: u64,
    pub not_ready: u64,
    pub errors: u64,
}

pub struct IngestionLoop<C: StreamClient> {
    client: SharedClient<C>,
    history: Arc<HistoryStore>,
    poll_timeout: Duration,
    state: IngestionState,
    stats: IngestionStats,
}

impl<C: StreamClient> IngestionLoop<C> {
    pub fn new(client: SharedClient<C>, history: Arc<HistoryStore>, poll_timeout: Duration) -> Self {
        Self {
            client,
            history,
            poll_timeout,
            state: IngestionState::Polling,
            stats: IngestionStats::default(),
        }
    }

    pub fn state(&self) -> IngestionState {
        self.state
    }

    /// One poll plus append. Returns how many records were stored.
    pub async fn poll_once(&mut self) -> Result<usize, StreamError> {
        let batch = {
            let mut client = self.client.lock().await;
            client.poll(self.poll_timeout).await?
        };
        self.stats.polls += 1;

        let count = batch.len();
        for message in batch {
            let record = Record::from(message);
            debug!("Consumed: {}", record);
            self.history.append(record);
        }
        self.stats.records += count as u64;
        Ok(count)
    }

    /// Runs until `cancel` fires, then closes the client.
    pub async fn run(mut self, cancel: CancellationToken) -> IngestionStats {
        info!("Ingestion loop started");

        while self.state == IngestionState::Polling {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                outcome = self.poll_once() => Some(outcome),
            };
            let Some(outcome) = outcome else {
                info!("Poll interrupted with wakeup call.");
                self.state = IngestionState::Stopped;
                break;
            };

            match outcome {
                Ok(_) => {}
                Err(StreamError::NotSubscribed) => {
                    // No topic yet: wait instead of spinning
                    self.stats.not_ready += 1;
                    self.back_off(&cancel).await;
                }
                Err(e) => {
                    self.stats.errors += 1;
                    warn!(error = %e, "Poll failed, backing off");
                    self.back_off(&cancel).await;
                }
            }
        }

        if let Err(e) = self.client.lock().await.close() {
            warn!(error = %e, "Failed to close stream client");
        }
        info!(
            polls = self.stats.polls,
            records = self.stats.records,
            "Closed stream consumer"
        );
        self.stats
    }

    async fn back_off(&mut self, cancel: &CancellationToken) {
        let pause = self.poll_timeout;
        tokio::select! {
            _ = cancel.cancelled() => self.state = IngestionState::Stopped,
            _ = tokio::time::sleep(pause) => {}
        }
    }
}
