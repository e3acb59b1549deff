//! Subscription Manager: keeps the consumer subscribed to every user topic.
//!
//! Each tick fetches the topic catalog, drops internal/derived topics and
//! resubscribes (full replace) only when the filtered set actually changed.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::consumer::client::{SharedClient, StreamClient};
use crate::error::StreamError;

/// Decides which catalog topics are worth subscribing to.
#[derive(Debug, Clone)]
pub struct TopicFilter {
    internal_prefix: String,
    excluded_markers: Vec<String>,
}

impl Default for TopicFilter {
    fn default() -> Self {
        Self {
            internal_prefix: "__".to_string(),
            excluded_markers: vec!["changelog".to_string(), "metrics".to_string()],
        }
    }
}

impl TopicFilter {
    pub fn new(internal_prefix: impl Into<String>, excluded_markers: &[&str]) -> Self {
        Self {
            internal_prefix: internal_prefix.into(),
            excluded_markers: excluded_markers.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Markers match anywhere in the name, not only as prefix or suffix.
    pub fn accepts(&self, topic: &str) -> bool {
        !topic.starts_with(&self.internal_prefix)
            && !self.excluded_markers.iter().any(|marker| topic.contains(marker.as_str()))
    }

    pub fn apply<'a>(&self, topics: impl IntoIterator<Item = &'a String>) -> HashSet<String> {
        topics
            .into_iter()
            .filter(|topic| self.accepts(topic))
            .cloned()
            .collect()
    }
}

pub struct SubscriptionManager<C: StreamClient> {
    client: SharedClient<C>,
    filter: TopicFilter,
    interval: Duration,
    current: HashSet<String>,
}

impl<C: StreamClient> SubscriptionManager<C> {
    pub fn new(client: SharedClient<C>, interval: Duration) -> Self {
        Self {
            client,
            filter: TopicFilter::default(),
            interval,
            current: HashSet::new(),
        }
    }

    pub fn with_filter(mut self, filter: TopicFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Currently active subscription set.
    pub fn current(&self) -> &HashSet<String> {
        &self.current
    }

    /// One tick. Returns `true` if the subscription was replaced.
    pub async fn refresh(&mut self) -> Result<bool, StreamError> {
        let mut client = self.client.lock().await;
        let catalog = client.list_topics().await?;
        let wanted = self.filter.apply(&catalog);

        // HashSet equality: same size and same members, enumeration order irrelevant
        if wanted == self.current {
            return Ok(false);
        }

        client.subscribe(&wanted)?;
        drop(client);

        let mut names: Vec<&str> = wanted.iter().map(String::as_str).collect();
        names.sort_unstable();
        info!("New subscription list: {}", names.join(" "));

        self.current = wanted;
        Ok(true)
    }

    /// Ticks until `cancel` fires. Errors are logged and retried on the next tick.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.refresh().await {
                        warn!(error = %e, "Subscription update failed, retrying next tick");
                    }
                }
            }
        }
        info!("Subscription manager stopped");
    }
}
