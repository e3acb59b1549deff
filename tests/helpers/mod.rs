use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tailgate::consumer::{StreamClient, StreamMessage};
use tailgate::error::StreamError;
use tailgate::history::{HistoryStore, Record};

pub const SENTINEL: &str = "__all__";

pub fn setup_store(capacity: usize) -> Arc<HistoryStore> {
    Arc::new(HistoryStore::new(capacity, SENTINEL))
}

pub fn record(topic: &str, key: &str, offset: i64) -> Record {
    Record::new(vec![offset as u8], key, topic, 0, offset)
}

pub fn offsets(records: &[Arc<Record>]) -> Vec<i64> {
    records.iter().map(|r| r.offset).collect()
}

pub fn topic_set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Polls `condition` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Stream client double: a settable topic catalog and a log of subscribe calls.
/// Failed subscribe attempts are logged too.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    pub catalog: Arc<Mutex<HashSet<String>>>,
    pub subscribe_calls: Arc<Mutex<Vec<HashSet<String>>>>,
    pub catalog_fails: Arc<AtomicBool>,
    pub subscribe_fails: Arc<AtomicBool>,
    pub subscribed: Arc<AtomicBool>,
    pub closed: Arc<AtomicBool>,
}

impl ScriptedClient {
    pub fn with_catalog(names: &[&str]) -> Self {
        let client = Self::default();
        *client.catalog.lock() = topic_set(names);
        client
    }

    pub fn set_catalog(&self, names: &[&str]) {
        *self.catalog.lock() = topic_set(names);
    }

    pub fn calls(&self) -> Vec<HashSet<String>> {
        self.subscribe_calls.lock().clone()
    }
}

impl StreamClient for ScriptedClient {
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<StreamMessage>, StreamError> {
        if !self.subscribed.load(Ordering::SeqCst) {
            return Err(StreamError::NotSubscribed);
        }
        tokio::time::sleep(timeout).await;
        Ok(Vec::new())
    }

    async fn list_topics(&mut self) -> Result<HashSet<String>, StreamError> {
        if self.catalog_fails.load(Ordering::SeqCst) {
            return Err(StreamError::Client("metadata unavailable".to_string()));
        }
        Ok(self.catalog.lock().clone())
    }

    fn subscribe(&mut self, topics: &HashSet<String>) -> Result<(), StreamError> {
        self.subscribe_calls.lock().push(topics.clone());
        if self.subscribe_fails.load(Ordering::SeqCst) {
            return Err(StreamError::Client("group coordinator unavailable".to_string()));
        }
        self.subscribed.store(!topics.is_empty(), Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Samples from running one operation on several threads at once.
pub struct ContentionBench {
    pub name: String,
    pub elapsed: Duration,
    /// One latency list per thread.
    pub samples: Vec<Vec<Duration>>,
}

impl ContentionBench {
    /// Runs `op(thread, i)` `per_thread` times on each of `threads` threads, all released together.
    pub fn run<F>(name: &str, threads: usize, per_thread: usize, op: F) -> Self
    where
        F: Fn(usize, usize) + Sync,
    {
        let barrier = Barrier::new(threads);
        let started = Instant::now();
        let samples = thread::scope(|scope| {
            let workers: Vec<_> = (0..threads)
                .map(|t| {
                    let (op, barrier) = (&op, &barrier);
                    scope.spawn(move || {
                        barrier.wait();
                        let mut latencies = Vec::with_capacity(per_thread);
                        for i in 0..per_thread {
                            let start = Instant::now();
                            op(t, i);
                            latencies.push(start.elapsed());
                        }
                        latencies
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect::<Vec<_>>()
        });

        Self {
            name: name.to_string(),
            elapsed: started.elapsed(),
            samples,
        }
    }

    pub fn total_ops(&self) -> usize {
        self.samples.iter().map(Vec::len).sum()
    }

    /// Busy time of the slowest thread over the fastest. Near 1.0 means no thread starved.
    pub fn skew(&self) -> f64 {
        let busy: Vec<f64> = self
            .samples
            .iter()
            .map(|s| s.iter().sum::<Duration>().as_secs_f64())
            .collect();
        let fastest = busy.iter().cloned().fold(f64::MAX, f64::min);
        let slowest = busy.iter().cloned().fold(0.0, f64::max);
        if fastest > 0.0 { slowest / fastest } else { 1.0 }
    }

    pub fn report(&self) {
        let mut all: Vec<Duration> = self.samples.iter().flatten().copied().collect();
        all.sort();
        let at = |pct: usize| all.get(all.len() * pct / 100).copied().unwrap_or_default().as_nanos();

        println!(
            "\n{} ({} threads): {:.0} ops/sec | p50 {}ns p99 {}ns | skew {:.2}",
            self.name,
            self.samples.len(),
            self.total_ops() as f64 / self.elapsed.as_secs_f64(),
            at(50),
            at(99),
            self.skew(),
        );
    }
}
