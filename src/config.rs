use std::env;
use std::time::Duration;

use uuid::Uuid;

use crate::error::ConfigError;

// --- CONFIG AGGREGATOR ---

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub history: HistoryConfig,
    pub consumer: ConsumerConfig,
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            server: ServerConfig::load(&lookup)?,
            history: HistoryConfig::load(&lookup)?,
            consumer: ConsumerConfig::load(&lookup)?,
        })
    }
}

// --- MODULES ---

// SERVER
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl ServerConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            host:      get_env(lookup, "SERVER_HOST", "0.0.0.0")?,
            port:      get_env(lookup, "SERVER_PORT", "8080")?,
            log_level: get_env(lookup, "TAILGATE_LOG", "info")?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// HISTORY
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Records kept per topic/key, sentinel included.
    pub capacity: usize,
    pub sentinel_key: String,
}

impl HistoryConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = Self {
            capacity:     get_env(lookup, "HISTORY_CAPACITY", "100")?,
            sentinel_key: get_env(lookup, "HISTORY_SENTINEL_KEY", "__all__")?,
        };
        require_positive("HISTORY_CAPACITY", config.capacity as u64)?;
        if config.sentinel_key.is_empty() {
            return Err(ConfigError::Invalid {
                key: "HISTORY_SENTINEL_KEY",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(config)
    }
}

// CONSUMER
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamBackend {
    Memory,
    Kafka,
}

impl std::str::FromStr for StreamBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StreamBackend::Memory),
            "kafka" if cfg!(feature = "kafka") => Ok(StreamBackend::Kafka),
            _ => Err(ConfigError::UnsupportedBackend(s.to_string())),
        }
    }
}

const DEFAULT_BACKEND: &str = "kafka";

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub backend: StreamBackend,
    pub bootstrap_servers: String,
    pub group_id_prefix: String,
    pub poll_timeout_ms: u64,
    pub subscription_interval_ms: u64,
    pub max_poll_records: usize,
}

impl ConsumerConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend: String = get_env(lookup, "STREAM_BACKEND", DEFAULT_BACKEND)?;
        let backend: StreamBackend = backend.parse()?;
        // A broker address only means something to kafka
        if backend == StreamBackend::Memory && lookup("STREAM_BOOTSTRAP_SERVERS").is_some() {
            return Err(ConfigError::Invalid {
                key: "STREAM_BOOTSTRAP_SERVERS",
                reason: "cannot be used with STREAM_BACKEND=memory".to_string(),
            });
        }
        let config = Self {
            backend:                  backend,
            bootstrap_servers:        get_env(lookup, "STREAM_BOOTSTRAP_SERVERS", "localhost:9092")?,
            group_id_prefix:          get_env(lookup, "STREAM_GROUP_ID_PREFIX", "tailgate")?,
            poll_timeout_ms:          get_env(lookup, "STREAM_POLL_TIMEOUT_MS", "100")?,
            subscription_interval_ms: get_env(lookup, "STREAM_SUBSCRIPTION_INTERVAL_MS", "1000")?,
            max_poll_records:         get_env(lookup, "STREAM_MAX_POLL_RECORDS", "500")?,
        };
        require_positive("STREAM_POLL_TIMEOUT_MS", config.poll_timeout_ms)?;
        require_positive("STREAM_SUBSCRIPTION_INTERVAL_MS", config.subscription_interval_ms)?;
        require_positive("STREAM_MAX_POLL_RECORDS", config.max_poll_records as u64)?;
        Ok(config)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn subscription_interval(&self) -> Duration {
        Duration::from_millis(self.subscription_interval_ms)
    }

    /// Every process joins its own group so each gateway sees every record.
    pub fn group_id(&self) -> String {
        format!("{}_{}", self.group_id_prefix, Uuid::new_v4())
    }
}

// --- PRIVATE HELPERS ---

fn get_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError> {
    let value = lookup(key).unwrap_or_else(|| default.to_string());
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Malformed { key, value })
}

fn require_positive(key: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "has to be greater than 0".to_string(),
        });
    }
    Ok(())
}
