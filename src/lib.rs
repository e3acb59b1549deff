pub mod config;
pub mod error;
pub mod history;
pub mod consumer;
pub mod query;
pub mod server;
pub mod shutdown;

use std::sync::Arc;

use crate::config::HistoryConfig;
use crate::history::HistoryStore;
use crate::query::QueryFacade;

// ========================================
// ENGINE
// ========================================

/// Shared state handed to the consumer and the HTTP layer.
/// Cheap to clone (all fields are Arcs).
#[derive(Clone)]
pub struct TailgateEngine {
    pub history: Arc<HistoryStore>,
    pub query: QueryFacade,
}

impl TailgateEngine {
    pub fn new(config: &HistoryConfig) -> Self {
        Self::with_store(Arc::new(HistoryStore::from_config(config)))
    }

    pub fn with_store(history: Arc<HistoryStore>) -> Self {
        Self {
            query: QueryFacade::new(history.clone()),
            history,
        }
    }
}
