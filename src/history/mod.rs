pub mod record;
pub mod bounded;
pub mod history_store;

pub use record::Record;
pub use bounded::BoundedHistory;
pub use history_store::{HistoryLookup, HistoryStore};
