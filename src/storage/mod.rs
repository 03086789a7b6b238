mod code;
mod history;
mod kv;
mod secrets;

pub use code::CodeTracker;
pub use history::{HistoryStore, DEFAULT_HISTORY_PREFIX};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use secrets::{mask_api_key, SaveOutcome, SecretStore};
