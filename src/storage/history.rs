use std::sync::Arc;
use tracing::{debug, error, warn};

use super::kv::{KeyValueStore, StoreError};
use crate::models::{ConversationRecord, HistorySummary, ProblemIdentifier};

pub const DEFAULT_HISTORY_PREFIX: &str = "AI_CHAT_HISTORY_";

/// Per-problem conversation records under a namespaced key prefix.
///
/// Only the store's own I/O failures surface as errors. A record that no
/// longer parses is reported as absent by [`load`](Self::load) and skipped
/// by [`list_all`](Self::list_all).
#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_prefix(store, DEFAULT_HISTORY_PREFIX)
    }

    pub fn with_prefix(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn key_for(&self, id: &ProblemIdentifier) -> String {
        format!("{}{}", self.prefix, id)
    }

    pub async fn save(
        &self,
        id: &ProblemIdentifier,
        record: &ConversationRecord,
    ) -> Result<(), StoreError> {
        let key = self.key_for(id);
        let value = serde_json::to_string(record).map_err(|source| StoreError::Encode {
            key: key.clone(),
            source,
        })?;
        self.store.set(&key, value).await?;

        let label = if record.problem_title.is_empty() {
            id.as_str()
        } else {
            record.problem_title.as_str()
        };
        debug!("Chat history saved for problem: {}", label);
        Ok(())
    }

    pub async fn load(&self, id: &ProblemIdentifier) -> Result<Option<ConversationRecord>, StoreError> {
        let key = self.key_for(id);
        let Some(raw) = self.store.get(&key).await? else {
            debug!("No chat history found for problem: {}", id);
            return Ok(None);
        };

        match serde_json::from_str::<ConversationRecord>(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                error!("Error parsing chat history {}: {}", key, e);
                Ok(None)
            }
        }
    }

    pub async fn delete(&self, id: &ProblemIdentifier) -> Result<(), StoreError> {
        self.store.remove(&self.key_for(id)).await?;
        debug!("Cleared chat history for problem: {}", id);
        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<HistorySummary>, StoreError> {
        let mut summaries = Vec::new();

        for key in self.store.keys().await? {
            let Some(problem_id) = key.strip_prefix(&self.prefix) else {
                continue;
            };
            let Some(raw) = self.store.get(&key).await? else {
                continue;
            };

            match serde_json::from_str::<ConversationRecord>(&raw) {
                Ok(record) => summaries.push(HistorySummary::from_record(
                    key.clone(),
                    problem_id.to_string(),
                    &record,
                )),
                Err(e) => warn!("Skipping unreadable history entry {}: {}", key, e),
            }
        }

        Ok(summaries)
    }

    /// Remove every namespaced record, returning how many were removed.
    pub async fn clear_all(&self) -> Result<usize, StoreError> {
        let keys: Vec<String> = self
            .store
            .keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(&self.prefix))
            .collect();

        for key in &keys {
            self.store.remove(key).await?;
        }

        debug!("Cleared {} chat histories", keys.len());
        Ok(keys.len())
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::models::ChatMessage;
    use crate::storage::{JsonFileStore, MemoryStore};
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn arbitrary_message() -> impl Strategy<Value = ChatMessage> {
        (any::<bool>(), ".{0,60}").prop_map(|(from_user, body)| {
            if from_user {
                ChatMessage::user(body)
            } else {
                ChatMessage::assistant(body)
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn save_then_load_round_trips(
            id in "[a-zA-Z0-9_-]{1,40}",
            title in ".{0,40}",
            messages in prop::collection::vec(arbitrary_message(), 0..12)
        ) {
            tokio_test::block_on(async {
                let history = HistoryStore::new(Arc::new(MemoryStore::new()));
                let id = ProblemIdentifier::new(id);
                let record = ConversationRecord::new("https://leetcode.com/problems/x/", title)
                    .with_messages(messages);

                history.save(&id, &record).await.unwrap();
                assert_eq!(history.load(&id).await.unwrap(), Some(record));

                history.delete(&id).await.unwrap();
                assert_eq!(history.load(&id).await.unwrap(), None);
            });
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn file_store_round_trips_across_reopen(
            messages in prop::collection::vec(arbitrary_message(), 1..8)
        ) {
            tokio_test::block_on(async {
                let temp_dir = TempDir::new().unwrap();
                let path = temp_dir.path().join("store.json");
                let id = ProblemIdentifier::from("two-sum");
                let record = ConversationRecord::new("https://leetcode.com/problems/two-sum/", "Two Sum")
                    .with_messages(messages);

                HistoryStore::new(Arc::new(JsonFileStore::new(path.clone())))
                    .save(&id, &record)
                    .await
                    .unwrap();
                let reopened = HistoryStore::new(Arc::new(JsonFileStore::new(path)));

                assert_eq!(reopened.load(&id).await.unwrap(), Some(record));
            });
        }
    }
}
