use std::sync::Arc;

use super::kv::{KeyValueStore, StoreError};
use crate::identity::IdentifierResolver;
use crate::models::CodeSnapshot;
use crate::page::{detect_language, extract_code, PageContent};

pub const CURRENT_CODE_KEY: &str = "CURRENT_CODE";

/// Keeps the "current code" artifact fresh.
///
/// There is one snapshot for the whole store; saving for a different problem
/// replaces it. Concurrent saves write the same key, so overlapping
/// snapshot attempts are harmless.
#[derive(Clone)]
pub struct CodeTracker {
    store: Arc<dyn KeyValueStore>,
    resolver: Arc<IdentifierResolver>,
}

impl CodeTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, resolver: Arc<IdentifierResolver>) -> Self {
        Self { store, resolver }
    }

    /// Extract the editor contents and persist them. `None` when the page
    /// shows no code.
    pub async fn save_current_code(
        &self,
        page: &dyn PageContent,
    ) -> Result<Option<CodeSnapshot>, StoreError> {
        let Some(code) = extract_code(page) else {
            return Ok(None);
        };

        let snapshot = CodeSnapshot::new(
            code,
            detect_language(page),
            self.resolver.resolve(page.url(), page).to_string(),
        );
        let value = serde_json::to_string(&snapshot).map_err(|source| StoreError::Encode {
            key: CURRENT_CODE_KEY.to_string(),
            source,
        })?;
        self.store.set(CURRENT_CODE_KEY, value).await?;

        tracing::trace!("Saved {} code snapshot for {}", snapshot.language, snapshot.problem_id);
        Ok(Some(snapshot))
    }

    /// Stored snapshot when it belongs to the current problem, otherwise a
    /// fresh extraction.
    pub async fn load_saved_code(
        &self,
        page: &dyn PageContent,
    ) -> Result<Option<CodeSnapshot>, StoreError> {
        if let Some(raw) = self.store.get(CURRENT_CODE_KEY).await? {
            match serde_json::from_str::<CodeSnapshot>(&raw) {
                Ok(snapshot) => {
                    let current = self.resolver.resolve(page.url(), page);
                    if snapshot.problem_id == current.as_str() {
                        return Ok(Some(snapshot));
                    }
                }
                Err(e) => tracing::error!("Error parsing saved code: {}", e),
            }
        }

        self.save_current_code(page).await
    }

    /// Live code first, then whatever was saved for this problem.
    pub async fn current_or_saved(
        &self,
        page: &dyn PageContent,
    ) -> Result<Option<CodeSnapshot>, StoreError> {
        match self.save_current_code(page).await? {
            Some(snapshot) => Ok(Some(snapshot)),
            None => self.load_saved_code(page).await,
        }
    }
}
