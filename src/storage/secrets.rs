use std::sync::Arc;
use thiserror::Error;

use super::kv::{KeyValueStore, StoreError};

pub const API_KEY_ENTRY: &str = "GEMINI_API_KEY";

/// Gemini keys are issued with this prefix.
const API_KEY_PREFIX: &str = "AI";

const MASK_VISIBLE_CHARS: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiKeyError {
    #[error("Please enter an API key")]
    Empty,

    #[error("Invalid API key format")]
    InvalidFormat,
}

/// Outcome of a settings save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { masked: String },
    /// The input was the masked form of the stored key.
    Unchanged,
}

pub fn validate_api_key(input: &str) -> Result<&str, ApiKeyError> {
    let key = input.trim();
    if key.is_empty() {
        return Err(ApiKeyError::Empty);
    }
    if !key.starts_with(API_KEY_PREFIX) {
        return Err(ApiKeyError::InvalidFormat);
    }
    Ok(key)
}

/// `AIza...wxyz` style display form.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(MASK_VISIBLE_CHARS).collect();
    let tail: String = chars[chars.len().saturating_sub(MASK_VISIBLE_CHARS)..]
        .iter()
        .collect();
    format!("{head}...{tail}")
}

/// Holds the single API key in its own small store, apart from history.
#[derive(Clone)]
pub struct SecretStore {
    store: Arc<dyn KeyValueStore>,
}

impl SecretStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored key, or an empty string when none is set.
    pub async fn api_key(&self) -> Result<String, StoreError> {
        Ok(self.store.get(API_KEY_ENTRY).await?.unwrap_or_default())
    }

    pub async fn set_api_key(&self, key: &str) -> Result<(), StoreError> {
        self.store.set(API_KEY_ENTRY, key.to_string()).await?;
        tracing::info!("API key saved successfully with length: {}", key.len());
        Ok(())
    }

    pub async fn delete_api_key(&self) -> Result<(), StoreError> {
        self.store.remove(API_KEY_ENTRY).await
    }

    /// Validate and store a key entered through the settings surface.
    pub async fn save_from_input(&self, input: &str) -> anyhow::Result<SaveOutcome> {
        let current = self.api_key().await?;
        if !current.is_empty() && input.trim().contains("...") {
            return Ok(SaveOutcome::Unchanged);
        }

        let key = validate_api_key(input)?;
        self.set_api_key(key).await?;
        Ok(SaveOutcome::Saved {
            masked: mask_api_key(key),
        })
    }
}
