use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::chat::ChatMessage;

/// Persisted transcript for one problem.
///
/// Field names follow the stored JSON layout (`pageUrl`, `problemTitle`,
/// `lastUpdated`, `messages`) so existing records stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub page_url: String,
    #[serde(default)]
    pub problem_title: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ConversationRecord {
    pub fn new(page_url: impl Into<String>, problem_title: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            problem_title: problem_title.into(),
            last_updated: Utc::now(),
            messages: Vec::new(),
        }
    }

    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    pub fn message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_conversational()).count()
    }
}

/// One row of the saved-history listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub key: String,
    pub problem_id: String,
    pub title: String,
    pub url: String,
    pub last_updated: DateTime<Utc>,
    pub message_count: usize,
}

pub const UNKNOWN_PROBLEM_TITLE: &str = "Unknown Problem";

impl HistorySummary {
    pub fn from_record(key: String, problem_id: String, record: &ConversationRecord) -> Self {
        let title = if record.problem_title.is_empty() {
            UNKNOWN_PROBLEM_TITLE.to_string()
        } else {
            record.problem_title.clone()
        };

        Self {
            key,
            problem_id,
            title,
            url: record.page_url.clone(),
            last_updated: record.last_updated,
            message_count: record.message_count(),
        }
    }
}
