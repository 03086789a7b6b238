use serde::{Deserialize, Serialize};

/// Who authored a chat entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "AI",
        }
    }
}

/// Presentation class of a chat entry.
///
/// Only `Normal` entries are part of the conversation proper; typing
/// indicators and errors are excluded from counts and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Normal,
    Typing,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[serde(default)]
    pub kind: MessageKind,
    pub body: String,
}

pub const GREETING: &str = "Hello! I'm your AI coding assistant. Ask me about this problem.";
pub const TYPING_PLACEHOLDER: &str = "Thinking...";

impl ChatMessage {
    pub fn user(body: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            kind: MessageKind::Normal,
            body: body.into(),
        }
    }

    pub fn assistant(body: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            kind: MessageKind::Normal,
            body: body.into(),
        }
    }

    pub fn typing() -> Self {
        Self {
            role: ChatRole::Assistant,
            kind: MessageKind::Typing,
            body: TYPING_PLACEHOLDER.to_string(),
        }
    }

    pub fn error(body: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            kind: MessageKind::Error,
            body: body.into(),
        }
    }

    pub fn is_conversational(&self) -> bool {
        self.kind == MessageKind::Normal
    }
}

/// Opening transcript shown when a problem has no saved conversation.
pub fn greeting(problem_title: &str) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::assistant(GREETING)];
    if !problem_title.is_empty() {
        messages.push(ChatMessage::assistant(format!(
            "I see you're working on \"{problem_title}\". How can I help you with this problem?"
        )));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_without_title_has_single_message() {
        let messages = greeting("");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body, GREETING);
    }

    #[test]
    fn greeting_with_title_mentions_problem() {
        let messages = greeting("Two Sum");
        assert_eq!(messages.len(), 2);
        assert!(messages[1].body.contains("\"Two Sum\""));
        assert!(messages.iter().all(|m| m.role == ChatRole::Assistant));
    }

    #[test]
    fn only_normal_messages_are_conversational() {
        assert!(ChatMessage::user("hi").is_conversational());
        assert!(ChatMessage::assistant("hello").is_conversational());
        assert!(!ChatMessage::typing().is_conversational());
        assert!(!ChatMessage::error("boom").is_conversational());
    }

    #[test]
    fn message_kind_defaults_to_normal_when_missing() {
        let json = r#"{"role":"user","body":"hello"}"#;
        let message: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.kind, MessageKind::Normal);
    }

    #[test]
    fn message_serializes_snake_case() {
        let json = serde_json::to_string(&ChatMessage::typing()).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
        assert!(json.contains("\"kind\":\"typing\""));
    }
}
