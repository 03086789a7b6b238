mod chat;
mod code;
mod conversation;
mod identifier;
mod session;

pub use chat::{greeting, ChatMessage, ChatRole, MessageKind};
#[cfg(test)]
pub use chat::GREETING;
pub use code::CodeSnapshot;
pub use conversation::{ConversationRecord, HistorySummary};
pub use identifier::ProblemIdentifier;
pub use session::SessionState;
