use crate::models::{ChatMessage, ChatRole, MessageKind};

/// Handle to one rendered entry. Handles die when the transcript is
/// replaced, which is how late responses detect that their target is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(u64);

/// The floating chat panel, as seen by the session logic.
pub trait ChatPanel: Send {
    /// Whether the panel (and its message area) has been created.
    fn exists(&self) -> bool;

    fn is_visible(&self) -> bool;

    /// Create the panel if needed and make it visible.
    fn show(&mut self);

    fn hide(&mut self);

    fn transcript(&self) -> Vec<ChatMessage>;

    fn set_transcript(&mut self, messages: Vec<ChatMessage>);

    fn append(&mut self, message: ChatMessage) -> EntryId;

    /// Swap the entry behind `id`. Returns false when it no longer exists.
    fn replace(&mut self, id: EntryId, message: ChatMessage) -> bool;
}

/// Panel state without any rendering.
#[derive(Debug, Default)]
pub struct MemoryPanel {
    created: bool,
    visible: bool,
    entries: Vec<(EntryId, ChatMessage)>,
    next_id: u64,
}

impl MemoryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl ChatPanel for MemoryPanel {
    fn exists(&self) -> bool {
        self.created
    }

    fn is_visible(&self) -> bool {
        self.created && self.visible
    }

    fn show(&mut self) {
        self.created = true;
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn transcript(&self) -> Vec<ChatMessage> {
        self.entries.iter().map(|(_, m)| m.clone()).collect()
    }

    fn set_transcript(&mut self, messages: Vec<ChatMessage>) {
        let mut entries = Vec::with_capacity(messages.len());
        for message in messages {
            entries.push((self.allocate(), message));
        }
        self.entries = entries;
    }

    fn append(&mut self, message: ChatMessage) -> EntryId {
        let id = self.allocate();
        self.entries.push((id, message));
        id
    }

    fn replace(&mut self, id: EntryId, message: ChatMessage) -> bool {
        match self.entries.iter_mut().find(|(entry_id, _)| *entry_id == id) {
            Some(entry) => {
                entry.1 = message;
                true
            }
            None => false,
        }
    }
}

/// Panel that echoes every change to stdout.
#[derive(Debug, Default)]
pub struct TerminalPanel {
    inner: MemoryPanel,
}

impl TerminalPanel {
    pub fn new() -> Self {
        Self::default()
    }

    fn print(message: &ChatMessage) {
        match (message.role, message.kind) {
            (_, MessageKind::Typing) => println!("  ... {}", message.body),
            (_, MessageKind::Error) => println!("[!] {}", message.body),
            (ChatRole::User, _) => println!("You> {}", message.body),
            (ChatRole::Assistant, _) => println!("AI>  {}", message.body),
        }
    }
}

impl ChatPanel for TerminalPanel {
    fn exists(&self) -> bool {
        self.inner.exists()
    }

    fn is_visible(&self) -> bool {
        self.inner.is_visible()
    }

    fn show(&mut self) {
        self.inner.show();
    }

    fn hide(&mut self) {
        self.inner.hide();
        println!("(assistant panel closed)");
    }

    fn transcript(&self) -> Vec<ChatMessage> {
        self.inner.transcript()
    }

    fn set_transcript(&mut self, messages: Vec<ChatMessage>) {
        println!("──────── AI Coding Assistant ────────");
        for message in &messages {
            Self::print(message);
        }
        self.inner.set_transcript(messages);
    }

    fn append(&mut self, message: ChatMessage) -> EntryId {
        if self.inner.is_visible() {
            Self::print(&message);
        }
        self.inner.append(message)
    }

    fn replace(&mut self, id: EntryId, message: ChatMessage) -> bool {
        let replaced = self.inner.replace(id, message.clone());
        if replaced && self.inner.is_visible() {
            Self::print(&message);
        }
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_panel_does_not_exist() {
        let panel = MemoryPanel::new();
        assert!(!panel.exists());
        assert!(!panel.is_visible());
    }

    #[test]
    fn show_creates_and_hide_keeps_panel() {
        let mut panel = MemoryPanel::new();
        panel.show();
        panel.hide();

        assert!(panel.exists());
        assert!(!panel.is_visible());
    }

    #[test]
    fn replace_updates_live_entry() {
        let mut panel = MemoryPanel::new();
        panel.show();
        let id = panel.append(ChatMessage::typing());

        assert!(panel.replace(id, ChatMessage::assistant("done")));
        assert_eq!(panel.transcript(), vec![ChatMessage::assistant("done")]);
    }

    #[test]
    fn set_transcript_invalidates_old_handles() {
        let mut panel = MemoryPanel::new();
        panel.show();
        let id = panel.append(ChatMessage::typing());

        panel.set_transcript(vec![ChatMessage::assistant("other problem")]);

        assert!(!panel.replace(id, ChatMessage::assistant("late")));
        assert_eq!(panel.transcript(), vec![ChatMessage::assistant("other problem")]);
    }
}
