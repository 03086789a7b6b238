use arboard::Clipboard;
use thiserror::Error;

/// Largest payload accepted for copying (10MB)
const MAX_CLIPBOARD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Nothing to copy")]
    Empty,

    #[error("Text too large for clipboard ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
}

/// Status label shown next to a copy button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Copied,
    Failed,
}

impl CopyStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CopyStatus::Copied => "Copied!",
            CopyStatus::Failed => "Error!",
        }
    }
}

impl<E> From<&Result<(), E>> for CopyStatus {
    fn from(result: &Result<(), E>) -> Self {
        match result {
            Ok(()) => CopyStatus::Copied,
            Err(_) => CopyStatus::Failed,
        }
    }
}

/// Clipboard backend (mocked in tests).
pub trait ClipboardProvider {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

pub struct SystemClipboard {
    clipboard: Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let clipboard = Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self { clipboard })
    }
}

impl ClipboardProvider for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

fn validate(text: &str) -> Result<(), ClipboardError> {
    if text.is_empty() {
        return Err(ClipboardError::Empty);
    }
    if text.len() > MAX_CLIPBOARD_BYTES {
        return Err(ClipboardError::TooLarge {
            size: text.len(),
            max: MAX_CLIPBOARD_BYTES,
        });
    }
    Ok(())
}

pub fn copy_with(provider: &mut dyn ClipboardProvider, text: &str) -> Result<(), ClipboardError> {
    validate(text)?;
    provider.set_text(text)
}

/// Copy to the system clipboard. Validation runs before the clipboard is
/// opened, so bad input fails the same way on headless machines.
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    validate(text)?;
    let mut clipboard = SystemClipboard::new()?;
    clipboard.set_text(text)
}
