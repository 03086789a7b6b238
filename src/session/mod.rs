mod chat;
mod observer;
mod panel;
mod reconciler;

pub use chat::{ChatSession, CompletedRequest, SendOutcome, SendStart};
pub use observer::{PageObserver, SnapshotWatcher};
pub use panel::{ChatPanel, MemoryPanel, TerminalPanel};
pub use reconciler::{PanelSync, Reconciliation, SessionReconciler};
