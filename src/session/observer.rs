use anyhow::{Context, Result};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::page::{extract_code, PageSnapshot};
use crate::utils::content_hash;

/// Default interval between page snapshot reads (500ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct PageEvent {
    pub snapshot: PageSnapshot,
    /// The editor contents differ from the previous event.
    pub code_changed: bool,
}

pub type PageChanges = UnboundedReceiver<PageEvent>;

/// Source of page mutation notifications.
pub trait PageObserver {
    /// Register a subscriber. Every subscriber sees every event.
    fn on_page_changed(&mut self) -> PageChanges;
}

/// Watches a YAML page snapshot file and reports when it changes.
pub struct SnapshotWatcher {
    path: PathBuf,
    poll_interval: Duration,
    subscribers: Vec<UnboundedSender<PageEvent>>,
    last_page_hash: Option<u64>,
    last_code_hash: Option<u64>,
}

impl SnapshotWatcher {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            poll_interval: DEFAULT_POLL_INTERVAL,
            subscribers: Vec::new(),
            last_page_hash: None,
            last_code_hash: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Read the file once and notify subscribers if it changed.
    pub async fn poll_once(&mut self) -> Result<Option<PageEvent>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read page snapshot: {}", self.path.display()))?;

        let page_hash = content_hash(&raw);
        if self.last_page_hash == Some(page_hash) {
            trace!("poll_once: page unchanged");
            return Ok(None);
        }

        let snapshot = PageSnapshot::parse(&raw)
            .with_context(|| format!("Failed to parse page snapshot: {}", self.path.display()))?;
        let code_hash = content_hash(&extract_code(&snapshot).unwrap_or_default());
        let code_changed = self.last_code_hash.is_some_and(|h| h != code_hash);

        self.last_page_hash = Some(page_hash);
        self.last_code_hash = Some(code_hash);

        let event = PageEvent {
            snapshot,
            code_changed,
        };
        self.publish(&event);
        Ok(Some(event))
    }

    fn publish(&mut self, event: &PageEvent) {
        self.subscribers
            .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
        debug!(
            "Page change published to {} subscriber(s) (code changed: {})",
            self.subscribers.len(),
            event.code_changed
        );
    }

    /// Poll in the background until every subscriber has gone away.
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            loop {
                ticker.tick().await;
                if let Err(e) = self.poll_once().await {
                    warn!("Page watch: {:#}", e);
                }
                if self.subscribers.is_empty() {
                    debug!("Page watch stopped: no subscribers left");
                    break;
                }
            }
        })
    }
}

impl PageObserver for SnapshotWatcher {
    fn on_page_changed(&mut self) -> PageChanges {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::TempDir;

    const TWO_SUM: &str = r#"
url: https://leetcode.com/problems/two-sum/
elements:
  .question-title: 1. Two Sum
  .source: "x = 1"
"#;

    const TWO_SUM_EDITED: &str = r#"
url: https://leetcode.com/problems/two-sum/
elements:
  .question-title: 1. Two Sum
  .source: "x = 2"
"#;

    const THREE_SUM: &str = r#"
url: https://leetcode.com/problems/3sum/
elements:
  .question-title: 15. 3Sum
  .source: "x = 2"
"#;

    fn setup(initial: &str) -> (SnapshotWatcher, TempDir) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("page.yaml");
        std::fs::write(&path, initial).unwrap();
        (SnapshotWatcher::new(path), tmp)
    }

    fn rewrite(tmp: &TempDir, content: &str) {
        std::fs::write(tmp.path().join("page.yaml"), content).unwrap();
    }

    #[tokio::test]
    async fn first_poll_publishes_snapshot() {
        let (mut watcher, _tmp) = setup(TWO_SUM);
        let mut changes = watcher.on_page_changed();

        let event = watcher.poll_once().await.unwrap().unwrap();

        assert!(!event.code_changed);
        let received = changes.next().await.unwrap();
        assert_eq!(received.snapshot.url, "https://leetcode.com/problems/two-sum/");
    }

    #[tokio::test]
    async fn unchanged_file_publishes_nothing() {
        let (mut watcher, _tmp) = setup(TWO_SUM);
        watcher.poll_once().await.unwrap();

        assert!(watcher.poll_once().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn editor_edit_is_flagged() {
        let (mut watcher, tmp) = setup(TWO_SUM);
        watcher.poll_once().await.unwrap();

        rewrite(&tmp, TWO_SUM_EDITED);
        let event = watcher.poll_once().await.unwrap().unwrap();
        assert!(event.code_changed);

        rewrite(&tmp, THREE_SUM);
        let event = watcher.poll_once().await.unwrap().unwrap();
        assert!(!event.code_changed);
        assert_eq!(event.snapshot.url, "https://leetcode.com/problems/3sum/");
    }

    #[tokio::test]
    async fn every_subscriber_receives_events() {
        let (mut watcher, _tmp) = setup(TWO_SUM);
        let mut first = watcher.on_page_changed();
        let mut second = watcher.on_page_changed();

        watcher.poll_once().await.unwrap();

        assert!(first.next().await.is_some());
        assert!(second.next().await.is_some());
    }

    #[tokio::test]
    async fn dropped_subscriber_is_pruned() {
        let (mut watcher, _tmp) = setup(TWO_SUM);
        drop(watcher.on_page_changed());

        watcher.poll_once().await.unwrap();

        assert!(watcher.subscribers.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let mut watcher = SnapshotWatcher::new(tmp.path().join("absent.yaml"));

        assert!(watcher.poll_once().await.is_err());
    }
}
