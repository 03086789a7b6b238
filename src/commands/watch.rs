use anyhow::Result;
use clap::Args as ClapArgs;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::clipboard::{copy_to_clipboard, ClipboardError, CopyStatus};
use crate::commands::common::AppContext;
use crate::commands::copy::copy_text;
use crate::config::{Config, WatchConfig};
use crate::export::write_export;
use crate::models::{ConversationRecord, SessionState};
use crate::page::{extract_problem_details, PageSnapshot};
use crate::session::{
    ChatPanel, ChatSession, CompletedRequest, PageObserver, Reconciliation, SendOutcome, SendStart,
    SnapshotWatcher, TerminalPanel,
};

const HELP: &str = "Commands: /open /close /clear /export /copy [N] /help /quit. Anything else is sent as a question.";

#[derive(ClapArgs)]
pub struct Args {
    /// Page snapshot file (YAML), re-read whenever it changes
    pub page: PathBuf,
}

enum Input {
    Open,
    Close,
    Clear,
    Export,
    Copy(Option<usize>),
    Help,
    Quit,
    Question(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("/open") => Input::Open,
        Some("/close") => Input::Close,
        Some("/clear") => Input::Clear,
        Some("/export") => Input::Export,
        Some("/copy") => Input::Copy(parts.next().and_then(|n| n.parse().ok())),
        Some("/help") => Input::Help,
        Some("/quit") | Some("/exit") => Input::Quit,
        _ => Input::Question(line.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnapshotReason {
    Periodic,
    Edit,
}

impl SnapshotReason {
    fn label(&self) -> &'static str {
        match self {
            SnapshotReason::Periodic => "periodic",
            SnapshotReason::Edit => "edit",
        }
    }
}

/// When the next code snapshot is due: a fixed interval, plus a debounced
/// one after the last editor change.
struct SnapshotSchedule {
    interval: Duration,
    debounce: Duration,
    next_periodic: Instant,
    edit_deadline: Option<Instant>,
}

impl SnapshotSchedule {
    fn new(config: &WatchConfig) -> Self {
        let interval = config.snapshot_interval();
        Self {
            interval,
            debounce: config.edit_debounce(),
            next_periodic: Instant::now() + interval,
            edit_deadline: None,
        }
    }

    /// Every edit pushes the debounced snapshot back.
    fn note_edit(&mut self) {
        self.edit_deadline = Some(Instant::now() + self.debounce);
    }

    fn next_due(&self) -> Instant {
        match self.edit_deadline {
            Some(deadline) => deadline.min(self.next_periodic),
            None => self.next_periodic,
        }
    }

    /// Pops one snapshot that is due at `now`, if any.
    fn take_due(&mut self, now: Instant) -> Option<SnapshotReason> {
        if let Some(deadline) = self.edit_deadline {
            if deadline <= now {
                self.edit_deadline = None;
                return Some(SnapshotReason::Edit);
            }
        }
        if self.next_periodic <= now {
            self.next_periodic += self.interval;
            if self.next_periodic <= now {
                self.next_periodic = now + self.interval;
            }
            return Some(SnapshotReason::Periodic);
        }
        None
    }
}

/// Everything the loop mutates.
struct WatchState {
    app: AppContext,
    chat: ChatSession,
    panel: TerminalPanel,
    session: SessionState,
    page: Option<PageSnapshot>,
    in_flight: JoinSet<CompletedRequest>,
}

impl WatchState {
    async fn on_page(&mut self, snapshot: PageSnapshot) {
        let state = std::mem::take(&mut self.session);
        match self
            .chat
            .reconciler()
            .on_page_changed(state.clone(), &snapshot, &mut self.panel)
            .await
        {
            Ok((next, outcome)) => {
                if let Reconciliation::Switched { to, .. } = &outcome {
                    println!("── now tracking {} ──", to);
                }
                debug!("Reconcile: {:?}", outcome);
                self.session = next;
            }
            Err(e) => {
                error!("Failed to reconcile page: {}", e);
                self.session = state;
            }
        }
        self.page = Some(snapshot);
    }

    async fn save_code(&self, reason: SnapshotReason) {
        let Some(page) = &self.page else {
            return;
        };
        match self.app.tracker.save_current_code(page).await {
            Ok(Some(snapshot)) => debug!(
                "Code snapshot ({}) saved for {}",
                reason.label(),
                snapshot.problem_id
            ),
            Ok(None) => debug!("No editor code on page ({})", reason.label()),
            Err(e) => warn!("Failed to save code snapshot: {}", e),
        }
    }

    /// Returns false when the loop should stop.
    async fn on_input(&mut self, input: Input) -> bool {
        let Some(page) = self.page.clone() else {
            if matches!(input, Input::Quit) {
                return false;
            }
            println!("Waiting for the page snapshot...");
            return true;
        };

        let reconciler = self.chat.reconciler().clone();
        match input {
            Input::Open => {
                let state = std::mem::take(&mut self.session);
                match reconciler.open_panel(state.clone(), &page, &mut self.panel).await {
                    Ok((next, _)) => self.session = next,
                    Err(e) => {
                        error!("Failed to open panel: {}", e);
                        self.session = state;
                    }
                }
            }
            Input::Close => {
                let state = std::mem::take(&mut self.session);
                self.session = reconciler.close_panel(state, &mut self.panel);
            }
            Input::Clear => {
                let state = std::mem::take(&mut self.session);
                match reconciler.clear_conversation(state.clone(), &page, &mut self.panel).await {
                    Ok(next) => self.session = next,
                    Err(e) => {
                        error!("Failed to clear conversation: {}", e);
                        self.session = state;
                    }
                }
            }
            Input::Export => {
                let record = ConversationRecord::new(&page.url, extract_problem_details(&page).title)
                    .with_messages(self.panel.transcript());
                match write_export(&self.app.config.exports_dir(), &record).await {
                    Ok(path) => println!("Conversation exported successfully: {}", path.display()),
                    Err(e) => println!("Export failed: {:#}", e),
                }
            }
            Input::Copy(block) => self.copy(block),
            Input::Help => println!("{}", HELP),
            Input::Quit => return false,
            Input::Question(question) => self.ask(&page, &question).await,
        }
        true
    }

    fn copy(&self, block: Option<usize>) {
        let result = match copy_text(&self.panel.transcript(), block) {
            Some(text) => copy_to_clipboard(&text),
            None => Err(ClipboardError::Empty),
        };
        if let Err(e) = &result {
            warn!("Copy failed: {}", e);
        }
        println!("{}", CopyStatus::from(&result).label());
    }

    async fn ask(&mut self, page: &PageSnapshot, question: &str) {
        if !self.panel.is_visible() {
            let state = std::mem::take(&mut self.session);
            match self.chat.reconciler().open_panel(state.clone(), page, &mut self.panel).await {
                Ok((next, _)) => self.session = next,
                Err(e) => {
                    error!("Failed to open panel: {}", e);
                    self.session = state;
                    return;
                }
            }
        }

        match self.chat.begin(&self.session, page, &mut self.panel, question).await {
            Ok(SendStart::Pending(request)) => {
                debug!("Dispatching question for {}", request.identifier());
                self.in_flight.spawn(request.dispatch(self.chat.assistant()));
            }
            Ok(SendStart::Ignored) | Ok(SendStart::Failed) => {}
            Err(e) => error!("Failed to record question: {}", e),
        }
    }

    async fn on_completed(&mut self, completed: CompletedRequest) {
        let Some(page) = self.page.clone() else {
            return;
        };
        match self.chat.finish(&self.session, &page, &mut self.panel, completed).await {
            Ok(SendOutcome::Discarded) => debug!("Late response dropped"),
            Ok(_) => {}
            Err(e) => error!("Failed to save response: {}", e),
        }
    }
}

pub async fn execute(args: Args, config: Config) -> Result<()> {
    let app = AppContext::open(config)?;
    let watch_config = app.config.watch.clone();

    let mut watcher = SnapshotWatcher::new(args.page.clone()).with_poll_interval(watch_config.poll_interval());
    let mut changes = watcher.on_page_changed();
    let watch_task = watcher.spawn();

    let mut state = WatchState {
        chat: app.chat_session(),
        app,
        panel: TerminalPanel::new(),
        session: SessionState::idle(),
        page: None,
        in_flight: JoinSet::new(),
    };

    let mut schedule = SnapshotSchedule::new(&watch_config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    info!("Watching {:?}", args.page);
    println!("{}", HELP);

    loop {
        tokio::select! {
            event = changes.next() => {
                let Some(event) = event else {
                    break;
                };
                if event.code_changed {
                    schedule.note_edit();
                }
                state.on_page(event.snapshot).await;
            }
            _ = sleep_until(schedule.next_due()) => {
                while let Some(reason) = schedule.take_due(Instant::now()) {
                    state.save_code(reason).await;
                }
            }
            Some(joined) = state.in_flight.join_next(), if !state.in_flight.is_empty() => {
                match joined {
                    Ok(completed) => state.on_completed(completed).await,
                    Err(e) => error!("Request task failed: {}", e),
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !state.on_input(parse_input(&line)).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    watch_task.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::{Assistant, GatewayError, PromptContext, PromptPipeline};
    use crate::models::ChatMessage;
    use std::sync::Arc;
    use tempfile::TempDir;

    const TWO_SUM: &str = "https://leetcode.com/problems/two-sum/";
    const THREE_SUM: &str = "https://leetcode.com/problems/3sum/";

    fn watch_config() -> WatchConfig {
        WatchConfig {
            poll_interval_ms: 500,
            snapshot_interval_secs: 30,
            edit_debounce_ms: 1000,
        }
    }

    #[test]
    fn parse_input_recognizes_commands() {
        assert!(matches!(parse_input(" /open "), Input::Open));
        assert!(matches!(parse_input("/copy 2"), Input::Copy(Some(2))));
        assert!(matches!(parse_input("/copy x"), Input::Copy(None)));
        assert!(matches!(parse_input("/exit"), Input::Quit));
        assert!(matches!(parse_input("why O(n)?"), Input::Question(q) if q == "why O(n)?"));
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_snapshot_fires_every_interval() {
        let mut schedule = SnapshotSchedule::new(&watch_config());

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(schedule.take_due(Instant::now()), None);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(schedule.take_due(Instant::now()), Some(SnapshotReason::Periodic));
        assert_eq!(schedule.take_due(Instant::now()), None);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(schedule.take_due(Instant::now()), Some(SnapshotReason::Periodic));
    }

    #[tokio::test(start_paused = true)]
    async fn edit_schedules_exactly_one_debounced_snapshot() {
        let mut schedule = SnapshotSchedule::new(&watch_config());
        schedule.note_edit();
        assert_eq!(schedule.next_due(), Instant::now() + Duration::from_secs(1));

        tokio::time::advance(Duration::from_millis(999)).await;
        assert_eq!(schedule.take_due(Instant::now()), None);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(schedule.take_due(Instant::now()), Some(SnapshotReason::Edit));
        assert_eq!(schedule.take_due(Instant::now()), None);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(schedule.take_due(Instant::now()), None);
    }

    #[tokio::test(start_paused = true)]
    async fn further_edits_push_deadline_back() {
        let mut schedule = SnapshotSchedule::new(&watch_config());
        schedule.note_edit();
        tokio::time::advance(Duration::from_millis(600)).await;
        schedule.note_edit();
        tokio::time::advance(Duration::from_millis(600)).await;

        assert_eq!(schedule.take_due(Instant::now()), None);

        tokio::time::advance(Duration::from_millis(400)).await;
        assert_eq!(schedule.take_due(Instant::now()), Some(SnapshotReason::Edit));
    }

    #[tokio::test(start_paused = true)]
    async fn edit_does_not_delay_periodic_snapshot() {
        let mut schedule = SnapshotSchedule::new(&watch_config());
        tokio::time::advance(Duration::from_millis(29_500)).await;
        schedule.note_edit();

        assert_eq!(schedule.next_due(), Instant::now() + Duration::from_millis(500));
        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(schedule.take_due(Instant::now()), Some(SnapshotReason::Periodic));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(schedule.take_due(Instant::now()), Some(SnapshotReason::Edit));
    }

    struct EchoAssistant;

    #[async_trait::async_trait]
    impl Assistant for EchoAssistant {
        async fn ask(
            &self,
            _api_key: &str,
            question: &str,
            _context: &PromptContext,
        ) -> Result<String, GatewayError> {
            Ok(format!("answer to {}", question))
        }
    }

    fn page(url: &str, title: &str) -> PageSnapshot {
        PageSnapshot::new(url)
            .with_element(".question-title", title)
            .with_element(".problem-statement", "Solve it")
    }

    async fn create_watch_state(temp: &TempDir) -> WatchState {
        let config = Config::default()
            .with_data_dir(temp.path().join("data"))
            .with_config_dir(temp.path().join("config"));
        let app = AppContext::open(config).unwrap();
        app.secrets.set_api_key("AIzaTestKey").await.unwrap();
        let chat = ChatSession::new(
            app.reconciler(),
            app.secrets.clone(),
            Arc::new(EchoAssistant),
            PromptPipeline::new(),
        );

        WatchState {
            app,
            chat,
            panel: TerminalPanel::new(),
            session: SessionState::idle(),
            page: None,
            in_flight: JoinSet::new(),
        }
    }

    async fn drain(state: &mut WatchState) {
        while let Some(joined) = state.in_flight.join_next().await {
            state.on_completed(joined.unwrap()).await;
        }
    }

    #[tokio::test]
    async fn completed_request_is_applied_and_saved() {
        let temp = TempDir::new().unwrap();
        let mut state = create_watch_state(&temp).await;
        state.on_page(page(TWO_SUM, "1. Two Sum")).await;

        assert!(state.on_input(parse_input("hint please")).await);
        assert_eq!(state.in_flight.len(), 1);
        drain(&mut state).await;

        assert_eq!(
            state.panel.transcript().last(),
            Some(&ChatMessage::assistant("answer to hint please"))
        );
        let saved = state.app.history.load(&"two-sum".into()).await.unwrap().unwrap();
        assert_eq!(saved.messages, state.panel.transcript());
    }

    #[tokio::test]
    async fn completed_request_after_navigation_is_dropped() {
        let temp = TempDir::new().unwrap();
        let mut state = create_watch_state(&temp).await;
        state.on_page(page(TWO_SUM, "1. Two Sum")).await;
        state.on_input(parse_input("hint please")).await;

        state.on_page(page(THREE_SUM, "15. 3Sum")).await;
        drain(&mut state).await;

        assert!(state
            .panel
            .transcript()
            .iter()
            .all(|m| !m.body.contains("answer to")));
        let three_sum = state.app.history.load(&"3sum".into()).await.unwrap().unwrap();
        assert!(three_sum.messages.iter().all(|m| !m.body.contains("answer to")));
    }

    #[tokio::test]
    async fn input_before_first_snapshot_waits() {
        let temp = TempDir::new().unwrap();
        let mut state = create_watch_state(&temp).await;

        assert!(state.on_input(parse_input("hello")).await);
        assert!(state.in_flight.is_empty());
        assert!(!state.on_input(parse_input("/quit")).await);
    }
}
