use std::sync::Arc;
use tracing::{debug, warn};

use super::panel::{ChatPanel, EntryId};
use super::reconciler::SessionReconciler;
use crate::assistant::{Assistant, GatewayError, PromptContext, PromptPipeline};
use crate::models::{ChatMessage, ProblemIdentifier, SessionState};
use crate::page::{extract_problem_details, PageContent};
use crate::storage::{SecretStore, StoreError};

/// A question waiting on the completion API.
///
/// Holds no borrow of the panel, so it can be dispatched on another task
/// while the page keeps changing underneath it.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    identifier: ProblemIdentifier,
    indicator: EntryId,
    api_key: String,
    question: String,
    context: PromptContext,
}

impl PendingRequest {
    pub fn identifier(&self) -> &ProblemIdentifier {
        &self.identifier
    }

    pub async fn dispatch(self, assistant: Arc<dyn Assistant>) -> CompletedRequest {
        let result = assistant.ask(&self.api_key, &self.question, &self.context).await;
        CompletedRequest {
            identifier: self.identifier,
            indicator: self.indicator,
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletedRequest {
    identifier: ProblemIdentifier,
    indicator: EntryId,
    result: Result<String, GatewayError>,
}

#[derive(Debug)]
pub enum SendStart {
    /// Blank input.
    Ignored,
    /// Failed before any request; the error is already in the panel.
    Failed,
    Pending(PendingRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Ignored,
    Answered,
    Failed,
    /// The panel or the problem changed while the request was out.
    Discarded,
}

/// Drives one question from input box to rendered answer.
pub struct ChatSession {
    reconciler: SessionReconciler,
    secrets: SecretStore,
    assistant: Arc<dyn Assistant>,
    pipeline: PromptPipeline,
}

impl ChatSession {
    pub fn new(
        reconciler: SessionReconciler,
        secrets: SecretStore,
        assistant: Arc<dyn Assistant>,
        pipeline: PromptPipeline,
    ) -> Self {
        Self {
            reconciler,
            secrets,
            assistant,
            pipeline,
        }
    }

    pub fn reconciler(&self) -> &SessionReconciler {
        &self.reconciler
    }

    pub fn assistant(&self) -> Arc<dyn Assistant> {
        self.assistant.clone()
    }

    /// Ask and wait for the answer in one go.
    pub async fn send(
        &self,
        state: &SessionState,
        page: &dyn PageContent,
        panel: &mut dyn ChatPanel,
        question: &str,
    ) -> Result<SendOutcome, StoreError> {
        match self.begin(state, page, panel, question).await? {
            SendStart::Ignored => Ok(SendOutcome::Ignored),
            SendStart::Failed => Ok(SendOutcome::Failed),
            SendStart::Pending(request) => {
                let completed = request.dispatch(self.assistant.clone()).await;
                self.finish(state, page, panel, completed).await
            }
        }
    }

    /// Render the question and a typing indicator, then prepare the request.
    pub async fn begin(
        &self,
        state: &SessionState,
        page: &dyn PageContent,
        panel: &mut dyn ChatPanel,
        question: &str,
    ) -> Result<SendStart, StoreError> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(SendStart::Ignored);
        }

        let identifier = state
            .current
            .clone()
            .unwrap_or_else(|| self.reconciler.resolve(page));
        let state = SessionState::tracking(identifier.clone()).with_panel_open(state.panel_open);

        panel.append(ChatMessage::user(question));
        self.reconciler.persist(&state, page, panel).await?;
        let indicator = panel.append(ChatMessage::typing());

        let api_key = match self.secrets.api_key().await {
            Ok(key) => key,
            Err(e) => {
                warn!("Could not read API key: {}", e);
                String::new()
            }
        };
        if api_key.trim().is_empty() {
            panel.replace(indicator, ChatMessage::error(GatewayError::MissingKey.to_string()));
            self.reconciler.persist(&state, page, panel).await?;
            return Ok(SendStart::Failed);
        }

        let question = self.pipeline.run(question.to_string(), page).await;
        Ok(SendStart::Pending(PendingRequest {
            identifier,
            indicator,
            api_key,
            question,
            context: extract_problem_details(page).into(),
        }))
    }

    /// Apply a finished request if its target is still on screen.
    pub async fn finish(
        &self,
        state: &SessionState,
        page: &dyn PageContent,
        panel: &mut dyn ChatPanel,
        completed: CompletedRequest,
    ) -> Result<SendOutcome, StoreError> {
        if !panel.exists() || !state.is_tracking(&completed.identifier) {
            debug!("Discarding response for {}: problem changed", completed.identifier);
            return Ok(SendOutcome::Discarded);
        }

        let (message, outcome) = match completed.result {
            Ok(answer) => (ChatMessage::assistant(answer), SendOutcome::Answered),
            Err(e) => (ChatMessage::error(format!("Error: {e}")), SendOutcome::Failed),
        };

        if !panel.replace(completed.indicator, message) {
            debug!("Discarding response for {}: indicator gone", completed.identifier);
            return Ok(SendOutcome::Discarded);
        }

        self.reconciler.persist(state, page, panel).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentifierResolver;
    use crate::models::MessageKind;
    use crate::page::PageSnapshot;
    use crate::session::panel::MemoryPanel;
    use crate::storage::{HistoryStore, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TWO_SUM: &str = "https://leetcode.com/problems/two-sum/";

    struct MockAssistant {
        reply: Result<String, GatewayError>,
        calls: AtomicUsize,
    }

    impl MockAssistant {
        fn replying(reply: Result<String, GatewayError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl Assistant for MockAssistant {
        async fn ask(
            &self,
            _api_key: &str,
            _question: &str,
            _context: &PromptContext,
        ) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    struct Fixture {
        chat: ChatSession,
        secrets: SecretStore,
        history: HistoryStore,
        page: PageSnapshot,
        panel: MemoryPanel,
        state: SessionState,
    }

    async fn create_fixture(assistant: Arc<MockAssistant>) -> Fixture {
        let backing = Arc::new(MemoryStore::new());
        let history = HistoryStore::new(backing.clone());
        let secrets = SecretStore::new(Arc::new(MemoryStore::new()));
        let reconciler = SessionReconciler::new(Arc::new(IdentifierResolver::default()), history.clone());
        let page = PageSnapshot::new(TWO_SUM)
            .with_element(".question-title", "1. Two Sum")
            .with_element(".problem-statement", "Find two numbers");

        let mut panel = MemoryPanel::new();
        let (state, _) = reconciler
            .open_panel(SessionState::idle(), &page, &mut panel)
            .await
            .unwrap();

        let chat = ChatSession::new(reconciler, secrets.clone(), assistant, PromptPipeline::new());
        Fixture {
            chat,
            secrets,
            history,
            page,
            panel,
            state,
        }
    }

    async fn saved_messages(fixture: &Fixture) -> Vec<ChatMessage> {
        fixture
            .history
            .load(&"two-sum".into())
            .await
            .unwrap()
            .map(|r| r.messages)
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn blank_question_is_ignored() {
        let assistant = MockAssistant::replying(Ok("unused".into()));
        let mut f = create_fixture(assistant.clone()).await;
        let before = f.panel.transcript();

        let outcome = f.chat.send(&f.state, &f.page, &mut f.panel, "   ").await.unwrap();

        assert_eq!(outcome, SendOutcome::Ignored);
        assert_eq!(f.panel.transcript(), before);
        assert_eq!(assistant.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_key_shows_error_without_calling_assistant() {
        let assistant = MockAssistant::replying(Ok("unused".into()));
        let mut f = create_fixture(assistant.clone()).await;

        let outcome = f.chat.send(&f.state, &f.page, &mut f.panel, "hint?").await.unwrap();

        assert_eq!(outcome, SendOutcome::Failed);
        assert_eq!(assistant.calls.load(Ordering::SeqCst), 0);
        let last = f.panel.transcript().pop().unwrap();
        assert_eq!(last.kind, MessageKind::Error);
        assert_eq!(last.body, GatewayError::MissingKey.to_string());
        assert_eq!(saved_messages(&f).await, f.panel.transcript());
    }

    #[tokio::test]
    async fn answer_replaces_indicator_and_is_saved() {
        let assistant = MockAssistant::replying(Ok("Use a hash map.".into()));
        let mut f = create_fixture(assistant.clone()).await;
        f.secrets.set_api_key("AIzaTest").await.unwrap();

        let outcome = f.chat.send(&f.state, &f.page, &mut f.panel, "best approach?").await.unwrap();

        assert_eq!(outcome, SendOutcome::Answered);
        let transcript = f.panel.transcript();
        let tail = &transcript[transcript.len() - 2..];
        assert_eq!(tail, &[ChatMessage::user("best approach?"), ChatMessage::assistant("Use a hash map.")]);
        assert!(transcript.iter().all(|m| m.kind != MessageKind::Typing));
        assert_eq!(saved_messages(&f).await, transcript);
    }

    #[tokio::test]
    async fn gateway_failure_becomes_error_message() {
        let assistant = MockAssistant::replying(Err(GatewayError::EmptyResponse));
        let mut f = create_fixture(assistant).await;
        f.secrets.set_api_key("AIzaTest").await.unwrap();

        let outcome = f.chat.send(&f.state, &f.page, &mut f.panel, "why?").await.unwrap();

        assert_eq!(outcome, SendOutcome::Failed);
        let last = f.panel.transcript().pop().unwrap();
        assert_eq!(last, ChatMessage::error("Error: No response generated"));
    }

    #[tokio::test]
    async fn response_after_navigation_is_discarded() {
        let assistant = MockAssistant::replying(Ok("late answer".into()));
        let mut f = create_fixture(assistant.clone()).await;
        f.secrets.set_api_key("AIzaTest").await.unwrap();

        let SendStart::Pending(request) = f
            .chat
            .begin(&f.state, &f.page, &mut f.panel, "hint?")
            .await
            .unwrap()
        else {
            panic!("expected a pending request");
        };

        let other = PageSnapshot::new("https://leetcode.com/problems/3sum/")
            .with_element(".question-title", "15. 3Sum")
            .with_element(".problem-statement", "Find triplets");
        let (state, _) = f
            .chat
            .reconciler()
            .on_page_changed(f.state.clone(), &other, &mut f.panel)
            .await
            .unwrap();
        let moved_on = f.panel.transcript();

        let completed = request.dispatch(f.chat.assistant()).await;
        let outcome = f.chat.finish(&state, &other, &mut f.panel, completed).await.unwrap();

        assert_eq!(outcome, SendOutcome::Discarded);
        assert_eq!(f.panel.transcript(), moved_on);
        let three_sum = f.history.load(&"3sum".into()).await.unwrap().unwrap();
        assert!(three_sum.messages.iter().all(|m| m.body != "late answer"));
    }
}
