use std::sync::Arc;
use tracing::{debug, info};

use super::panel::ChatPanel;
use crate::identity::IdentifierResolver;
use crate::models::{greeting, ConversationRecord, MessageKind, ProblemIdentifier, SessionState};
use crate::page::{extract_problem_details, find_anchor, PageContent};
use crate::storage::{HistoryStore, StoreError};

/// What a reconcile pass did to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelSync {
    /// Panel hidden or never created; nothing rendered.
    Skipped,
    /// A stored conversation was rendered.
    Restored,
    /// No usable history; a fresh greeting was rendered and saved.
    Greeted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// No anchor element on the page, so the assistant was not attached.
    NotInjected,
    /// Same identifier as before. No store access happened.
    Unchanged,
    /// Moved to a new identifier.
    Switched {
        from: Option<ProblemIdentifier>,
        to: ProblemIdentifier,
        panel: PanelSync,
    },
}

/// Keeps the panel and the history store in step with the page.
///
/// State is threaded through by value: every operation takes the current
/// [`SessionState`] and returns the next one.
#[derive(Clone)]
pub struct SessionReconciler {
    resolver: Arc<IdentifierResolver>,
    history: HistoryStore,
}

impl SessionReconciler {
    pub fn new(resolver: Arc<IdentifierResolver>, history: HistoryStore) -> Self {
        Self { resolver, history }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn resolve(&self, page: &dyn PageContent) -> ProblemIdentifier {
        self.resolver.resolve(page.url(), page)
    }

    /// Attach to a freshly loaded page.
    pub async fn on_injected(
        &self,
        state: SessionState,
        page: &dyn PageContent,
        panel: &mut dyn ChatPanel,
    ) -> Result<(SessionState, Reconciliation), StoreError> {
        if state.current.is_some() {
            return self.on_page_changed(state, page, panel).await;
        }
        self.attach(state, page, panel).await
    }

    /// Re-resolve after the page mutated or navigated.
    pub async fn on_page_changed(
        &self,
        state: SessionState,
        page: &dyn PageContent,
        panel: &mut dyn ChatPanel,
    ) -> Result<(SessionState, Reconciliation), StoreError> {
        let Some(previous) = state.current.clone() else {
            return self.attach(state, page, panel).await;
        };

        let id = self.resolve(page);
        if id == previous {
            return Ok((state, Reconciliation::Unchanged));
        }

        info!("Problem changed from {} to {}", previous, id);
        let sync = self.sync_panel(&id, page, panel).await?;
        let next = SessionState::tracking(id.clone()).with_panel_open(panel.is_visible());

        Ok((
            next,
            Reconciliation::Switched {
                from: Some(previous),
                to: id,
                panel: sync,
            },
        ))
    }

    pub async fn open_panel(
        &self,
        state: SessionState,
        page: &dyn PageContent,
        panel: &mut dyn ChatPanel,
    ) -> Result<(SessionState, PanelSync), StoreError> {
        let id = state.current.clone().unwrap_or_else(|| self.resolve(page));
        panel.show();
        let sync = self.sync_panel(&id, page, panel).await?;
        Ok((SessionState::tracking(id).with_panel_open(true), sync))
    }

    pub fn close_panel(&self, state: SessionState, panel: &mut dyn ChatPanel) -> SessionState {
        panel.hide();
        state.with_panel_open(false)
    }

    /// Drop the stored conversation and start over with a greeting.
    pub async fn clear_conversation(
        &self,
        state: SessionState,
        page: &dyn PageContent,
        panel: &mut dyn ChatPanel,
    ) -> Result<SessionState, StoreError> {
        let id = state.current.clone().unwrap_or_else(|| self.resolve(page));
        self.history.delete(&id).await?;

        if panel.exists() {
            panel.set_transcript(greeting(&extract_problem_details(page).title));
            self.save_transcript(&id, page, panel).await?;
        }

        Ok(SessionState::tracking(id).with_panel_open(state.panel_open))
    }

    /// Save the panel's transcript under the current identifier.
    ///
    /// Pending indicators are not written.
    pub async fn persist(
        &self,
        state: &SessionState,
        page: &dyn PageContent,
        panel: &dyn ChatPanel,
    ) -> Result<(), StoreError> {
        match (&state.current, panel.exists()) {
            (Some(id), true) => self.save_transcript(id, page, panel).await,
            _ => Ok(()),
        }
    }

    async fn attach(
        &self,
        state: SessionState,
        page: &dyn PageContent,
        panel: &mut dyn ChatPanel,
    ) -> Result<(SessionState, Reconciliation), StoreError> {
        let Some(anchor) = find_anchor(page) else {
            debug!("No anchor element on {}; assistant not attached", page.url());
            return Ok((state, Reconciliation::NotInjected));
        };

        let id = self.resolve(page);
        info!("Assistant attached at {} for problem {}", anchor, id);
        let sync = self.sync_panel(&id, page, panel).await?;
        let next = SessionState::tracking(id.clone()).with_panel_open(panel.is_visible());

        Ok((
            next,
            Reconciliation::Switched {
                from: None,
                to: id,
                panel: sync,
            },
        ))
    }

    async fn save_transcript(
        &self,
        id: &ProblemIdentifier,
        page: &dyn PageContent,
        panel: &dyn ChatPanel,
    ) -> Result<(), StoreError> {
        let messages = panel
            .transcript()
            .into_iter()
            .filter(|m| m.kind != MessageKind::Typing)
            .collect();
        let title = extract_problem_details(page).title;
        let record = ConversationRecord::new(page.url(), title).with_messages(messages);
        self.history.save(id, &record).await
    }

    async fn sync_panel(
        &self,
        id: &ProblemIdentifier,
        page: &dyn PageContent,
        panel: &mut dyn ChatPanel,
    ) -> Result<PanelSync, StoreError> {
        if !panel.is_visible() {
            return Ok(PanelSync::Skipped);
        }

        match self.history.load(id).await? {
            Some(record) if !record.messages.is_empty() => {
                debug!("Restoring {} messages for {}", record.messages.len(), id);
                panel.set_transcript(record.messages);
                Ok(PanelSync::Restored)
            }
            _ => {
                panel.set_transcript(greeting(&extract_problem_details(page).title));
                self.save_transcript(id, page, panel).await?;
                Ok(PanelSync::Greeted)
            }
        }
    }
}
