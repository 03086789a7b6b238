use anyhow::{bail, Result};
use clap::Args as ClapArgs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assistant::{AttachEditorCode, PromptPipeline};
use crate::config::Config;
use crate::identity::IdentifierResolver;
use crate::models::{ConversationRecord, ProblemIdentifier};
use crate::page::PageSnapshot;
use crate::session::{ChatSession, SessionReconciler};
use crate::storage::{CodeTracker, HistoryStore, JsonFileStore, SecretStore};

/// Stores and services shared by every command.
pub struct AppContext {
    pub config: Config,
    pub resolver: Arc<IdentifierResolver>,
    pub history: HistoryStore,
    pub secrets: SecretStore,
    pub tracker: CodeTracker,
}

impl AppContext {
    pub fn open(config: Config) -> Result<Self> {
        let resolver = Arc::new(config.resolver()?);
        let store = Arc::new(JsonFileStore::new(config.store_path()));
        let secrets = SecretStore::new(Arc::new(JsonFileStore::new(config.secrets_path())));
        tracing::debug!("Using store {:?}", store.path());

        Ok(Self {
            history: HistoryStore::with_prefix(store.clone(), config.history_prefix.clone()),
            tracker: CodeTracker::new(store, resolver.clone()),
            secrets,
            resolver,
            config,
        })
    }

    pub fn reconciler(&self) -> SessionReconciler {
        SessionReconciler::new(self.resolver.clone(), self.history.clone())
    }

    pub fn chat_session(&self) -> ChatSession {
        let pipeline = PromptPipeline::new().with_step(AttachEditorCode::new(self.tracker.clone()));
        ChatSession::new(
            self.reconciler(),
            self.secrets.clone(),
            Arc::new(self.config.gateway()),
            pipeline,
        )
    }

    pub fn resolve(&self, page: &PageSnapshot) -> ProblemIdentifier {
        self.resolver.resolve(&page.url, page)
    }
}

/// Which stored conversation a command acts on.
#[derive(ClapArgs)]
pub struct TargetArgs {
    /// Page snapshot to resolve the problem from
    #[arg(long, conflicts_with = "id")]
    pub page: Option<PathBuf>,

    /// Problem identifier, as printed by `resolve` or `history list`
    #[arg(long)]
    pub id: Option<String>,
}

impl TargetArgs {
    pub async fn identifier(&self, app: &AppContext) -> Result<ProblemIdentifier> {
        match (&self.page, &self.id) {
            (_, Some(id)) => Ok(ProblemIdentifier::new(id.clone())),
            (Some(path), None) => Ok(app.resolve(&load_page(path).await?)),
            (None, None) => bail!("Specify a conversation with --page or --id"),
        }
    }
}

pub async fn load_page(path: &Path) -> Result<PageSnapshot> {
    PageSnapshot::load(path).await
}

pub async fn load_record(app: &AppContext, id: &ProblemIdentifier) -> Result<ConversationRecord> {
    match app.history.load(id).await? {
        Some(record) => Ok(record),
        None => bail!("No conversation saved for {}", id),
    }
}
