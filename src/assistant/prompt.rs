use crate::page::{PageContent, ProblemDetails};
use crate::storage::CodeTracker;
use crate::utils::truncate_chars;

use super::intent::{classify, has_code_block, wants_code_help, Intent};

pub const DEFAULT_DESCRIPTION_LIMIT: usize = 1000;

/// Page facts embedded into every prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptContext {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl From<ProblemDetails> for PromptContext {
    fn from(details: ProblemDetails) -> Self {
        Self {
            title: details.title,
            url: details.url,
            description: details.description,
        }
    }
}

/// Compose the full prompt and report the intent that shaped it.
pub fn build_prompt(context: &PromptContext, question: &str, description_limit: usize) -> (String, Intent) {
    let intent = classify(question);

    let mut prompt = format!(
        "Context: I'm looking at a coding problem with the title \"{}\".\n\
         URL: {}\n\
         Description (if available): {}...\n\
         Question: {}\n\
         Please provide a clear, concise answer focused on helping me understand and solve this specific coding problem.",
        context.title,
        context.url,
        truncate_chars(&context.description, description_limit),
        question,
    );

    if let Some(suffix) = intent.instruction_suffix() {
        prompt.push_str("\n\n");
        prompt.push_str(suffix);
    }

    (prompt, intent)
}

/// One enrichment applied to the user's question before it is sent.
#[async_trait::async_trait]
pub trait PromptStep: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(&self, question: String, page: &dyn PageContent) -> String;
}

/// Appends the user's editor code to questions asking for help with it.
pub struct AttachEditorCode {
    tracker: CodeTracker,
}

impl AttachEditorCode {
    pub fn new(tracker: CodeTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait::async_trait]
impl PromptStep for AttachEditorCode {
    fn name(&self) -> &'static str {
        "attach-editor-code"
    }

    async fn apply(&self, question: String, page: &dyn PageContent) -> String {
        if !wants_code_help(&question) || has_code_block(&question) {
            return question;
        }

        match self.tracker.current_or_saved(page).await {
            Ok(Some(snapshot)) if !snapshot.code.is_empty() => {
                format!("{question}\n\nHere's my current code:\n{}", snapshot.as_fenced_block())
            }
            Ok(_) => question,
            Err(e) => {
                tracing::warn!("Could not read editor code: {}", e);
                question
            }
        }
    }
}

/// Ordered list of [`PromptStep`]s.
#[derive(Default)]
pub struct PromptPipeline {
    steps: Vec<Box<dyn PromptStep>>,
}

impl PromptPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: impl PromptStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub async fn run(&self, question: String, page: &dyn PageContent) -> String {
        let mut current = question;
        for step in &self.steps {
            current = step.apply(current, page).await;
            tracing::trace!("prompt step {} applied", step.name());
        }
        current
    }
}
