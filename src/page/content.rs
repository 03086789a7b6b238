use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// Read-only view of the host page.
///
/// Implementations answer selector lookups against whatever they wrap; the
/// assistant never writes through this interface.
pub trait PageContent: Send + Sync {
    fn url(&self) -> &str;

    /// Text content of the first element matching `selector`, untrimmed.
    fn text_of(&self, selector: &str) -> Option<String>;

    /// Text of each `line_selector` element inside `container`, in order.
    fn lines_within(&self, container: &str, line_selector: &str) -> Vec<String>;

    fn textareas(&self) -> Vec<TextArea>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextArea {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorContent {
    /// Container selector, e.g. `.monaco-editor`.
    pub selector: String,
    /// Per-line selector inside the container, e.g. `.view-line`.
    pub line_selector: String,
    #[serde(default)]
    pub lines: Vec<String>,
}

/// Captured page state loaded from a YAML file.
///
/// ```yaml
/// url: https://leetcode.com/problems/two-sum/
/// elements:
///   h1: "1. Two Sum"
///   .question-content: "Given an array of integers..."
/// editor:
///   selector: .monaco-editor
///   line_selector: .view-line
///   lines: ["class Solution:", "    pass"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub elements: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<EditorContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub textareas: Vec<TextArea>,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_element(mut self, selector: impl Into<String>, text: impl Into<String>) -> Self {
        self.elements.insert(selector.into(), text.into());
        self
    }

    pub fn with_editor(mut self, editor: EditorContent) -> Self {
        self.editor = Some(editor);
        self
    }

    pub fn with_textarea(mut self, textarea: TextArea) -> Self {
        self.textareas.push(textarea);
        self
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse page snapshot")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read page snapshot: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Invalid page snapshot: {:?}", path))
    }
}

impl PageContent for PageSnapshot {
    fn url(&self) -> &str {
        &self.url
    }

    fn text_of(&self, selector: &str) -> Option<String> {
        if let Some(text) = self.elements.get(selector) {
            return Some(text.clone());
        }
        // The editor container itself also counts as an element.
        self.editor
            .as_ref()
            .filter(|e| e.selector == selector)
            .map(|e| e.lines.join("\n"))
    }

    fn lines_within(&self, container: &str, line_selector: &str) -> Vec<String> {
        match &self.editor {
            Some(editor) if editor.selector == container && editor.line_selector == line_selector => {
                editor.lines.clone()
            }
            _ => Vec::new(),
        }
    }

    fn textareas(&self) -> Vec<TextArea> {
        self.textareas.clone()
    }
}
