use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use minijinja::Environment;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::assistant::{escape_html, format_markdown};
use crate::models::{ChatRole, ConversationRecord};
use crate::utils::dash_non_alphanumeric;

const TEMPLATE_NAME: &str = "conversation.html";

const CONVERSATION_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>AI Coding Assistant - {{ title }}</title>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; padding: 20px; max-width: 800px; margin: 0 auto; }
        h1 { border-bottom: 1px solid #eee; padding-bottom: 10px; }
        .problem-link { margin-bottom: 20px; word-break: break-all; }
        .container { display: flex; flex-direction: column; }
        .message { padding: 10px 15px; border-radius: 8px; margin-bottom: 15px; max-width: 80%; }
        .ai-message { background-color: #f1f3f4; margin-right: auto; }
        .user-message { background-color: #e3f2fd; margin-left: auto; }
        pre { background-color: #f5f5f5; padding: 10px; border-radius: 4px; overflow-x: auto; }
        code { font-family: monospace; white-space: pre; }
        .timestamp { font-size: 0.8em; color: #777; margin-top: 5px; }
    </style>
</head>
<body>
    <h1>AI Coding Assistant - {{ title }}</h1>
    <div class="problem-link">
        <a href="{{ url | safe }}" target="_blank">{{ url | safe }}</a>
    </div>
    <div class="container">
{%- for message in messages %}
        <div class="message {{ message.class }}">
            <strong>{{ message.sender }}:</strong>
            <div>{{ message.html | safe }}</div>
        </div>
{%- endfor %}
    </div>
    <div class="timestamp">
        Exported on {{ exported_at }}
    </div>
</body>
</html>
"#;

#[derive(Debug, Serialize)]
struct RenderedMessage {
    class: &'static str,
    sender: &'static str,
    html: String,
}

/// Render a conversation as a standalone HTML page.
///
/// Only normal messages are included; typing indicators, errors and notes
/// are left out.
pub fn render_conversation(record: &ConversationRecord, exported_at: DateTime<Utc>) -> Result<String> {
    let mut env = Environment::new();
    env.add_template(TEMPLATE_NAME, CONVERSATION_TEMPLATE)
        .context("Failed to add export template")?;
    let template = env
        .get_template(TEMPLATE_NAME)
        .context("Failed to get export template")?;

    let messages: Vec<RenderedMessage> = record
        .messages
        .iter()
        .filter(|m| m.is_conversational())
        .map(|m| match m.role {
            ChatRole::Assistant => RenderedMessage {
                class: "ai-message",
                sender: m.role.label(),
                html: format_markdown(&m.body),
            },
            ChatRole::User => RenderedMessage {
                class: "user-message",
                sender: m.role.label(),
                html: escape_html(&m.body).replace('\n', "<br>"),
            },
        })
        .collect();

    let exported_at = exported_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string();

    template
        .render(minijinja::context! {
            title => record.problem_title.as_str(),
            url => escape_html(&record.page_url),
            messages => messages,
            exported_at => exported_at,
        })
        .context("Failed to render export")
}

/// `ai-coding-<title with non-alphanumerics dashed>-<unix millis>.html`
pub fn export_file_name(title: &str, exported_at: DateTime<Utc>) -> String {
    format!(
        "ai-coding-{}-{}.html",
        dash_non_alphanumeric(title),
        exported_at.timestamp_millis()
    )
}

/// Render and write the export into `dir`, returning the file path.
pub async fn write_export(dir: &Path, record: &ConversationRecord) -> Result<PathBuf> {
    let now = Utc::now();
    let html = render_conversation(record, now)?;
    let path = dir.join(export_file_name(&record.problem_title, now));

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create export directory: {:?}", dir))?;
    tokio::fs::write(&path, html)
        .await
        .with_context(|| format!("Failed to write export: {:?}", path))?;

    tracing::info!("Conversation exported to {}", path.display());
    Ok(path)
}
