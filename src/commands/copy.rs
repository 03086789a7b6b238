use anyhow::{bail, Result};
use clap::Args as ClapArgs;

use crate::assistant::extract_code_blocks;
use crate::clipboard::{copy_to_clipboard, CopyStatus};
use crate::commands::common::{self, AppContext, TargetArgs};
use crate::config::Config;
use crate::models::{ChatMessage, ChatRole};

#[derive(ClapArgs)]
pub struct Args {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Copy the Nth code block (1-based) instead of the whole answer
    #[arg(long)]
    pub block: Option<usize>,
}

/// Text of the latest answer, or of one of its code blocks.
pub fn copy_text(messages: &[ChatMessage], block: Option<usize>) -> Option<String> {
    let answer = messages
        .iter()
        .rev()
        .find(|m| m.role == ChatRole::Assistant && m.is_conversational())?;

    match block {
        None => Some(answer.body.clone()),
        Some(n) => extract_code_blocks(&answer.body).into_iter().nth(n.checked_sub(1)?),
    }
}

pub async fn execute(args: Args, config: Config) -> Result<()> {
    let app = AppContext::open(config)?;
    let id = args.target.identifier(&app).await?;
    let record = common::load_record(&app, &id).await?;

    let Some(text) = copy_text(&record.messages, args.block) else {
        bail!("Nothing to copy for {}", id);
    };

    let result = copy_to_clipboard(&text);
    if let Err(e) = &result {
        tracing::warn!("Copy failed: {}", e);
    }
    println!("{}", CopyStatus::from(&result).label());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript() -> Vec<ChatMessage> {
        vec![
            ChatMessage::assistant("Hello!"),
            ChatMessage::user("show code"),
            ChatMessage::assistant("First:\n```rust\nlet a = 1;\n```\nSecond:\n```\nlet b = 2;\n```"),
            ChatMessage::error("Error: No response generated"),
        ]
    }

    #[test]
    fn copies_latest_answer_skipping_errors() {
        let text = copy_text(&transcript(), None).unwrap();
        assert!(text.starts_with("First:"));
    }

    #[test]
    fn copies_numbered_code_block() {
        assert_eq!(copy_text(&transcript(), Some(2)).as_deref(), Some("let b = 2;"));
        assert_eq!(copy_text(&transcript(), Some(3)), None);
        assert_eq!(copy_text(&transcript(), Some(0)), None);
    }

    #[test]
    fn nothing_to_copy_without_answers() {
        assert_eq!(copy_text(&[ChatMessage::user("hi")], None), None);
    }
}
