use anyhow::{bail, Result};
use clap::Args as ClapArgs;
use std::path::PathBuf;

use crate::commands::common::{self, AppContext};
use crate::config::Config;
use crate::models::SessionState;
use crate::session::{ChatPanel, MemoryPanel, SendOutcome};

#[derive(ClapArgs)]
pub struct Args {
    /// Page snapshot (YAML)
    #[arg(long)]
    pub page: PathBuf,

    /// The question
    #[arg(required = true, trailing_var_arg = true)]
    pub question: Vec<String>,
}

pub async fn execute(args: Args, config: Config) -> Result<()> {
    let app = AppContext::open(config)?;
    let page = common::load_page(&args.page).await?;
    let chat = app.chat_session();

    let mut panel = MemoryPanel::new();
    let (state, _) = chat
        .reconciler()
        .open_panel(SessionState::idle(), &page, &mut panel)
        .await?;

    let question = args.question.join(" ");
    match chat.send(&state, &page, &mut panel, &question).await? {
        SendOutcome::Ignored => bail!("Question is empty"),
        SendOutcome::Discarded => bail!("Response discarded"),
        SendOutcome::Answered | SendOutcome::Failed => {}
    }

    if let Some(last) = panel.transcript().last() {
        println!("{}", last.body);
    }

    Ok(())
}
