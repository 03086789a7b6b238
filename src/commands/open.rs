use anyhow::Result;
use clap::Args as ClapArgs;
use std::path::PathBuf;

use crate::commands::common::{self, AppContext};
use crate::config::Config;
use crate::models::SessionState;
use crate::session::{PanelSync, TerminalPanel};

#[derive(ClapArgs)]
pub struct Args {
    /// Page snapshot (YAML)
    pub page: PathBuf,

    /// Start the conversation over
    #[arg(long)]
    pub clear: bool,
}

pub async fn execute(args: Args, config: Config) -> Result<()> {
    let app = AppContext::open(config)?;
    let page = common::load_page(&args.page).await?;
    let reconciler = app.reconciler();

    let mut panel = TerminalPanel::new();
    let (state, sync) = reconciler
        .open_panel(SessionState::idle(), &page, &mut panel)
        .await?;

    if args.clear {
        reconciler.clear_conversation(state, &page, &mut panel).await?;
        println!("(conversation cleared)");
    } else if sync == PanelSync::Greeted {
        println!("(new conversation)");
    }

    Ok(())
}
