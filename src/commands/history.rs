use anyhow::{bail, Result};
use clap::{Args as ClapArgs, Subcommand};

use crate::commands::common::{self, AppContext, TargetArgs};
use crate::config::Config;
use crate::models::ProblemIdentifier;
use crate::utils::truncate_str;

#[derive(ClapArgs)]
pub struct Args {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// List saved conversations, most recent first
    List {
        /// Also print each entry's storage key and page URL
        #[arg(long, short)]
        verbose: bool,
    },

    /// Print one conversation
    Show(TargetArgs),

    /// Delete one conversation
    Delete(TargetArgs),

    /// Delete every saved conversation
    Clear {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },
}

pub async fn execute(args: Args, config: Config) -> Result<()> {
    let app = AppContext::open(config)?;

    match args.command {
        HistoryCommand::List { verbose } => list(&app, verbose).await,
        HistoryCommand::Show(target) => {
            let id = target.identifier(&app).await?;
            show(&app, &id).await
        }
        HistoryCommand::Delete(target) => {
            let id = target.identifier(&app).await?;
            app.history.delete(&id).await?;
            println!("Deleted conversation for {}", id);
            Ok(())
        }
        HistoryCommand::Clear { yes } => {
            if !yes {
                bail!("Refusing to delete all conversations without --yes");
            }
            let removed = app.history.clear_all().await?;
            println!("Deleted {} conversation(s)", removed);
            Ok(())
        }
    }
}

async fn list(app: &AppContext, verbose: bool) -> Result<()> {
    let mut summaries = app.history.list_all().await?;
    if summaries.is_empty() {
        println!("No saved conversations");
        return Ok(());
    }

    summaries.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
    for summary in summaries {
        println!(
            "{:<32} {:<40} {:>3} msgs  {}",
            truncate_str(&summary.problem_id, 32),
            truncate_str(&summary.title, 40),
            summary.message_count,
            summary.last_updated.format("%Y-%m-%d %H:%M")
        );
        if verbose {
            println!("    key: {}", summary.key);
            println!("    url: {}", summary.url);
        }
    }
    Ok(())
}

async fn show(app: &AppContext, id: &ProblemIdentifier) -> Result<()> {
    let record = common::load_record(app, id).await?;

    println!("{} ({})", record.problem_title, record.page_url);
    println!("Last updated: {}", record.last_updated.to_rfc3339());
    println!();
    for message in &record.messages {
        println!("{}: {}", message.role.label(), message.body);
    }
    Ok(())
}
