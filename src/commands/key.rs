use anyhow::Result;
use clap::{Args as ClapArgs, Subcommand};

use crate::commands::common::AppContext;
use crate::config::Config;
use crate::storage::{mask_api_key, SaveOutcome};

#[derive(ClapArgs)]
pub struct Args {
    #[command(subcommand)]
    pub command: KeyCommand,
}

#[derive(Subcommand)]
pub enum KeyCommand {
    /// Validate and store a Gemini API key
    Set {
        /// The key (must start with "AI")
        key: String,
    },

    /// Show the stored key, masked
    Show,

    /// Remove the stored key
    Delete,
}

pub async fn execute(args: Args, config: Config) -> Result<()> {
    let app = AppContext::open(config)?;

    match args.command {
        KeyCommand::Set { key } => match app.secrets.save_from_input(&key).await? {
            SaveOutcome::Saved { masked } => println!("API key saved successfully! ({})", masked),
            SaveOutcome::Unchanged => println!("No changes made"),
        },
        KeyCommand::Show => {
            let key = app.secrets.api_key().await?;
            if key.is_empty() {
                println!("No API key set");
            } else {
                println!("{}", mask_api_key(&key));
            }
        }
        KeyCommand::Delete => {
            app.secrets.delete_api_key().await?;
            println!("API key deleted");
        }
    }

    Ok(())
}
