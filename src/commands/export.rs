use anyhow::Result;
use clap::Args as ClapArgs;
use std::path::PathBuf;

use crate::commands::common::{self, AppContext, TargetArgs};
use crate::config::Config;
use crate::export::write_export;

#[derive(ClapArgs)]
pub struct Args {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output directory (defaults to the data dir's exports folder)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub async fn execute(args: Args, config: Config) -> Result<()> {
    let app = AppContext::open(config)?;
    let id = args.target.identifier(&app).await?;
    let record = common::load_record(&app, &id).await?;

    let dir = args.out.unwrap_or_else(|| app.config.exports_dir());
    let path = write_export(&dir, &record).await?;

    println!("Conversation exported successfully: {}", path.display());
    Ok(())
}
