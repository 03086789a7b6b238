use anyhow::Result;
use clap::Args as ClapArgs;
use std::path::PathBuf;

use crate::commands::common::{self, AppContext};
use crate::config::Config;
use crate::page::{detect_language, extract_problem_details, find_anchor};

#[derive(ClapArgs)]
pub struct Args {
    /// Page snapshot (YAML)
    pub page: PathBuf,
}

pub async fn execute(args: Args, config: Config) -> Result<()> {
    let app = AppContext::open(config)?;
    let page = common::load_page(&args.page).await?;

    let id = app.resolve(&page);
    let details = extract_problem_details(&page);

    println!("Identifier: {}", id);
    println!("Storage key: {}", app.history.key_for(&id));
    println!("Title: {}", if details.title.is_empty() { "-" } else { &details.title });
    println!("Language: {}", detect_language(&page));
    match find_anchor(&page) {
        Some(anchor) => println!("Anchor: {}", anchor),
        None => println!("Anchor: none (assistant would not attach)"),
    }

    Ok(())
}
