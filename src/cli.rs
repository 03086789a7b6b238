use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{ask, copy, export, history, key, open, resolve, watch};

#[derive(Parser)]
#[command(name = "leetassist")]
#[command(about = "AI coding assistant for competitive-programming problem pages")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to $LEETASSIST_CONFIG or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the problem identifier for a page snapshot
    Resolve(resolve::Args),

    /// Ask one question about a problem page
    Ask(ask::Args),

    /// Show the conversation for a problem page
    Open(open::Args),

    /// List, show or delete saved conversations
    History(history::Args),

    /// Export a conversation as an HTML file
    Export(export::Args),

    /// Copy the last answer or one of its code blocks
    Copy(copy::Args),

    /// Manage the Gemini API key
    Key(key::Args),

    /// Follow a page snapshot file and chat interactively
    Watch(watch::Args),
}
