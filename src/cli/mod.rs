//! CLI module for the paper search CLI.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Semantic search over academic paper corpora.
#[derive(Debug, Parser)]
#[command(name = "psearch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, short = 'f', global = true, help = "Output format: text or json")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build or rebuild collection indexes from the markdown corpus
    Index(commands::IndexArgs),

    /// Search a collection and print parent passages
    Search(commands::SearchArgs),

    /// Manage the collection registry
    #[command(subcommand)]
    Collection(commands::CollectionCommand),

    /// Check vector store and parent store status
    Status,
}
