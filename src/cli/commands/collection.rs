//! Collection registry management.

use anyhow::Result;
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{CollectionEntry, CollectionRegistry, Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum CollectionCommand {
    /// List registered collections
    List,

    /// Register a new collection
    Add {
        /// Collection name (also the corpus subdirectory name)
        name: String,

        /// Document language, decides the embedding model
        #[arg(long, short = 'l', default_value = "en")]
        language: String,

        /// Display title; defaults to the collection name
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Remove a collection from the registry
    Remove {
        name: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        force: bool,
    },

    /// Change a collection's display title
    Rename { name: String, title: String },

    /// Set the default collection for search
    Default { name: String },
}

pub async fn handle_collection(
    cmd: CollectionCommand,
    format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    let mut config = Config::load()?;
    let formatter = get_formatter(format);
    let mut registry = CollectionRegistry::load(config.registry_path())?;

    match cmd {
        CollectionCommand::List => {
            let default_name = config
                .default_collection
                .clone()
                .unwrap_or_else(|| registry.default_entry().collection_name.clone());
            print!("{}", formatter.format_collections(registry.entries(), &default_name));
        }

        CollectionCommand::Add {
            name,
            language,
            title,
            description,
        } => {
            let mut entry = CollectionEntry::new(name.clone(), language);
            if let Some(title) = title {
                entry.title = title;
            }
            if let Some(description) = description {
                entry.description = description;
            }
            registry.add(entry)?;
            println!(
                "{}",
                formatter.format_message(&format!("Registered collection [{}]", name))
            );
        }

        CollectionCommand::Remove { name, force } => {
            registry.get(&name)?;

            if !force {
                println!(
                    "This removes [{}] from the registry (indexed data is kept). Continue? [y/N]",
                    name
                );
                let mut input = String::new();
                std::io::stdin().read_line(&mut input)?;
                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("{}", formatter.format_message("Cancelled."));
                    return Ok(());
                }
            }

            registry.remove(&name)?;
            if config.default_collection.as_deref() == Some(name.as_str()) {
                config.default_collection = None;
                config.save()?;
            }
            println!(
                "{}",
                formatter.format_message(&format!("Removed collection [{}]", name))
            );
        }

        CollectionCommand::Rename { name, title } => {
            registry.rename(&name, &title)?;
            println!(
                "{}",
                formatter.format_message(&format!("Renamed [{}] to \"{}\"", name, title))
            );
        }

        CollectionCommand::Default { name } => {
            registry.get(&name)?;
            config.default_collection = Some(name.clone());
            config.save()?;
            println!(
                "{}",
                formatter.format_message(&format!("Default collection set to [{}]", name))
            );
        }
    }

    Ok(())
}
