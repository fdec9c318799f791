//! Search command: retrieve parent passages for a query.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{CollectionRegistry, Config, OutputFormat, RetrievalResults};
use crate::services::{
    EmbeddingProvider, QdrantIndex, Retriever, SqliteParentStore, provider_for_language,
};

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    /// Collection to search; the configured default when omitted
    #[arg(long, short = 'C')]
    pub collection: Option<String>,

    #[arg(long, short = 'n', help = "Maximum number of child hits to retrieve")]
    pub limit: Option<u32>,
}

pub async fn handle_search(args: SearchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let limit = args.limit.unwrap_or(config.search.default_limit);
    if limit == 0 {
        anyhow::bail!("limit must be at least 1");
    }

    let registry = CollectionRegistry::load(config.registry_path())?;
    let entry = match args.collection.as_deref().or(config.default_collection.as_deref()) {
        Some(name) => registry.get(name)?,
        None => registry.default_entry(),
    };

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Collection: {}", entry.collection_name);
        eprintln!("  Limit: {limit}");
    }

    let embedder = provider_for_language(&entry.language, &config.embedding)?;
    let index = QdrantIndex::new(
        &config.vector_store,
        &entry.collection_name,
        embedder.dimension(),
        entry.index_param.metric_type,
    )?;
    let parents = SqliteParentStore::open(config.docstore_path(&entry.collection_name))?;

    let retriever = Retriever::new(Arc::new(parents), Arc::new(index), Arc::from(embedder));

    let passages = retriever
        .retrieve(query, u64::from(limit))
        .await
        .context("retrieval failed")?;

    let duration_ms = start_time.elapsed().as_millis() as u64;
    let results = RetrievalResults::new(
        query.to_string(),
        entry.collection_name.clone(),
        passages,
        duration_ms,
    );

    print!("{}", formatter.format_retrieval_results(&results));

    Ok(())
}
