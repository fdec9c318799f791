//! Status command: vector store health and per-collection counts.

use anyhow::Result;

use crate::cli::output::{CollectionStatus, StatusInfo, get_formatter};
use crate::models::{CollectionRegistry, Config, OutputFormat};
use crate::services::{
    EmbeddingProvider, ParentStore, QdrantIndex, SqliteParentStore, VectorIndex,
    provider_for_language,
};

pub async fn handle_status(format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let registry = CollectionRegistry::load(config.registry_path())?;

    let mut connected = false;
    let mut collections = Vec::new();

    for entry in registry.entries() {
        let embedder = provider_for_language(&entry.language, &config.embedding)?;

        let points = match QdrantIndex::new(
            &config.vector_store,
            &entry.collection_name,
            embedder.dimension(),
            entry.index_param.metric_type,
        ) {
            Ok(index) => match index.points_count().await {
                Ok(points) => {
                    connected = true;
                    points
                }
                Err(error) => {
                    if verbose {
                        eprintln!("{}: {}", entry.collection_name, error);
                    }
                    None
                }
            },
            Err(error) => {
                if verbose {
                    eprintln!("{}: {}", entry.collection_name, error);
                }
                None
            }
        };

        let docstore_path = config.docstore_path(&entry.collection_name);
        let parents = if docstore_path.exists() {
            SqliteParentStore::open(&docstore_path)?.count()?
        } else {
            0
        };

        collections.push(CollectionStatus {
            name: entry.collection_name.clone(),
            language: entry.language.clone(),
            model: embedder.model_id().to_string(),
            points,
            parents,
        });
    }

    let status = StatusInfo {
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected: connected,
        collections,
    };

    print!("{}", formatter.format_status(&status));

    Ok(())
}
