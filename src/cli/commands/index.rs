//! Index command: build or rebuild collection indexes from the corpus.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use walkdir::WalkDir;

use crate::cli::output::get_formatter;
use crate::models::{
    CollectionEntry, CollectionRegistry, Config, Document, DocumentMeta, OutputFormat,
};
use crate::services::{
    EmbeddingProvider, HierarchicalSplitter, IndexStats, IndexingPipeline, QdrantIndex,
    SqliteParentStore, provider_for_language,
};
use crate::utils::{is_markdown_file, read_file_content, source_id_from_path};

#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Collection to build; all registered collections when omitted
    #[arg(long, short = 'C')]
    pub collection: Option<String>,

    /// Create registry entries from the data root directory layout
    #[arg(long, short = 'A')]
    pub auto_create: bool,

    /// Overwrite an existing registry when auto-creating
    #[arg(long, short = 'F')]
    pub force: bool,
}

pub async fn handle_index(args: IndexArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    if args.auto_create {
        let path = CollectionRegistry::auto_create(&config.data_root, args.force)
            .context("failed to auto-create collection registry")?;
        if verbose {
            eprintln!("registry at {}", path.display());
        }
    }

    let registry = CollectionRegistry::load(config.registry_path())?;

    let targets: Vec<CollectionEntry> = match &args.collection {
        Some(name) => vec![registry.get(name)?.clone()],
        None => registry.entries().to_vec(),
    };

    for entry in targets {
        println!(
            "{}",
            formatter.format_message(&format!("Building collection [{}]", entry.collection_name))
        );
        index_collection(&config, &entry, format, verbose).await?;
    }

    Ok(())
}

async fn index_collection(
    config: &Config,
    entry: &CollectionEntry,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let md_path = config.md_path(&entry.collection_name);
    if !md_path.exists() {
        println!(
            "{}",
            formatter.format_message(&format!(
                "No corpus directory at {}, skipping.",
                md_path.display()
            ))
        );
        return Ok(());
    }

    let files = collect_corpus_files(&md_path)?;
    if files.is_empty() {
        println!("{}", formatter.format_message("No files found to index."));
        return Ok(());
    }
    if verbose {
        eprintln!("Found {} files to process", files.len());
    }

    let embedder = provider_for_language(&entry.language, &config.embedding)?;
    if verbose {
        eprintln!(
            "Using model {} for [{}]",
            embedder.model_id(),
            entry.collection_name
        );
    }

    let index = QdrantIndex::new(
        &config.vector_store,
        &entry.collection_name,
        embedder.dimension(),
        entry.index_param.metric_type,
    )?;
    let parents = SqliteParentStore::open(config.docstore_path(&entry.collection_name))?;
    let splitter = HierarchicalSplitter::new(&config.indexing)?;

    let pipeline = IndexingPipeline::new(
        splitter,
        Arc::new(parents),
        Arc::new(index),
        Arc::from(embedder),
    );

    // Full rebuild: stale vectors and stale parents go together.
    pipeline
        .rebuild(&entry.index_param)
        .await
        .context("failed to recreate collection")?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut stats = IndexStats::default();
    for file_path in &files {
        pb.inc(1);

        match load_document(file_path, entry, config) {
            Some(document) => {
                stats.merge(&pipeline.add_documents(vec![document]).await);
            }
            None => {
                stats.documents_failed += 1;
            }
        }
    }

    pb.finish_and_clear();
    let duration_ms = start_time.elapsed().as_millis() as u64;
    print!("{}", formatter.format_index_stats(&stats, duration_ms));

    Ok(())
}

/// Build a [`Document`] from one corpus file. The year comes from the
/// containing directory name, the source id from the filename.
fn load_document(path: &Path, entry: &CollectionEntry, config: &Config) -> Option<Document> {
    let year = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .and_then(|n| n.parse::<i32>().ok());
    let Some(year) = year else {
        tracing::error!(path = %path.display(), "corpus file not under a year directory");
        return None;
    };

    let Some(source_id) = source_id_from_path(path) else {
        tracing::error!(path = %path.display(), "could not derive source id from filename");
        return None;
    };

    let text = match read_file_content(path, config.indexing.max_file_size) {
        Ok(text) => text,
        Err(error) => {
            tracing::error!(path = %path.display(), %error, "failed to read corpus file");
            return None;
        }
    };

    Some(Document::new(
        text,
        DocumentMeta {
            source_id,
            year,
            language: entry.language.clone(),
            collection: entry.collection_name.clone(),
        },
    ))
}

fn collect_corpus_files(md_path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(md_path).follow_links(false) {
        let entry = entry.context("failed to read directory entry")?;
        if entry.path().is_file() && is_markdown_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_document_from_year_directory() {
        let dir = tempfile::tempdir().unwrap();
        let year_dir = dir.path().join("2021");
        std::fs::create_dir(&year_dir).unwrap();
        let file = year_dir.join("10.1000@xyz.md");
        std::fs::write(&file, "Paper text.").unwrap();

        let entry = CollectionEntry::new("demo", "en");
        let config = Config::default();
        let doc = load_document(&file, &entry, &config).unwrap();
        assert_eq!(doc.meta.source_id, "10.1000/xyz");
        assert_eq!(doc.meta.year, 2021);
        assert_eq!(doc.meta.collection, "demo");
        assert_eq!(doc.text, "Paper text.");
    }

    #[test]
    fn test_load_document_rejects_non_year_directory() {
        let dir = tempfile::tempdir().unwrap();
        let bad_dir = dir.path().join("drafts");
        std::fs::create_dir(&bad_dir).unwrap();
        let file = bad_dir.join("10.1000@xyz.md");
        std::fs::write(&file, "Paper text.").unwrap();

        let entry = CollectionEntry::new("demo", "en");
        assert!(load_document(&file, &entry, &Config::default()).is_none());
    }

    #[test]
    fn test_collect_corpus_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let y1 = dir.path().join("2020");
        let y2 = dir.path().join("2021");
        std::fs::create_dir_all(&y1).unwrap();
        std::fs::create_dir_all(&y2).unwrap();
        std::fs::write(y2.join("b.md"), "b").unwrap();
        std::fs::write(y1.join("a.md"), "a").unwrap();
        std::fs::write(y1.join("notes.txt"), "skip").unwrap();

        let files = collect_corpus_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("2020/a.md"));
        assert!(files[1].ends_with("2021/b.md"));
    }
}
