use std::fmt::Write as FmtWrite;

use crate::models::{CollectionEntry, OutputFormat, RetrievalResults};
use crate::services::IndexStats;

pub trait Formatter {
    fn format_retrieval_results(&self, results: &RetrievalResults) -> String;
    fn format_index_stats(&self, stats: &IndexStats, duration_ms: u64) -> String;
    fn format_collections(&self, entries: &[CollectionEntry], default_name: &str) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct CollectionStatus {
    pub name: String,
    pub language: String,
    pub model: String,
    /// Points in the vector index; `None` when the collection has not
    /// been built yet.
    pub points: Option<u64>,
    pub parents: u64,
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub collections: Vec<CollectionStatus>,
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_retrieval_results(&self, results: &RetrievalResults) -> String {
        if results.is_empty() {
            return format!("No passages found for: {}\n", results.query);
        }

        let mut output = String::new();
        writeln!(
            output,
            "Results for \"{}\" in [{}]",
            results.query, results.collection
        )
        .unwrap();
        writeln!(
            output,
            "Found {} passages in {}ms\n",
            results.len(),
            results.duration_ms
        )
        .unwrap();

        for (i, passage) in results.passages.iter().enumerate() {
            writeln!(output, "{}. [Score: {:.4}]", i + 1, passage.score).unwrap();
            writeln!(output, "   Source: {} ({})", passage.source_id, passage.year).unwrap();
            writeln!(output, "   ---").unwrap();

            let preview: String = passage.text.chars().take(300).collect();
            let preview = if passage.text.chars().count() > 300 {
                format!("{}...", preview)
            } else {
                preview
            };
            for line in preview.lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_index_stats(&self, stats: &IndexStats, duration_ms: u64) -> String {
        let mut output = String::new();
        writeln!(output, "Indexing Complete").unwrap();
        writeln!(output, "-----------------").unwrap();
        writeln!(output, "Documents indexed: {}", stats.documents_indexed).unwrap();
        writeln!(output, "Documents failed:  {}", stats.documents_failed).unwrap();
        writeln!(output, "Parents written:   {}", stats.parents_written).unwrap();
        writeln!(output, "Children indexed:  {}", stats.children_indexed).unwrap();
        writeln!(output, "Duration:          {}ms", duration_ms).unwrap();
        output
    }

    fn format_collections(&self, entries: &[CollectionEntry], default_name: &str) -> String {
        let mut output = String::new();
        writeln!(output, "Collections").unwrap();
        writeln!(output, "-----------").unwrap();
        for entry in entries {
            let marker = if entry.collection_name == default_name {
                "*"
            } else {
                " "
            };
            writeln!(
                output,
                "{} {} [{}] {}",
                marker, entry.collection_name, entry.language, entry.title
            )
            .unwrap();
            if !entry.description.is_empty() {
                writeln!(output, "    {}", entry.description).unwrap();
            }
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        let vector_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Vector Store: {} {}", status.vector_store_url, vector_status).unwrap();
        writeln!(output).unwrap();

        for col in &status.collections {
            writeln!(output, "{} [{}]", col.name, col.language).unwrap();
            writeln!(output, "  Model:   {}", col.model).unwrap();
            match col.points {
                Some(points) => writeln!(output, "  Points:  {}", points).unwrap(),
                None => writeln!(output, "  Points:  (not built)").unwrap(),
            }
            writeln!(output, "  Parents: {}", col.parents).unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_retrieval_results(&self, results: &RetrievalResults) -> String {
        serde_json::to_string_pretty(results).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    fn format_index_stats(&self, stats: &IndexStats, duration_ms: u64) -> String {
        serde_json::json!({
            "documents_indexed": stats.documents_indexed,
            "documents_failed": stats.documents_failed,
            "parents_written": stats.parents_written,
            "children_indexed": stats.children_indexed,
            "duration_ms": duration_ms,
        })
        .to_string()
    }

    fn format_collections(&self, entries: &[CollectionEntry], default_name: &str) -> String {
        serde_json::json!({
            "default": default_name,
            "collections": entries,
        })
        .to_string()
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let collections: Vec<serde_json::Value> = status
            .collections
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name,
                    "language": c.language,
                    "model": c.model,
                    "points": c.points,
                    "parents": c.parents,
                })
            })
            .collect();
        serde_json::json!({
            "vector_store_url": status.vector_store_url,
            "vector_store_connected": status.vector_store_connected,
            "collections": collections,
        })
        .to_string()
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({ "message": message }).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({ "error": error }).to_string()
    }
}
