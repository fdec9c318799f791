//! Retrieval result models.

use serde::{Deserialize, Serialize};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// A parent passage returned by the retriever, carrying the best score
/// among the child hits that mapped to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub parent_id: String,
    pub text: String,
    pub source_id: String,
    pub year: i32,
    pub score: f32,
}

/// Ordered retrieval output for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResults {
    pub query: String,
    pub collection: String,
    pub passages: Vec<RetrievedPassage>,
    pub duration_ms: u64,
}

impl RetrievalResults {
    pub fn new(
        query: String,
        collection: String,
        passages: Vec<RetrievedPassage>,
        duration_ms: u64,
    ) -> Self {
        Self {
            query,
            collection,
            passages,
            duration_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }
}
