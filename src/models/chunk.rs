use serde::{Deserialize, Serialize};

/// Metadata carried by every document fed into the indexing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Stable source identifier, typically a DOI.
    pub source_id: String,
    /// Publication year, taken from the corpus directory layout.
    pub year: i32,
    /// Language of the document text ("en", "zh", ...).
    pub language: String,
    /// Collection the document belongs to.
    pub collection: String,
}

/// A raw document as read from the corpus. Immutable input; never
/// persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub meta: DocumentMeta,
}

impl Document {
    pub fn new(text: String, meta: DocumentMeta) -> Self {
        Self { text, meta }
    }

    /// Stable id derived from the source identifier.
    pub fn generate_id(source_id: &str) -> String {
        use sha2::{Digest, Sha256};
        let hash = Sha256::digest(source_id.as_bytes());
        hex::encode(&hash[..16])
    }

    pub fn id(&self) -> String {
        Self::generate_id(&self.meta.source_id)
    }
}

/// A coarse passage of a document, stored verbatim in the parent store
/// so that retrieval can return enough surrounding context.
///
/// Parents are created during indexing, never mutated afterwards, and
/// deleted only when the owning document is re-indexed or the collection
/// is rebuilt. A parent with no surviving children is legal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentChunk {
    pub id: String,
    pub text: String,
    pub source_id: String,
    pub year: i32,
    pub collection: String,
    pub created_at: String,
}

impl ParentChunk {
    /// Parent ids are deterministic in (document, position) so that
    /// re-indexing an unchanged corpus overwrites instead of duplicating.
    pub fn generate_id(document_id: &str, index: usize) -> String {
        use uuid::Uuid;
        let name = format!("{}:parent:{}", document_id, index);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    pub fn new(document: &Document, index: usize, text: String) -> Self {
        Self {
            id: Self::generate_id(&document.id(), index),
            text,
            source_id: document.meta.source_id.clone(),
            year: document.meta.year,
            collection: document.meta.collection.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A fine passage derived from a parent, the unit that is embedded and
/// searched. `parent_id` must resolve in the parent store by the time
/// the child is written to the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildChunk {
    pub id: String,
    pub parent_id: String,
    pub text: String,
    /// Position of the child within its parent.
    pub position: u32,
    pub source_id: String,
    pub year: i32,
}

impl ChildChunk {
    pub fn generate_id(parent_id: &str, position: u32) -> String {
        use uuid::Uuid;
        let name = format!("{}:child:{}", parent_id, position);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    pub fn from_parent(parent: &ParentChunk, position: u32, text: String) -> Self {
        Self {
            id: Self::generate_id(&parent.id, position),
            parent_id: parent.id.clone(),
            text,
            position,
            source_id: parent.source_id.clone(),
            year: parent.year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_document() -> Document {
        Document::new(
            "some text".to_string(),
            DocumentMeta {
                source_id: "10.1000/demo.1".to_string(),
                year: 2021,
                language: "en".to_string(),
                collection: "demo".to_string(),
            },
        )
    }

    #[test]
    fn test_document_id_stable() {
        let doc = test_document();
        assert_eq!(doc.id(), doc.id());
        assert_eq!(doc.id().len(), 32);
        assert_ne!(doc.id(), Document::generate_id("10.1000/demo.2"));
    }

    #[test]
    fn test_parent_id_deterministic() {
        let a = ParentChunk::generate_id("doc", 3);
        let b = ParentChunk::generate_id("doc", 3);
        assert_eq!(a, b);
        assert_eq!(a.len(), 36);
        assert_ne!(a, ParentChunk::generate_id("doc", 4));
    }

    #[test]
    fn test_child_inherits_parent_metadata() {
        let doc = test_document();
        let parent = ParentChunk::new(&doc, 0, "parent text".to_string());
        let child = ChildChunk::from_parent(&parent, 1, "child text".to_string());
        assert_eq!(child.parent_id, parent.id);
        assert_eq!(child.source_id, "10.1000/demo.1");
        assert_eq!(child.year, 2021);
        assert_eq!(child.position, 1);
        assert_ne!(child.id, ChildChunk::generate_id(&parent.id, 0));
    }
}
