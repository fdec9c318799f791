//! Hierarchical text splitting for parent/child retrieval.
//!
//! Each document is split twice: a coarse pass produces parent passages
//! on paragraph boundaries (falling back to line boundaries), and each
//! parent is split again into fine child passages on sentence boundaries.
//! Only children are embedded; parents are what retrieval returns.
//!
//! Splitting is a pure function of the input text and the configured
//! sizes, so re-indexing unchanged text always reproduces the same
//! chunk boundaries.

use crate::error::SplitError;
use crate::models::IndexingConfig;

/// Separators tried for the parent pass, in priority order.
pub const PARENT_SEPARATORS: &[&str] = &["\n\n", "\n"];

/// Separators tried for the child pass. Sentence ends win over
/// paragraph and line breaks.
pub const CHILD_SEPARATORS: &[&str] = &[".", "\n\n", "\n"];

/// Two-level chunk splitter. No I/O.
#[derive(Debug, Clone)]
pub struct HierarchicalSplitter {
    parent_size: usize,
    child_size: usize,
    child_overlap: usize,
}

impl HierarchicalSplitter {
    pub fn new(config: &IndexingConfig) -> Result<Self, SplitError> {
        let parent_size = config.parent_chunk_size as usize;
        let child_size = config.child_chunk_size as usize;
        let child_overlap = config.child_chunk_overlap as usize;

        if parent_size == 0 || child_size == 0 {
            return Err(SplitError::ZeroChunkSize);
        }
        if child_overlap >= child_size {
            return Err(SplitError::OverlapTooLarge {
                overlap: child_overlap,
                size: child_size,
            });
        }

        Ok(Self {
            parent_size,
            child_size,
            child_overlap,
        })
    }

    /// Create a splitter with default sizes (parents ~450 chars, children
    /// ~100 chars with 10 chars of overlap).
    pub fn with_defaults() -> Self {
        Self::new(&IndexingConfig::default()).expect("default sizes are valid")
    }

    /// Split a document into parents, each with its ordered children.
    ///
    /// An empty (or whitespace-only) document yields an empty sequence.
    pub fn split(&self, text: &str) -> Vec<(String, Vec<String>)> {
        let pieces = split_pieces(text, PARENT_SEPARATORS, self.parent_size);
        let parents = pack_pieces(pieces, self.parent_size);

        parents
            .into_iter()
            .map(|parent| {
                let children = self.split_children(&parent);
                (parent, children)
            })
            .collect()
    }

    /// Split one parent passage into children.
    fn split_children(&self, parent: &str) -> Vec<String> {
        // A parent at or under the child target is its own single child.
        if parent.chars().count() <= self.child_size {
            return vec![parent.to_string()];
        }

        let pieces = split_pieces(parent, CHILD_SEPARATORS, self.child_size);
        let chunks = pack_pieces(pieces, self.child_size);
        apply_overlap(chunks, self.child_overlap)
    }
}

/// Break text into separator-free pieces.
///
/// The first separator that occurs in the text wins; pieces still longer
/// than `chunk_size` are re-split with the remaining separators. A piece
/// with no separator left is kept whole even when oversized, so chunk
/// boundaries always fall on natural breaks.
fn split_pieces(text: &str, separators: &[&str], chunk_size: usize) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let Some(sep_index) = separators.iter().position(|sep| trimmed.contains(sep)) else {
        return vec![trimmed.to_string()];
    };
    let separator = separators[sep_index];
    let rest = &separators[sep_index + 1..];

    let mut pieces = Vec::new();
    for part in trimmed.split(separator) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if part.chars().count() > chunk_size && !rest.is_empty() {
            pieces.extend(split_pieces(part, rest, chunk_size));
        } else {
            pieces.push(part.to_string());
        }
    }
    pieces
}

/// Greedily merge pieces into chunks of at most `chunk_size` characters.
fn pack_pieces(pieces: Vec<String>, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for piece in pieces {
        let piece_len = piece.chars().count();
        if current.is_empty() {
            current = piece;
            current_len = piece_len;
        } else if current_len + 1 + piece_len <= chunk_size {
            current.push(' ');
            current.push_str(&piece);
            current_len += 1 + piece_len;
        } else {
            chunks.push(std::mem::replace(&mut current, piece));
            current_len = piece_len;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Prefix every chunk after the first with the last `overlap` characters
/// of its predecessor, so local context survives a search-time boundary.
fn apply_overlap(chunks: Vec<String>, overlap: usize) -> Vec<String> {
    if overlap == 0 || chunks.len() < 2 {
        return chunks;
    }

    let mut out = Vec::with_capacity(chunks.len());
    let mut carry: Option<String> = None;
    for chunk in chunks {
        let tail = last_chars(&chunk, overlap);
        match carry.take() {
            Some(prefix) => out.push(format!("{}{}", prefix, chunk)),
            None => out.push(chunk),
        }
        carry = Some(tail);
    }
    out
}

fn last_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    if count <= n {
        return s.to_string();
    }
    s.chars().skip(count - n).collect()
}
