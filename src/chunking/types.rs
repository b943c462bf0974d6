//! Core data types and error definitions for the chunker.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum number of characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default number of trailing characters carried into the next chunk.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Errors produced when a chunker is configured with impossible bounds.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// Chunk size of zero can never hold any content.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap must leave room for new content in every chunk.
    #[error("chunk overlap ({overlap}) must be less than chunk size ({chunk_size})")]
    InvalidOverlap {
        /// Requested overlap in characters.
        overlap: usize,
        /// Configured chunk size in characters.
        chunk_size: usize,
    },
}

/// Options recognized by the chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target maximum characters per chunk (soft for protected blocks, hard otherwise).
    pub chunk_size: usize,
    /// Characters of trailing context copied from the previous chunk.
    pub chunk_overlap: usize,
    /// Split the document into sections at heading lines.
    pub respect_headings: bool,
    /// Append a machine-readable boundary marker to every chunk.
    pub add_chunk_markers: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            respect_headings: true,
            add_chunk_markers: true,
        }
    }
}

impl ChunkingConfig {
    /// Check the size bounds, returning the first violation found.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkingError::InvalidOverlap {
                overlap: self.chunk_overlap,
                chunk_size: self.chunk_size,
            });
        }
        Ok(())
    }
}

/// Dominant kind of content held by a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Prose without structural atoms.
    Text,
    /// Contains a pipe-delimited table.
    Table,
    /// Contains a fenced code block.
    Code,
    /// References an image.
    Image,
}

/// Structural annotations attached to every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Nearest enclosing heading text, empty when the chunk precedes every heading.
    pub section_title: String,
    /// Position of the enclosing section within the document.
    pub section_index: usize,
    /// Headings that appear inside the chunk's own text, in order.
    pub heading_path: Vec<String>,
    /// Heading depth (`1..=6`) for each entry of `heading_path`.
    pub heading_levels: Vec<u8>,
    /// Chunk holds a table row together with a separator row.
    pub has_table: bool,
    /// Chunk references an image.
    pub has_image: bool,
    /// Chunk holds a code fence.
    pub has_code: bool,
    /// Dominant content classification.
    pub content_type: ContentType,
}

/// A contiguous span of processed text ready for retrieval indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text, possibly decorated with an overlap prefix and a boundary marker.
    pub content: String,
    /// 0-based position among all chunks of the document.
    pub index: usize,
    /// Character offset of the chunk's own span within its section.
    pub start_char: usize,
    /// Character offset one past the end of the chunk's own span within its section.
    pub end_char: usize,
    /// Structural annotations.
    pub metadata: ChunkMetadata,
}

/// Output of [`crate::chunking::Chunker::chunk_document`]: chunks plus the stripped frontmatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkedDocument {
    /// Frontmatter body (without the `---` delimiters), when the text carried one.
    pub frontmatter: Option<String>,
    /// Ordered chunks of the remaining text.
    pub chunks: Vec<Chunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ChunkingConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert!(config.respect_headings);
        assert!(config.add_chunk_markers);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_size_and_large_overlap() {
        let zero = ChunkingConfig {
            chunk_size: 0,
            chunk_overlap: 0,
            ..ChunkingConfig::default()
        };
        assert_eq!(zero.validate(), Err(ChunkingError::InvalidChunkSize));

        let overlap = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..ChunkingConfig::default()
        };
        assert_eq!(
            overlap.validate(),
            Err(ChunkingError::InvalidOverlap {
                overlap: 100,
                chunk_size: 100
            })
        );
    }
}
