//! Heading-aware chunking of long-form text.
//!
//! The chunker turns decoded document text into bounded, ordered [`Chunk`]s for retrieval
//! indexing:
//!
//! - Frontmatter: a leading `---` delimited block is stripped and returned separately.
//! - Sections: with `respect_headings`, the body is split at `#`..`######` heading lines; chunks
//!   never straddle two sections and carry the section title in their metadata.
//! - Atoms: fenced code blocks and pipe tables are never split. They may exceed `chunk_size`;
//!   everything else is held to it strictly.
//! - Overlap: every chunk after the first is prefixed with `[...] ` and trailing context from its
//!   predecessor. Offsets keep describing the chunk's own span.
//! - Markers: `<!-- chunk_boundary: N -->` is appended last.
//!
//! Chunking is deterministic and infallible once a [`Chunker`] has been built from a valid
//! [`ChunkingConfig`].

mod blocks;
mod metadata;
mod overlap;
mod sections;
mod splitter;
pub mod types;

pub use types::{
    Chunk, ChunkMetadata, ChunkedDocument, ChunkingConfig, ChunkingError, ContentType,
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
};

use overlap::{append_markers, apply_overlap};
use sections::{single_section, split_frontmatter, split_sections};
use splitter::{char_len, split_section};

/// Splits text into bounded chunks according to a validated configuration.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Build a chunker, rejecting configurations with impossible bounds.
    pub fn new(config: ChunkingConfig) -> Result<Self, ChunkingError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Chunk `content`, discarding any frontmatter.
    pub fn chunk(&self, content: &str) -> Vec<Chunk> {
        self.chunk_document(content).chunks
    }

    /// Chunk `content` and return the stripped frontmatter alongside the chunks.
    pub fn chunk_document(&self, content: &str) -> ChunkedDocument {
        let (frontmatter, body) = split_frontmatter(content);
        let sections = if self.config.respect_headings {
            split_sections(body)
        } else {
            single_section(body)
        };

        let mut chunks = Vec::new();
        for (section_index, section) in sections.iter().enumerate() {
            for span in split_section(section.text, self.config.chunk_size) {
                let text = &section.text[span.start..span.end];
                let start_char = char_len(&section.text[..span.start]);
                chunks.push(Chunk {
                    content: text.to_string(),
                    index: chunks.len(),
                    start_char,
                    end_char: start_char + char_len(text),
                    metadata: metadata::inspect(text, &section.title, section_index),
                });
            }
        }

        apply_overlap(&mut chunks, self.config.chunk_overlap);
        if self.config.add_chunk_markers {
            append_markers(&mut chunks);
        }

        tracing::debug!(
            sections = sections.len(),
            chunks = chunks.len(),
            chunk_size = self.config.chunk_size,
            overlap = self.config.chunk_overlap,
            has_frontmatter = frontmatter.is_some(),
            "Chunked document"
        );

        ChunkedDocument {
            frontmatter,
            chunks,
        }
    }
}

/// Chunk `content` with a one-off configuration.
pub fn chunk(content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, ChunkingError> {
    Ok(Chunker::new(config.clone())?.chunk(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(chunk_size: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            chunk_overlap: 0,
            respect_headings: true,
            add_chunk_markers: false,
        }
    }

    #[test]
    fn splits_by_heading_sections() {
        let chunks = chunk("# A\n\nshort\n\n# B\n\nshort2", &plain(100)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.section_title, "A");
        assert_eq!(chunks[1].metadata.section_title, "B");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[0].content, "# A\n\nshort");
        assert_eq!(chunks[1].metadata.section_index, 1);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk("", &ChunkingConfig::default()).unwrap().is_empty());
        assert!(chunk("  \n\n ", &ChunkingConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn headings_ignored_when_disabled() {
        let config = ChunkingConfig {
            respect_headings: false,
            ..plain(100)
        };
        let chunks = chunk("# A\nx\n# B\ny", &config).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.section_title, "");
        assert_eq!(chunks[0].metadata.heading_path, vec!["A", "B"]);
    }

    #[test]
    fn offsets_are_section_relative_character_counts() {
        let chunks = chunk("# Ü\nääää\nbbbb", &plain(9)).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].start_char, chunks[0].end_char), (0, 8));
        assert_eq!((chunks[1].start_char, chunks[1].end_char), (9, 13));
    }

    #[test]
    fn frontmatter_is_returned_not_chunked() {
        let chunker = Chunker::new(plain(100)).unwrap();
        let document = chunker.chunk_document("---\ntitle: x\n---\nbody text");
        assert_eq!(document.frontmatter.as_deref(), Some("title: x"));
        assert_eq!(document.chunks.len(), 1);
        assert_eq!(document.chunks[0].content, "body text");
    }

    #[test]
    fn overlap_then_markers_decorate_in_order() {
        let config = ChunkingConfig {
            chunk_size: 20,
            chunk_overlap: 10,
            respect_headings: false,
            add_chunk_markers: true,
        };
        let chunks = chunk("first line here\nsecond line here", &config).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[1].content,
            "[...] line here\n\nsecond line here\n\n<!-- chunk_boundary: 1 -->"
        );
        assert_eq!(chunks[1].start_char, 16);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 10,
            ..ChunkingConfig::default()
        };
        assert!(matches!(
            Chunker::new(config),
            Err(ChunkingError::InvalidOverlap { .. })
        ));
    }
}
