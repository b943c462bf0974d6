//! Indexing pipeline: processed text to embedded, de-duplicated chunks.
//!
//! The pipeline is the caller that ties the two core components together without either knowing
//! about the other: batch results come in as text, chunks with vectors come out, ready for a
//! vector store adapter.

mod dedupe;

pub use dedupe::compute_chunk_hash;

use crate::{
    batch::FileOutcome,
    chunking::{Chunk, Chunker, ChunkingConfig, ChunkingError},
    embedding::{EmbeddingClient, EmbeddingClientError},
};
use dedupe::dedupe_chunks;
use serde::Serialize;
use thiserror::Error;

/// Errors emitted by the indexing pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Chunker configuration was rejected.
    #[error("Failed to configure chunker: {0}")]
    Chunking(#[from] ChunkingError),
    /// Embedding provider failed to produce vectors for the chunks.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Embedding provider returned the wrong number of vectors.
    #[error("Embedding count mismatch: expected {expected}, got {actual}")]
    EmbeddingCountMismatch {
        /// Number of chunks sent for embedding.
        expected: usize,
        /// Number of vectors returned.
        actual: usize,
    },
}

/// A chunk with its digest and embedding vector.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedChunk {
    /// Chunk produced by the chunker.
    pub chunk: Chunk,
    /// SHA-256 hex digest of the chunk content.
    pub chunk_hash: String,
    /// Embedding of the chunk content.
    pub vector: Vec<f32>,
}

/// Indexing-ready view of one document.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedDocument {
    /// Identifier of the source document.
    pub source: String,
    /// Frontmatter stripped before chunking.
    pub frontmatter: Option<String>,
    /// Unique chunks in document order.
    pub chunks: Vec<PreparedChunk>,
    /// Chunks dropped because their content repeated an earlier chunk.
    pub skipped_duplicates: usize,
}

/// Coordinates chunking, de-duplication, and embedding for processed documents.
pub struct IndexingPipeline {
    chunker: Chunker,
    embedding_client: Box<dyn EmbeddingClient>,
}

impl IndexingPipeline {
    /// Build a pipeline from a chunking configuration and an embedding backend.
    pub fn new(
        config: ChunkingConfig,
        embedding_client: Box<dyn EmbeddingClient>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            chunker: Chunker::new(config)?,
            embedding_client,
        })
    }

    /// Chunk, de-duplicate, and embed one document.
    pub async fn prepare(&self, source: &str, text: &str) -> Result<PreparedDocument, PipelineError> {
        let document = self.chunker.chunk_document(text);
        let (chunks, skipped_duplicates) = dedupe_chunks(document.chunks);

        let texts: Vec<String> = chunks
            .iter()
            .map(|(chunk, _)| chunk.content.clone())
            .collect();
        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedding_client.generate_embeddings(texts).await?
        };

        if vectors.len() != chunks.len() {
            return Err(PipelineError::EmbeddingCountMismatch {
                expected: chunks.len(),
                actual: vectors.len(),
            });
        }

        let chunks: Vec<PreparedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|((chunk, chunk_hash), vector)| PreparedChunk {
                chunk,
                chunk_hash,
                vector,
            })
            .collect();

        tracing::info!(
            source,
            chunks = chunks.len(),
            skipped_duplicates,
            "Document prepared for indexing"
        );

        Ok(PreparedDocument {
            source: source.to_string(),
            frontmatter: document.frontmatter,
            chunks,
            skipped_duplicates,
        })
    }

    /// Prepare every successful outcome of a batch, preserving input order.
    pub async fn prepare_outcomes(
        &self,
        outcomes: &[Option<FileOutcome>],
    ) -> Result<Vec<PreparedDocument>, PipelineError> {
        let mut documents = Vec::with_capacity(outcomes.len());
        for outcome in outcomes.iter().flatten() {
            documents.push(self.prepare(&outcome.file, &outcome.content).await?);
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbeddingClient;
    use async_trait::async_trait;

    fn config() -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: 40,
            chunk_overlap: 0,
            respect_headings: true,
            add_chunk_markers: false,
        }
    }

    #[tokio::test]
    async fn embeds_every_unique_chunk() {
        let pipeline =
            IndexingPipeline::new(config(), Box::new(HashEmbeddingClient::new(16))).unwrap();
        let document = pipeline
            .prepare(
                "guide.md",
                "---\nauthor: me\n---\n# Intro\nhello\n# Usage\nrun it",
            )
            .await
            .unwrap();

        assert_eq!(document.source, "guide.md");
        assert_eq!(document.frontmatter.as_deref(), Some("author: me"));
        assert_eq!(document.chunks.len(), 2);
        assert_eq!(document.skipped_duplicates, 0);
        for prepared in &document.chunks {
            assert_eq!(prepared.vector.len(), 16);
            assert_eq!(prepared.chunk_hash, compute_chunk_hash(&prepared.chunk.content));
        }
    }

    #[tokio::test]
    async fn skips_repeated_sections() {
        let pipeline =
            IndexingPipeline::new(config(), Box::new(HashEmbeddingClient::new(4))).unwrap();
        let document = pipeline
            .prepare("dup.md", "# Same\nbody\n# Same\nbody")
            .await
            .unwrap();
        assert_eq!(document.chunks.len(), 1);
        assert_eq!(document.skipped_duplicates, 1);
    }

    #[tokio::test]
    async fn empty_text_needs_no_embeddings() {
        let pipeline =
            IndexingPipeline::new(config(), Box::new(HashEmbeddingClient::new(4))).unwrap();
        let document = pipeline.prepare("empty.txt", "").await.unwrap();
        assert!(document.chunks.is_empty());
    }

    #[tokio::test]
    async fn prepares_only_successful_outcomes() {
        let pipeline =
            IndexingPipeline::new(config(), Box::new(HashEmbeddingClient::new(4))).unwrap();
        let outcomes = vec![
            Some(FileOutcome {
                file: "a.md".to_string(),
                content: "alpha".to_string(),
            }),
            None,
            Some(FileOutcome {
                file: "c.md".to_string(),
                content: "gamma".to_string(),
            }),
        ];
        let documents = pipeline.prepare_outcomes(&outcomes).await.unwrap();
        let sources: Vec<&str> = documents.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(sources, vec!["a.md", "c.md"]);
    }

    struct NoVectors;

    #[async_trait]
    impl EmbeddingClient for NoVectors {
        async fn generate_embeddings(
            &self,
            _texts: Vec<String>,
        ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn detects_missing_vectors() {
        let pipeline = IndexingPipeline::new(config(), Box::new(NoVectors)).unwrap();
        let error = pipeline.prepare("x.md", "text").await.unwrap_err();
        assert!(matches!(
            error,
            PipelineError::EmbeddingCountMismatch {
                expected: 1,
                actual: 0
            }
        ));
    }

    #[test]
    fn rejects_invalid_chunking_config() {
        let invalid = ChunkingConfig {
            chunk_size: 0,
            ..config()
        };
        assert!(matches!(
            IndexingPipeline::new(invalid, Box::new(HashEmbeddingClient::default())),
            Err(PipelineError::Chunking(ChunkingError::InvalidChunkSize))
        ));
    }
}
