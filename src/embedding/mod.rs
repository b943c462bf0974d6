use async_trait::async_trait;
use thiserror::Error;

/// Default dimensionality of vectors produced by [`HashEmbeddingClient`].
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for each supplied chunk of text.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;
}

/// Deterministic offline embedding client that hashes bytes into a normalized vector.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbeddingClient {
    dimension: usize,
}

impl HashEmbeddingClient {
    /// Construct a client producing vectors of `dimension` components.
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn encode(text: &str, dimension: usize) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; dimension];

        if text.is_empty() {
            return embedding;
        }

        for (idx, byte) in text.bytes().enumerate() {
            let position = idx % dimension;
            embedding[position] += f32::from(byte) / 255.0;
        }

        let norm = embedding
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt();

        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

impl Default for HashEmbeddingClient {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingClient for HashEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        tracing::debug!(
            dimension = self.dimension,
            texts = texts.len(),
            "Generating embeddings"
        );

        if self.dimension == 0 {
            return Err(EmbeddingClientError::GenerationFailed(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }

        if texts.is_empty() {
            return Err(EmbeddingClientError::GenerationFailed(
                "no texts provided".to_string(),
            ));
        }

        Ok(texts
            .into_iter()
            .map(|text| Self::encode(&text, self.dimension))
            .collect())
    }
}

/// Build an embedding client for the given dimensionality.
pub fn get_embedding_client(dimension: usize) -> Box<dyn EmbeddingClient> {
    Box::new(HashEmbeddingClient::new(dimension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn produces_unit_vectors_of_requested_size() {
        let client = HashEmbeddingClient::new(8);
        let vectors = client
            .generate_embeddings(vec!["hello".to_string(), "world".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        for vector in &vectors {
            assert_eq!(vector.len(), 8);
            let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn is_deterministic() {
        let client = HashEmbeddingClient::default();
        let first = client
            .generate_embeddings(vec!["same".to_string()])
            .await
            .unwrap();
        let second = client
            .generate_embeddings(vec!["same".to_string()])
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn rejects_empty_requests_and_zero_dimension() {
        assert!(
            HashEmbeddingClient::default()
                .generate_embeddings(Vec::new())
                .await
                .is_err()
        );
        assert!(
            HashEmbeddingClient::new(0)
                .generate_embeddings(vec!["x".to_string()])
                .await
                .is_err()
        );
    }
}
