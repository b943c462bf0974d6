#![deny(missing_docs)]

//! Core library for DocFlow: heading-aware chunking and concurrent batch processing of
//! documents for retrieval indexing.

/// Batch job coordination over a bounded worker pool.
pub mod batch;
/// Heading-aware, size-bounded text chunking.
pub mod chunking;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Structured logging and tracing setup.
pub mod logging;
/// Batch activity metrics.
pub mod metrics;
/// Chunk, de-duplicate, and embed processed documents.
pub mod pipeline;
/// Document processor abstraction and the plain-text backend.
pub mod processor;
