//! Document processing backends: raw document in, decoded text out.
//!
//! The batch coordinator only sees the [`DocumentProcessor`] trait. Format converters (DOCX,
//! XLSX, PDF, ...) live behind it as separate implementations chosen at construction time.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by document processors.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The backend cannot handle this kind of document.
    #[error("Unsupported document '{0}'")]
    Unsupported(String),
    /// Reading the source failed.
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
    /// Document bytes were not valid UTF-8.
    #[error("Document '{name}' is not valid UTF-8: {source}")]
    Decoding {
        /// Identifier of the offending document.
        name: String,
        /// Underlying decoding error.
        #[source]
        source: std::str::Utf8Error,
    },
    /// Any other backend failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// One document submitted for processing.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    /// Document stored on the local filesystem.
    Path(PathBuf),
    /// Document already held in memory.
    Bytes {
        /// File name used for format detection and error reporting.
        name: String,
        /// Raw document bytes.
        data: Vec<u8>,
    },
}

impl DocumentInput {
    /// Reference a file on disk.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Wrap in-memory bytes with a file name.
    pub fn bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Identifier used to key per-file errors.
    pub fn identifier(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Bytes { name, .. } => name.clone(),
        }
    }

    /// Lower-cased file extension, if any.
    pub fn extension(&self) -> Option<String> {
        let name = match self {
            Self::Path(path) => path.file_name()?.to_string_lossy().into_owned(),
            Self::Bytes { name, .. } => name.clone(),
        };
        let (stem, extension) = name.rsplit_once('.')?;
        (!stem.is_empty()).then(|| extension.to_ascii_lowercase())
    }
}

/// Interface implemented by document conversion backends.
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    /// Convert one document into text.
    async fn process(&self, input: &DocumentInput) -> Result<String, ProcessorError>;
}

/// Extensions handled by [`PlainTextProcessor`].
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text", "csv", "log"];

/// Backend for documents that are already UTF-8 text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextProcessor;

impl PlainTextProcessor {
    /// Construct a new plain-text processor.
    pub const fn new() -> Self {
        Self
    }

    fn decode(name: String, data: &[u8]) -> Result<String, ProcessorError> {
        tracing::trace!(document = %name, bytes = data.len(), "Decoding plain-text document");
        std::str::from_utf8(data)
            .map(str::to_owned)
            .map_err(|source| ProcessorError::Decoding { name, source })
    }
}

#[async_trait]
impl DocumentProcessor for PlainTextProcessor {
    async fn process(&self, input: &DocumentInput) -> Result<String, ProcessorError> {
        let name = input.identifier();
        match input.extension() {
            Some(extension) if TEXT_EXTENSIONS.contains(&extension.as_str()) => {}
            None => {}
            Some(_) => return Err(ProcessorError::Unsupported(name)),
        }

        match input {
            DocumentInput::Path(path) => {
                let data = tokio::fs::read(path).await?;
                Self::decode(name, &data)
            }
            DocumentInput::Bytes { data, .. } => Self::decode(name, data),
        }
    }
}

/// Build the default processor for the current configuration.
pub fn get_document_processor() -> Box<dyn DocumentProcessor> {
    Box::new(PlainTextProcessor::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_and_extensions() {
        let on_disk = DocumentInput::path("/tmp/notes/Report.MD");
        assert_eq!(on_disk.identifier(), "/tmp/notes/Report.MD");
        assert_eq!(on_disk.extension().as_deref(), Some("md"));

        let in_memory = DocumentInput::bytes("data.csv", b"a,b".to_vec());
        assert_eq!(in_memory.identifier(), "data.csv");
        assert_eq!(in_memory.extension().as_deref(), Some("csv"));

        assert_eq!(DocumentInput::bytes(".env", Vec::new()).extension(), None);
        assert_eq!(DocumentInput::bytes("README", Vec::new()).extension(), None);
    }

    #[tokio::test]
    async fn decodes_in_memory_text() {
        let input = DocumentInput::bytes("notes.txt", "héllo".as_bytes().to_vec());
        let text = PlainTextProcessor::new().process(&input).await.unwrap();
        assert_eq!(text, "héllo");
    }

    #[tokio::test]
    async fn rejects_binary_formats_and_invalid_utf8() {
        let processor = PlainTextProcessor::new();

        let docx = DocumentInput::bytes("report.docx", vec![0x50, 0x4b]);
        assert!(matches!(
            processor.process(&docx).await,
            Err(ProcessorError::Unsupported(name)) if name == "report.docx"
        ));

        let garbage = DocumentInput::bytes("broken.txt", vec![0xff, 0xfe, 0xfd]);
        assert!(matches!(
            processor.process(&garbage).await,
            Err(ProcessorError::Decoding { .. })
        ));
    }

    #[tokio::test]
    async fn default_processor_handles_text() {
        let input = DocumentInput::bytes("notes.md", "# Notes");
        let text = get_document_processor().process(&input).await.unwrap();
        assert_eq!(text, "# Notes");
    }

    #[tokio::test]
    async fn reads_files_from_disk() {
        let path = std::env::temp_dir().join(format!("docflow-{}.md", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, "# Title\nbody").await.unwrap();

        let text = PlainTextProcessor::new()
            .process(&DocumentInput::path(&path))
            .await
            .unwrap();
        assert_eq!(text, "# Title\nbody");

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let missing = DocumentInput::path("/definitely/not/here.txt");
        assert!(matches!(
            PlainTextProcessor::new().process(&missing).await,
            Err(ProcessorError::Io(_))
        ));
    }
}
