pub mod chunker;
pub mod embedding;
pub mod extraction;
pub mod generation;
pub mod index;
pub mod orchestrator;
pub mod retrieval;
pub mod retry;

use thiserror::Error;

use embedding::EmbeddingError;
use extraction::ExtractionError;
use index::IndexError;

/// Pipeline-level failure, tagged by the stage that failed so the caller
/// can decide between retry and a user-facing error.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("document extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("document contains no extractable text")]
    EmptyCorpus,

    #[error("embedding service failed: {0}")]
    EmbeddingService(#[from] EmbeddingError),

    // Generation failures never reach this level: section summarization
    // falls back to the retrieved passages instead of failing the run.
    #[error("vector index error: {0}")]
    Index(IndexError),
}

impl From<IndexError> for PipelineError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::EmptyCorpus => PipelineError::EmptyCorpus,
            other => PipelineError::Index(other),
        }
    }
}
