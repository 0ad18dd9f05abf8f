use std::time::Duration;

use super::chunker::SlidingChunker;
use super::embedding::{Embedder, EmbeddingError, RetryingEmbedder};
use super::extraction::PdfExtractor;
use super::generation::TextGenerator;
use super::index::VectorIndex;
use super::retrieval::{self, Section, SectionText, DEFAULT_RETRIEVE_K, DEFAULT_SUMMARIZE_K};
use super::PipelineError;

/// Default passage window and overlap, in characters.
pub const DEFAULT_CHUNK_CHARS: usize = 1000;
pub const DEFAULT_OVERLAP_CHARS: usize = 100;

const EMBED_ATTEMPTS: usize = 2;
const EMBED_BACKOFF: Duration = Duration::from_millis(500);

/// The four populated section texts, in template order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcfSections {
    pub purpose: SectionText,
    pub procedure: SectionText,
    pub risks: SectionText,
    pub benefits: SectionText,
}

impl IcfSections {
    pub fn get(&self, section: Section) -> &SectionText {
        match section {
            Section::Purpose => &self.purpose,
            Section::Procedure => &self.procedure,
            Section::Risks => &self.risks,
            Section::Benefits => &self.benefits,
        }
    }

    /// Sections in the fixed order the assembler writes them.
    pub fn in_order(&self) -> [&SectionText; 4] {
        [&self.purpose, &self.procedure, &self.risks, &self.benefits]
    }
}

/// Drives one document through extract → chunk → embed → index → retrieve.
///
/// Each upload owns its own pipeline instance; no index, passage set, or
/// embedding cache is shared across requests.
pub struct IcfPipeline<X, E, G> {
    extractor: X,
    embedder: E,
    /// When present, section text is an abstractive summary of the
    /// retrieved passages instead of their raw concatenation.
    summarizer: Option<G>,
    chunker: SlidingChunker,
    retrieve_k: usize,
    summarize_k: usize,
}

impl<X: PdfExtractor, E: Embedder, G: TextGenerator> IcfPipeline<X, E, G> {
    pub fn new(extractor: X, embedder: E, summarizer: Option<G>) -> Self {
        Self {
            extractor,
            embedder,
            summarizer,
            chunker: SlidingChunker::new(DEFAULT_CHUNK_CHARS, DEFAULT_OVERLAP_CHARS),
            retrieve_k: DEFAULT_RETRIEVE_K,
            summarize_k: DEFAULT_SUMMARIZE_K,
        }
    }

    pub fn with_chunking(mut self, chunk_chars: usize, overlap_chars: usize) -> Self {
        self.chunker = SlidingChunker::new(chunk_chars, overlap_chars);
        self
    }

    pub fn with_top_k(mut self, retrieve_k: usize, summarize_k: usize) -> Self {
        self.retrieve_k = retrieve_k;
        self.summarize_k = summarize_k;
        self
    }

    /// Run the full pipeline over one uploaded document.
    ///
    /// Either all four sections are produced or the pipeline fails; no
    /// partial output.
    pub fn run(&self, document_bytes: &[u8]) -> Result<IcfSections, PipelineError> {
        let pages = self.extractor.extract_pages(document_bytes)?;
        tracing::debug!(pages = pages.len(), "extracted page text");

        let mut passages = self.chunker.chunk_pages(&pages);
        if passages.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }
        tracing::debug!(passages = passages.len(), "chunked document");

        // Every embedding call, batch and per-section query, goes through
        // the same bounded retry policy.
        let embedder = RetryingEmbedder::new(&self.embedder, EMBED_ATTEMPTS, EMBED_BACKOFF);

        // One wide embedding call for the whole passage set; a call per
        // passage would pay hundreds of network round-trips.
        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts)?;

        if embeddings.len() != passages.len() {
            return Err(PipelineError::EmbeddingService(
                EmbeddingError::CountMismatch {
                    sent: passages.len(),
                    received: embeddings.len(),
                },
            ));
        }

        for (passage, embedding) in passages.iter_mut().zip(embeddings) {
            passage.embedding = Some(embedding);
        }

        let index = VectorIndex::build(passages)?;
        tracing::debug!(indexed = index.len(), "vector index built");

        Ok(IcfSections {
            purpose: self.section_text(Section::Purpose, &embedder, &index)?,
            procedure: self.section_text(Section::Procedure, &embedder, &index)?,
            risks: self.section_text(Section::Risks, &embedder, &index)?,
            benefits: self.section_text(Section::Benefits, &embedder, &index)?,
        })
    }

    fn section_text(
        &self,
        section: Section,
        embedder: &dyn Embedder,
        index: &VectorIndex,
    ) -> Result<SectionText, PipelineError> {
        let text = match &self.summarizer {
            Some(generator) => {
                retrieval::summarize(section, embedder, index, generator, self.summarize_k)?
            }
            None => retrieval::retrieve(section, embedder, index, self.retrieve_k)?,
        };
        Ok(text)
    }
}
