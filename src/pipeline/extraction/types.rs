use super::ExtractionError;

/// Text of a single protocol page, ordered by `page_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    pub page_index: usize,
    pub text: String,
}

/// Extracts page-level text from an uploaded document.
pub trait PdfExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageDocument>, ExtractionError>;
}
