pub mod pdf;
pub mod types;

pub use pdf::PdfTextExtractor;
pub use types::{PageDocument, PdfExtractor};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("unsupported document format")]
    UnsupportedFormat,
}
