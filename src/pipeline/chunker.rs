use super::extraction::PageDocument;

/// A bounded slice of one protocol page, the unit of embedding and retrieval.
#[derive(Debug, Clone)]
pub struct Passage {
    pub source_page: usize,
    /// Character offset of the passage within its page.
    pub start_offset: usize,
    pub text: String,
    /// Populated exactly once by the batch embedding step.
    pub embedding: Option<Vec<f32>>,
}

/// Fixed-size sliding-window chunker.
///
/// Windows are measured in characters and never cross a page boundary;
/// consecutive windows within a page share exactly `overlap_chars`
/// characters. Losing cross-page context at page boundaries is a known
/// limitation of the provenance model.
pub struct SlidingChunker {
    chunk_chars: usize,
    overlap_chars: usize,
}

impl SlidingChunker {
    /// `overlap_chars` must be strictly smaller than `chunk_chars`.
    pub fn new(chunk_chars: usize, overlap_chars: usize) -> Self {
        assert!(chunk_chars > 0, "chunk size must be positive");
        assert!(
            overlap_chars < chunk_chars,
            "overlap must be smaller than chunk size"
        );
        Self {
            chunk_chars,
            overlap_chars,
        }
    }

    /// Chunk every page, preserving page order. Pages with only whitespace
    /// yield no passages.
    pub fn chunk_pages(&self, pages: &[PageDocument]) -> Vec<Passage> {
        pages.iter().flat_map(|p| self.chunk_page(p)).collect()
    }

    fn chunk_page(&self, page: &PageDocument) -> Vec<Passage> {
        if page.text.trim().is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary plus the end of the string,
        // so windows can be sliced without splitting a code point.
        let boundaries: Vec<usize> = page
            .text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(page.text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;

        let step = self.chunk_chars - self.overlap_chars;
        let mut passages = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_chars).min(total_chars);
            passages.push(Passage {
                source_page: page.page_index,
                start_offset: start,
                text: page.text[boundaries[start]..boundaries[end]].to_string(),
                embedding: None,
            });
            if end == total_chars {
                break;
            }
            start += step;
        }

        passages
    }
}
