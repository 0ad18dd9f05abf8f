use super::types::{PageDocument, PdfExtractor};
use super::ExtractionError;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital protocols with embedded text layers; scanned documents
/// without one come back empty and surface as an empty corpus downstream.
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageDocument>, ExtractionError> {
        let page_texts = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

        Ok(page_texts
            .into_iter()
            .enumerate()
            .map(|(page_index, text)| PageDocument { page_index, text })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Generate a valid PDF with one page per text, using lopdf
    /// (the library pdf-extract uses internally).
    fn make_test_pdf(page_texts: &[&str]) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut page_ids = Vec::new();
        for text in page_texts {
            // Page content stream: BT /F1 12 Tf (text) Tj ET
            let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

            let resources = dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            };

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => resources,
            });
            page_ids.push(page_id);
        }

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|&id| id.into()).collect::<Vec<Object>>(),
            "Count" => page_ids.len() as i64,
        });

        for &page_id in &page_ids {
            if let Ok(page) = doc.get_object_mut(page_id) {
                if let Object::Dictionary(ref mut dict) = page {
                    dict.set("Parent", pages_id);
                }
            }
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn extracts_text_from_digital_pdf() {
        let pdf_bytes = make_test_pdf(&["The purpose of this study is to evaluate the drug"]);
        let pages = PdfTextExtractor.extract_pages(&pdf_bytes).unwrap();

        assert!(!pages.is_empty(), "should extract at least one page");
        let full_text: String = pages.iter().map(|p| p.text.clone()).collect();
        assert!(
            full_text.contains("purpose") || full_text.contains("study"),
            "expected protocol text, got: {full_text}"
        );
    }

    #[test]
    fn pages_are_indexed_in_order() {
        let pdf_bytes = make_test_pdf(&["first page content", "second page content"]);
        let pages = PdfTextExtractor.extract_pages(&pdf_bytes).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_index, 0);
        assert_eq!(pages[1].page_index, 1);
        assert!(pages[0].text.contains("first"));
        assert!(pages[1].text.contains("second"));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let result = PdfTextExtractor.extract_pages(b"not a pdf");
        assert!(matches!(result, Err(ExtractionError::PdfParsing(_))));
    }
}
