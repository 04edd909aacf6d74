//! services/api/src/extraction/mod.rs
//!
//! The document extraction pipeline: direct text-layer extraction for PDFs,
//! OCR for images and for PDF pages without a usable text layer.
//!
//! The orchestrator takes trait objects for PDF parsing, OCR and page
//! rendering, so each backend can be swapped or mocked independently.

pub mod pdf;
pub mod renderer;

pub use pdf::PdfTextExtractor;
pub use renderer::EmbeddedImageRenderer;

use studium_core::domain::MediaType;
use studium_core::ports::{ExtractionError, OcrEngine};

/// A PDF page falls back to OCR below this many characters of text layer.
const MIN_PAGE_CHARS: usize = 20;

/// Per-page text extraction abstraction.
pub trait PdfExtractor: Send + Sync {
    /// Extract the text layer of every page, in page order.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// Renders one PDF page to encoded image bytes for OCR.
pub trait PdfPageRenderer: Send + Sync {
    fn render_page(&self, pdf_bytes: &[u8], page_index: usize) -> Result<Vec<u8>, ExtractionError>;
}

/// Output of one extraction attempt.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub word_count: usize,
    pub page_count: usize,
}

//=========================================================================================
// The Orchestrator
//=========================================================================================

/// Concrete implementation of the extraction pipeline.
/// Uses trait objects for OCR and PDF handling, enabling dependency injection.
pub struct DocumentExtractor {
    pdf: Box<dyn PdfExtractor>,
    ocr: Box<dyn OcrEngine>,
    renderer: Option<Box<dyn PdfPageRenderer>>,
}

impl DocumentExtractor {
    pub fn new(pdf: Box<dyn PdfExtractor>, ocr: Box<dyn OcrEngine>) -> Self {
        Self {
            pdf,
            ocr,
            renderer: None,
        }
    }

    /// Add a page renderer for per-page OCR of scanned PDFs.
    pub fn with_renderer(mut self, renderer: Box<dyn PdfPageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Extract plain text from a document.
    ///
    /// Does not retry internally; the caller owns the retry policy, and the
    /// registry records exactly one outcome per attempt.
    pub fn extract(
        &self,
        bytes: &[u8],
        media_type: MediaType,
    ) -> Result<ExtractedText, ExtractionError> {
        let (raw_text, page_count) = match media_type {
            MediaType::Pdf => self.extract_pdf(bytes)?,
            MediaType::Image => (self.ocr.recognize(bytes)?, 1),
        };

        let text = clean_text(&raw_text);
        let word_count = text.split_whitespace().count();
        if word_count == 0 {
            return Err(ExtractionError::ExtractionFailed(
                "no text could be extracted from the document".to_string(),
            ));
        }

        tracing::info!(
            pages = page_count,
            words = word_count,
            chars = text.len(),
            "text extraction complete"
        );

        Ok(ExtractedText {
            text,
            word_count,
            page_count,
        })
    }

    /// Per-page extraction: keep the text layer where it is usable, otherwise
    /// render the page to an image and OCR it. Page order is preserved.
    fn extract_pdf(&self, bytes: &[u8]) -> Result<(String, usize), ExtractionError> {
        let pages = self.pdf.extract_pages(bytes)?;
        let page_count = pages.len();

        let mut texts = Vec::with_capacity(page_count);
        for (page_idx, page_text) in pages.into_iter().enumerate() {
            if page_text.trim().len() >= MIN_PAGE_CHARS {
                texts.push(page_text);
                continue;
            }

            let ocr_text = match &self.renderer {
                Some(renderer) => {
                    let page_image = renderer.render_page(bytes, page_idx)?;
                    self.ocr.recognize(&page_image)?
                }
                None => {
                    // Degraded path: no renderer, hand the raw bytes to the
                    // OCR engine (works for single-page image-only PDFs at best).
                    tracing::warn!(
                        page = page_idx + 1,
                        "no PDF renderer available, running OCR on raw PDF bytes"
                    );
                    self.ocr.recognize(bytes)?
                }
            };
            texts.push(ocr_text);
        }

        Ok((texts.join("\n"), page_count))
    }
}

/// Normalize extracted text: collapse whitespace runs and trim.
pub fn clean_text(text: &str) -> String {
    let ws = regex::Regex::new(r"\s+").unwrap();
    ws.replace_all(text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockPdf {
        pages: Vec<String>,
    }

    impl PdfExtractor for MockPdf {
        fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
            Ok(self.pages.clone())
        }
    }

    struct FailingPdf;

    impl PdfExtractor for FailingPdf {
        fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
            Err(ExtractionError::CorruptInput("not a pdf".into()))
        }
    }

    /// OCR mock that counts invocations and returns a fixed text.
    struct MockOcr {
        text: String,
        calls: Arc<AtomicUsize>,
    }

    impl MockOcr {
        fn new(text: &str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    text: text.to_string(),
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl studium_core::ports::OcrEngine for MockOcr {
        fn recognize(&self, _image_bytes: &[u8]) -> Result<String, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    struct MockRenderer {
        calls: Arc<AtomicUsize>,
    }

    impl PdfPageRenderer for MockRenderer {
        fn render_page(
            &self,
            _pdf_bytes: &[u8],
            _page_index: usize,
        ) -> Result<Vec<u8>, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(b"fake png".to_vec())
        }
    }

    #[test]
    fn image_runs_ocr_exactly_once_and_keeps_output() {
        let (ocr, calls) = MockOcr::new("  Hola   mundo  ");
        let extractor = DocumentExtractor::new(Box::new(MockPdf { pages: vec![] }), Box::new(ocr));

        let result = extractor.extract(b"jpeg bytes", MediaType::Image).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.text, "Hola mundo");
        assert_eq!(result.word_count, 2);
        assert_eq!(result.page_count, 1);
    }

    #[test]
    fn pdf_with_text_layer_never_touches_ocr() {
        let (ocr, calls) = MockOcr::new("unused");
        let pages = vec![
            "La célula es la unidad básica de la vida.".to_string(),
            "Las mitocondrias producen energía en forma de ATP.".to_string(),
        ];
        let extractor = DocumentExtractor::new(Box::new(MockPdf { pages }), Box::new(ocr));

        let result = extractor.extract(b"pdf bytes", MediaType::Pdf).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(result.text.contains("mitocondrias"));
        assert_eq!(result.page_count, 2);
    }

    #[test]
    fn short_pdf_page_falls_back_to_rendered_ocr() {
        let (ocr, ocr_calls) = MockOcr::new("Texto reconocido por OCR");
        let render_calls = Arc::new(AtomicUsize::new(0));
        let pages = vec![
            "Una página con un texto embebido suficientemente largo.".to_string(),
            " ".to_string(),
        ];
        let extractor = DocumentExtractor::new(Box::new(MockPdf { pages }), Box::new(ocr))
            .with_renderer(Box::new(MockRenderer {
                calls: render_calls.clone(),
            }));

        let result = extractor.extract(b"pdf bytes", MediaType::Pdf).unwrap();
        assert_eq!(render_calls.load(Ordering::SeqCst), 1, "only the empty page is rendered");
        assert_eq!(ocr_calls.load(Ordering::SeqCst), 1);
        assert!(result.text.contains("texto embebido"));
        assert!(result.text.contains("Texto reconocido por OCR"));
    }

    #[test]
    fn corrupt_pdf_is_reported_as_corrupt_input() {
        let (ocr, _) = MockOcr::new("unused");
        let extractor = DocumentExtractor::new(Box::new(FailingPdf), Box::new(ocr));
        let result = extractor.extract(b"garbage", MediaType::Pdf);
        assert!(matches!(result, Err(ExtractionError::CorruptInput(_))));
    }

    #[test]
    fn whitespace_only_output_fails_extraction() {
        let (ocr, _) = MockOcr::new(" \n \t ");
        let extractor = DocumentExtractor::new(Box::new(MockPdf { pages: vec![] }), Box::new(ocr));
        let result = extractor.extract(b"img", MediaType::Image);
        assert!(matches!(result, Err(ExtractionError::ExtractionFailed(_))));
    }

    #[test]
    fn clean_text_collapses_whitespace_runs() {
        assert_eq!(clean_text("  a \n\n b\t\tc  "), "a b c");
        assert_eq!(clean_text("hola"), "hola");
        assert_eq!(clean_text("   "), "");
    }
}
