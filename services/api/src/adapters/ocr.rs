//! services/api/src/adapters/ocr.rs
//!
//! OCR backends implementing the `OcrEngine` port from the `core` crate.
//! The Tesseract backend is only compiled with the `ocr` feature; the
//! default build wires in `DisabledOcr`, which reports the backend as
//! unavailable so image extraction fails cleanly instead of crashing.

use studium_core::ports::{ExtractionError, OcrEngine};

/// Tesseract-backed OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct TesseractOcr {
    languages: String,
}

#[cfg(feature = "ocr")]
impl TesseractOcr {
    /// Create an engine using the system tessdata location.
    /// `languages` follows the Tesseract convention, e.g. "spa+eng".
    pub fn new(languages: &str) -> Self {
        Self {
            languages: languages.to_string(),
        }
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractOcr {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, ExtractionError> {
        let tess = tesseract::Tesseract::new(None, Some(&self.languages))
            .map_err(|e| ExtractionError::ExtractionFailed(format!("OCR init failed: {e:?}")))?;

        let mut tess = tess
            .set_image_from_mem(image_bytes)
            .map_err(|e| ExtractionError::ExtractionFailed(format!("OCR rejected image: {e:?}")))?;

        tess.get_text()
            .map_err(|e| ExtractionError::ExtractionFailed(format!("OCR processing failed: {e:?}")))
    }
}

/// Stand-in OCR engine for builds without the `ocr` feature.
///
/// Every call reports `ExtractionFailed`, which the extraction pipeline
/// records on the document; the caller may retry after enabling a backend
/// or fall back to manual text entry.
pub struct DisabledOcr;

impl OcrEngine for DisabledOcr {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, ExtractionError> {
        Err(ExtractionError::ExtractionFailed(
            "no OCR backend is available; rebuild with the `ocr` feature".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_ocr_reports_extraction_failed() {
        let result = DisabledOcr.recognize(b"png bytes");
        assert!(matches!(result, Err(ExtractionError::ExtractionFailed(_))));
    }
}
