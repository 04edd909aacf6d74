//! services/api/src/extraction/renderer.rs
//!
//! PDF page-to-image extraction using lopdf.
//!
//! Scanned PDFs typically carry each page as one large image XObject
//! (JPEG or Flate-compressed pixels). This renderer pulls that image out and
//! re-encodes it as PNG for the OCR engine, without needing a native PDF
//! rasterizer.

use lopdf::{Document, Object, ObjectId};

use studium_core::ports::ExtractionError;

use super::PdfPageRenderer;

/// Extracts the dominant embedded image of a PDF page.
pub struct EmbeddedImageRenderer;

impl PdfPageRenderer for EmbeddedImageRenderer {
    fn render_page(&self, pdf_bytes: &[u8], page_index: usize) -> Result<Vec<u8>, ExtractionError> {
        let doc = Document::load_mem(pdf_bytes)
            .map_err(|e| ExtractionError::CorruptInput(format!("failed to parse PDF: {e}")))?;

        let page_ids: Vec<ObjectId> = doc.page_iter().collect();
        let &page_id = page_ids.get(page_index).ok_or_else(|| {
            ExtractionError::CorruptInput(format!(
                "page {} not found (PDF has {} pages)",
                page_index + 1,
                page_ids.len()
            ))
        })?;

        let image_bytes = extract_largest_page_image(&doc, page_id)?;

        // Validate and re-encode to PNG for the OCR pipeline.
        let img = image::load_from_memory(&image_bytes).map_err(|e| {
            ExtractionError::ExtractionFailed(format!("failed to decode page image: {e}"))
        })?;

        let mut png_buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png_buf, image::ImageFormat::Png)
            .map_err(|e| ExtractionError::ExtractionFailed(format!("failed to encode PNG: {e}")))?;

        tracing::debug!(
            page = page_index + 1,
            raw_size = image_bytes.len(),
            png_size = png_buf.get_ref().len(),
            "extracted image from PDF page"
        );

        Ok(png_buf.into_inner())
    }
}

/// Extract the largest image XObject from a PDF page.
///
/// Walks: page dict → /Resources → /XObject → entries with /Subtype /Image.
fn extract_largest_page_image(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>, ExtractionError> {
    let page_dict = doc
        .get_object(page_id)
        .and_then(|obj| obj.as_dict())
        .map_err(|e| ExtractionError::CorruptInput(format!("page object error: {e}")))?;

    let resources = resolve_dict_entry(doc, page_dict, b"Resources")?;
    let xobjects = resolve_dict_entry(doc, resources, b"XObject")?;

    let mut largest: Option<Vec<u8>> = None;

    for (_name, obj_ref) in xobjects.iter() {
        let xobj = match obj_ref {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(obj) => obj,
                Err(_) => continue,
            },
            other => other,
        };

        let stream = match xobj {
            Object::Stream(s) => s,
            _ => continue,
        };

        if !is_image_subtype(&stream.dict) {
            continue;
        }

        // DCTDecode streams are complete JPEG files; everything else is
        // handed to the image crate after decompression.
        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        if largest.as_ref().map_or(true, |prev| content.len() > prev.len()) {
            largest = Some(content);
        }
    }

    largest.ok_or_else(|| {
        ExtractionError::ExtractionFailed("no image found on this PDF page".to_string())
    })
}

fn resolve_dict_entry<'a>(
    doc: &'a Document,
    dict: &'a lopdf::Dictionary,
    key: &[u8],
) -> Result<&'a lopdf::Dictionary, ExtractionError> {
    let entry = dict
        .get(key)
        .map_err(|e| ExtractionError::CorruptInput(format!("missing PDF entry: {e}")))?;
    let resolved = match entry {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|e| ExtractionError::CorruptInput(format!("dangling PDF reference: {e}")))?,
        other => other,
    };
    resolved
        .as_dict()
        .map_err(|e| ExtractionError::CorruptInput(format!("PDF entry is not a dictionary: {e}")))
}

fn is_image_subtype(dict: &lopdf::Dictionary) -> bool {
    dict.get(b"Subtype")
        .map(|obj| matches!(obj, Object::Name(n) if n == b"Image"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_is_corrupt_input() {
        let result = EmbeddedImageRenderer.render_page(b"not a pdf", 0);
        assert!(matches!(result, Err(ExtractionError::CorruptInput(_))));
    }

    #[test]
    fn out_of_range_page_is_reported() {
        // A structurally valid but empty PDF.
        use lopdf::dictionary;
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();

        let result = EmbeddedImageRenderer.render_page(&buf, 3);
        assert!(matches!(result, Err(ExtractionError::CorruptInput(_))));
    }
}
