use thiserror::Error;

pub const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum TextExtractionError {
    #[error("Could not read PDF: {0}")]
    Unreadable(String),
}

/// Turns an uploaded document into plain text.
///
/// Synchronous and CPU-bound; callers run it on the blocking pool.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, TextExtractionError>;
}

/// `pdf-extract` backed extractor. A PDF with no text layer yields `""`.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, TextExtractionError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(TextExtractionError::Unreadable(
                "missing PDF header".to_string(),
            ));
        }
        pdf_extract::extract_text_from_mem(bytes)
            .map(|text| text.trim().to_string())
            .map_err(|e| TextExtractionError::Unreadable(e.to_string()))
    }
}

/// True when a multipart content type names a PDF, ignoring parameters and case.
pub fn is_pdf_mime(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MIME))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf_mime() {
        assert!(is_pdf_mime(Some("application/pdf")));
        assert!(is_pdf_mime(Some("Application/PDF; name=cv.pdf")));
        assert!(!is_pdf_mime(Some("text/plain")));
        assert!(!is_pdf_mime(Some("application/pdfx")));
        assert!(!is_pdf_mime(None));
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let err = PdfTextExtractor
            .extract_text(b"definitely not a pdf")
            .unwrap_err();
        assert!(matches!(err, TextExtractionError::Unreadable(_)));
    }
}
