//! PDF text extraction.
//!
//! Extraction is CPU bound and the parser may panic on malformed files, so it
//! runs on the blocking pool and a panic surfaces as an extraction error.

use std::path::Path;

use tracing::debug;

use super::html::normalize_whitespace;
use super::{ContentKind, ContentLoader, IngestedContent};
use crate::{Error, Result};

const PDF_MAGIC: &[u8] = b"%PDF-";
/// The header may be preceded by junk bytes; readers accept it in the first KiB.
const HEADER_WINDOW: usize = 1024;

/// Returns true if `bytes` carries a PDF header near the start.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_WINDOW)];
    window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Extract plain text from an in-memory PDF document.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String> {
    if !looks_like_pdf(&bytes) {
        return Err(Error::extraction("o arquivo não é um PDF (falta o cabeçalho %PDF-)"));
    }
    let size = bytes.len();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| Error::extraction(format!("falha interna ao ler o PDF: {e}")))?
        .map_err(|e| Error::extraction(format!("PDF ilegível: {e}")))?;
    let text = normalize_whitespace(&text);
    debug!(bytes = size, chars = text.chars().count(), "extracted PDF text");
    if text.is_empty() {
        return Err(Error::extraction(
            "o PDF não tem texto extraível (pode ser uma imagem escaneada)",
        ));
    }
    Ok(text)
}

/// Loads PDF files from the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct PdfLoader;

impl PdfLoader {
    /// Create a new PDF loader.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ContentLoader for PdfLoader {
    async fn load(&self, source: &str) -> Result<IngestedContent> {
        let path = Path::new(source);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::io(format!("não foi possível ler {}", path.display()), e))?;
        let text = extract_pdf_text(bytes).await?;
        Ok(IngestedContent::new(ContentKind::Pdf, source, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_detection() {
        assert!(looks_like_pdf(b"%PDF-1.7\n%..."));
        assert!(looks_like_pdf(b"\xef\xbb\xbf%PDF-1.4"));
        assert!(!looks_like_pdf(b"<html>not a pdf</html>"));
        assert!(!looks_like_pdf(b""));
    }

    #[tokio::test]
    async fn non_pdf_bytes_are_rejected() {
        let err = extract_pdf_text(b"hello world".to_vec()).await.unwrap_err();
        assert!(err.is_ingestion());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = PdfLoader::new()
            .load("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }), "{err}");
    }

    #[tokio::test]
    async fn file_without_pdf_header_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, "just text").unwrap();
        let err = PdfLoader::new()
            .load(path.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }), "{err}");
    }
}
