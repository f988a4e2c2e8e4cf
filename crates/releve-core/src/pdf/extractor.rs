//! Statement PDF loading and text-layer extraction using lopdf and
//! pdf-extract.
//!
//! This is the fallback input path for portal-downloaded documents: the
//! embedded text layer is pulled per page and each text line becomes a
//! [`RawLine`] with a synthetic vertical position. When a word-level dump
//! with coordinates is available, the word grouper is authoritative
//! instead.

use lopdf::Document;
use tracing::debug;

use super::Result;
use crate::error::PdfError;
use crate::models::RawLine;

/// A loaded statement PDF.
pub struct StatementPdf {
    document: Document,
    raw_data: Vec<u8>,
}

impl StatementPdf {
    /// Load and validate a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document =
            Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if document.is_encrypted() {
            return Err(PdfError::Encrypted);
        }
        if document.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        Ok(Self {
            document,
            raw_data: data.to_vec(),
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Extract the embedded text layer as ordered raw lines.
    ///
    /// Pages are split on form feeds when the extractor emits them; the
    /// vertical position is the line index within its page.
    pub fn raw_lines(&self) -> Result<Vec<RawLine>> {
        let text = pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        let mut lines = Vec::new();
        for (page_index, page_text) in text.split('\u{000C}').enumerate() {
            let mut vertical = 0i64;
            for line in page_text.lines() {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                lines.push(RawLine::new(trimmed, page_index as u32 + 1, vertical));
                vertical += 1;
            }
        }

        debug!(pages = self.page_count(), lines = lines.len(), "extracted text layer");
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail_to_parse() {
        let result = StatementPdf::from_bytes(b"not a pdf at all");
        assert!(matches!(result, Err(PdfError::Parse(_))));
    }
}
