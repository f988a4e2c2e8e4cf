//! Error types for the releve-core library.

use thiserror::Error;

/// Main error type for the releve library.
#[derive(Error, Debug)]
pub enum ReleveError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Statement reconstruction error.
    #[error("statement error: {0}")]
    Statement(#[from] StatementError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Contract violations of the statement reconstruction engine.
///
/// Data-quality issues (unparseable sub-lines, balance mismatches) are
/// never errors; they surface as warnings on the statement instead.
#[derive(Error, Debug)]
pub enum StatementError {
    /// The document produced no lines at all.
    #[error("document contains no lines")]
    NoLines,

    /// No client name was supplied for the statement.
    #[error("missing client name")]
    MissingClientName,
}

/// Result type for the releve library.
pub type Result<T> = std::result::Result<T, ReleveError>;
