//! Core library for pharmacy statement reconstruction.
//!
//! This crate provides:
//! - word grouping and logical-line reconstruction from PDF extraction
//! - transaction classification (sales, returns, payments, credit notes)
//! - running-balance ledger accumulation and reconciliation
//! - PDF text-layer extraction for portal-downloaded statements

pub mod error;
pub mod models;
pub mod pdf;
pub mod statement;

pub use error::{PdfError, ReleveError, Result, StatementError};
pub use models::{
    ClientKey, RawLine, ReleveConfig, Statement, TransactionKind, TransactionRecord, Word,
};
pub use pdf::StatementPdf;
pub use statement::{StatementParser, group_words, merge_lines, parse_statement};
