//! Data models for statements, ledger rows and configuration.

pub mod client;
pub mod config;
pub mod statement;

pub use client::ClientKey;
pub use config::ReleveConfig;
pub use statement::{RawLine, Statement, TransactionKind, TransactionRecord, Word};
