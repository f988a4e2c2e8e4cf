//! Named line-shape patterns for the statement format.
//!
//! Each record shape the classifier recognizes is anchored on one of these
//! compiled patterns, so every rule stays independently testable.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // A line opening with an ISO date.
    pub static ref DATE_LINE: Regex = Regex::new(
        r"^\d{4}-\d{2}-\d{2}"
    ).unwrap();

    // Sale/return block header: date, document reference, free-text label.
    pub static ref SALE_HEADER: Regex = Regex::new(
        r"^(\d{4}-\d{2}-\d{2})\s+((FAC|RV)-\d+)\s+(.+)$"
    ).unwrap();

    // Block terminator carrying the (untrusted) printed block total.
    pub static ref TOTAL_LINE: Regex = Regex::new(
        r"(?i)^total\s+\d"
    ).unwrap();

    // A single numeric token: optional sign, one optional decimal separator.
    pub static ref NUMERIC_TOKEN: Regex = Regex::new(
        r"^-?\d+(?:[.,]\d+)?$"
    ).unwrap();

    // A wrapped continuation line: nothing but 1-2 numeric tokens.
    pub static ref NUMERIC_CONTINUATION: Regex = Regex::new(
        r"^-?\d+(?:[.,]\d+)?(?:\s+-?\d+(?:[.,]\d+)?)?$"
    ).unwrap();

    // A thousands-separated number the extractor split at the comma group:
    // a standalone 1-2 digit run, whitespace, then a 3-digit group with
    // decimals. The first capture keeps the preceding separator intact.
    pub static ref THOUSANDS_SPLIT: Regex = Regex::new(
        r"(^|\s)(\d{1,2})\s+(\d{3},\d+)"
    ).unwrap();

    // Leading amount at the start of a line (3-line balance layout),
    // allowing space-separated thousands groups.
    pub static ref LEADING_AMOUNT: Regex = Regex::new(
        r"^(\d+(?:\s\d{3})*(?:[.,]\d+)?)"
    ).unwrap();

    // Opening balance line.
    pub static ref SOLDE_INITIAL: Regex = Regex::new(
        r"(?i)^solde\s+initial"
    ).unwrap();

    // Single-line final balance.
    pub static ref SOLDE_FINAL: Regex = Regex::new(
        r"(?i)^solde\s+final"
    ).unwrap();

    // A row made of bare number groups; skipped by product-name recovery.
    pub static ref NUMBERS_ROW: Regex = Regex::new(
        r"^[\d,]+\s+[\d,]+"
    ).unwrap();
}

/// Keyword opening a payment/credit triplet (matched case-insensitively
/// against the whole line).
pub const PAYMENT_LABELS: [&str; 2] = ["paiement", "avoir"];

/// Keyword closing a payment/credit triplet.
pub const COUNTERPARTY_LABELS: [&str; 2] = ["vente", "client"];

/// True when the line is exactly one of the triplet keywords.
pub fn is_triplet_label(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    PAYMENT_LABELS.contains(&lower.as_str()) || COUNTERPARTY_LABELS.contains(&lower.as_str())
}
