//! Statement data model: extracted words, grouped lines, ledger rows.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One positioned word from the PDF word extractor.
///
/// Coordinates follow the extractor's convention: `y` grows downwards from
/// the top of the page, `x` rightwards from the left edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    /// Word text, whitespace-trimmed.
    pub text: String,

    /// 1-indexed page number.
    pub page: u32,

    /// Horizontal position of the word's left edge.
    pub x: f64,

    /// Vertical position of the word's top edge.
    pub y: f64,
}

/// A logical text line assembled from words sharing a vertical band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    /// Line text, words joined with single spaces.
    pub text: String,

    /// 1-indexed page number.
    pub page: u32,

    /// Rounded vertical position of the line on its page.
    pub vertical_position: i64,
}

impl RawLine {
    pub fn new(text: impl Into<String>, page: u32, vertical_position: i64) -> Self {
        Self {
            text: text.into(),
            page,
            vertical_position,
        }
    }
}

/// Kind of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Invoiced sale line item (`FAC-…` block).
    Sale,
    /// Returned goods line item (`RV-…` block).
    Return,
    /// Cash movement («paiement» triplet).
    Payment,
    /// Credit note («avoir» triplet).
    CreditNote,
}

impl TransactionKind {
    /// Stable lowercase label, used for persistence and CSV export.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "sale",
            TransactionKind::Return => "return",
            TransactionKind::Payment => "payment",
            TransactionKind::CreditNote => "credit_note",
        }
    }

    /// Inverse of [`TransactionKind::as_str`].
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sale" => Some(TransactionKind::Sale),
            "return" => Some(TransactionKind::Return),
            "payment" => Some(TransactionKind::Payment),
            "credit_note" => Some(TransactionKind::CreditNote),
            _ => None,
        }
    }
}

/// One row of the reconstructed ledger.
///
/// Sale/Return rows carry one product item each; Payment/CreditNote rows
/// carry only the monetary movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Client the statement belongs to.
    pub client_name: String,

    /// Transaction date from the source document.
    pub date: NaiveDate,

    /// Invoice or return document number (`FAC-1234`, `RV-1234`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Row kind.
    pub kind: TransactionKind,

    /// Product description (Sale/Return only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,

    /// Quantity of the product item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,

    /// Catalogue unit price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,

    /// Per-unit discount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,

    /// Unit price after discount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_unit_price: Option<Decimal>,

    /// Signed effect of this row on the balance. Negative reduces what the
    /// customer owes.
    pub amount: Decimal,

    /// Balance immediately after applying `amount`.
    pub running_balance: Decimal,

    /// True when the same-day offset rule suppressed this payment's effect;
    /// the row is kept for audit with `amount` zeroed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub offsetting: bool,
}

/// One client's fully reconstructed statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    /// Client the statement belongs to.
    pub client_name: String,

    /// Ledger rows in document order.
    pub records: Vec<TransactionRecord>,

    /// Opening balance («solde initial» line, default 0).
    pub initial_balance: Decimal,

    /// Running balance after the last row.
    pub computed_final_balance: Decimal,

    /// Final balance printed in the document, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_final_balance: Option<Decimal>,

    /// Whether computed and declared balances agree within tolerance.
    /// `None` when the document printed no final balance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciled: Option<bool>,

    /// Data-quality warnings collected during reconstruction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Statement {
    /// True when the statement carries no usable ledger rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
