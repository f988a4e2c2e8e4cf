//! Statement reconstruction engine.
//!
//! One-way pipeline over a document's extracted words:
//!
//! ```text
//! words ──▶ raw lines ──▶ merged lines ──▶ classified records ──▶ ledger ──▶ verdict
//! (grouper)   (merger)      (classifier)       (accumulator)    (reconciliation)
//! ```
//!
//! The engine is purely in-memory and never errors on data quality; bad
//! rows become warnings on the resulting [`Statement`].

pub mod classify;
pub mod ledger;
pub mod lines;
pub mod numeric;
pub mod patterns;

pub use classify::{ClassifiedDocument, classify_lines};
pub use lines::{group_words, merge_lines, repair_thousands};

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::StatementError;
use crate::models::{RawLine, Statement, Word};

/// Statement parser with tunable tolerances.
pub struct StatementParser {
    tolerance: Decimal,
    max_product_numbers: usize,
}

impl StatementParser {
    /// Create a parser with default settings (0.01 tolerance, 5 trusted
    /// trailing numbers per product line).
    pub fn new() -> Self {
        Self {
            tolerance: Decimal::new(1, 2),
            max_product_numbers: 5,
        }
    }

    /// Set the balance comparison tolerance.
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set how many trailing numbers a product sub-line may carry.
    pub fn with_max_product_numbers(mut self, count: usize) -> Self {
        self.max_product_numbers = count;
        self
    }

    /// Reconstruct one client's statement from grouped raw lines.
    pub fn parse(
        &self,
        lines: &[RawLine],
        client_name: &str,
    ) -> Result<Statement, StatementError> {
        if client_name.trim().is_empty() {
            return Err(StatementError::MissingClientName);
        }
        if lines.is_empty() {
            return Err(StatementError::NoLines);
        }

        let merged = merge_lines(lines);
        debug!(
            raw = lines.len(),
            merged = merged.len(),
            "merged statement lines"
        );

        let mut doc = classify_lines(&merged, client_name, self.max_product_numbers, self.tolerance);

        let suppressed = ledger::apply_offset_dedup(&mut doc.records, self.tolerance);
        if suppressed > 0 {
            debug!(suppressed, "same-day offsetting payments suppressed");
        }

        let initial_balance = doc.initial_balance.unwrap_or(Decimal::ZERO);
        let computed = ledger::accumulate(&mut doc.records, initial_balance);
        let reconciled = ledger::reconcile(computed, doc.declared_final_balance, self.tolerance);

        let mut warnings = doc.warnings;
        if reconciled == Some(false) {
            warnings.push(format!(
                "computed balance {computed} does not match declared final balance {}",
                doc.declared_final_balance.unwrap_or_default()
            ));
        }

        info!(
            client = client_name,
            records = doc.records.len(),
            balance = %computed,
            "statement reconstructed"
        );

        Ok(Statement {
            client_name: client_name.to_string(),
            records: doc.records,
            initial_balance,
            computed_final_balance: computed,
            declared_final_balance: doc.declared_final_balance,
            reconciled,
            warnings,
        })
    }

    /// Group positioned words into lines, then parse.
    pub fn parse_words(&self, words: &[Word], client_name: &str) -> Result<Statement, StatementError> {
        self.parse(&group_words(words), client_name)
    }
}

impl Default for StatementParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconstruct a statement with default settings.
pub fn parse_statement(lines: &[RawLine], client_name: &str) -> Result<Statement, StatementError> {
    StatementParser::new().parse(lines, client_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn raw_lines(texts: &[&str]) -> Vec<RawLine> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| RawLine::new(*t, 1, i as i64))
            .collect()
    }

    #[test]
    fn test_contract_violations() {
        assert!(matches!(
            parse_statement(&[], "PHARMACIE TEST"),
            Err(StatementError::NoLines)
        ));
        assert!(matches!(
            parse_statement(&raw_lines(&["x"]), "  "),
            Err(StatementError::MissingClientName)
        ));
    }

    #[test]
    fn test_single_sale_round_trip() {
        let lines = raw_lines(&[
            "2024-01-02 FAC-1 Facture",
            "PRODUIT TEST 2 10,00 10,00 20,00 20,00",
            "Total 20,00",
        ]);

        let statement = parse_statement(&lines, "PHARMACIE TEST").unwrap();
        assert_eq!(statement.records.len(), 1);

        let record = &statement.records[0];
        assert_eq!(record.amount, dec("20.00"));
        assert_eq!(record.running_balance, dec("20.00"));
        assert_eq!(statement.computed_final_balance, dec("20.00"));
        assert_eq!(statement.reconciled, None);
    }

    #[test]
    fn test_running_balance_recurrence() {
        let lines = raw_lines(&[
            "2024-01-02 FAC-1 Facture",
            "PRODUIT A 2 10,00 10,00 20,00",
            "PRODUIT B 1 5,50 5,50 5,50",
            "Total 25,50",
            "Paiement",
            "2024-01-05 10,00",
            "Vente",
        ]);

        let statement = parse_statement(&lines, "PHARMACIE TEST").unwrap();
        assert_eq!(statement.records.len(), 3);

        let mut balance = statement.initial_balance;
        for record in &statement.records {
            balance = (balance + record.amount).round_dp(2);
            assert_eq!(record.running_balance, balance);
        }
        assert_eq!(statement.computed_final_balance, dec("15.50"));
        assert_eq!(
            statement.computed_final_balance,
            statement.records.last().unwrap().running_balance
        );
    }

    #[test]
    fn test_initial_balance_seeds_ledger() {
        let lines = raw_lines(&[
            "Solde initial 50,00",
            "2024-01-02 FAC-1 Facture",
            "PRODUIT 1 10,00 10,00 10,00",
            "Total 10,00",
        ]);

        let statement = parse_statement(&lines, "PHARMACIE TEST").unwrap();
        assert_eq!(statement.initial_balance, dec("50.00"));
        assert_eq!(statement.computed_final_balance, dec("60.00"));
    }

    #[test]
    fn test_same_day_payment_return_dedup() {
        let lines = raw_lines(&[
            "2024-01-05 RV-3 Retour",
            "PRODUIT 1 84,91 84,91 84,91 84,91",
            "Total 84,91",
            "Paiement",
            "2024-01-05 84,91",
            "Vente",
        ]);

        let statement = parse_statement(&lines, "PHARMACIE TEST").unwrap();
        assert_eq!(statement.records.len(), 2);

        let ret = &statement.records[0];
        let pay = &statement.records[1];
        assert_eq!(ret.kind, TransactionKind::Return);
        assert_eq!(ret.amount, dec("-84.91"));
        assert_eq!(pay.kind, TransactionKind::Payment);
        assert_eq!(pay.amount, Decimal::ZERO);
        assert!(pay.offsetting);
        // Only the genuine return moves the balance.
        assert_eq!(statement.computed_final_balance, dec("-84.91"));
    }

    #[test]
    fn test_reconciliation_within_tolerance() {
        let lines = raw_lines(&[
            "2024-01-02 FAC-1 Facture",
            "PRODUIT 1 1929,89 1929,89 1929,89",
            "Total 1929,89",
            "Solde final 1929,90",
        ]);

        let statement = parse_statement(&lines, "PHARMACIE TEST").unwrap();
        assert_eq!(statement.declared_final_balance, Some(dec("1929.90")));
        assert_eq!(statement.reconciled, Some(true));
        assert!(statement.warnings.is_empty());
    }

    #[test]
    fn test_reconciliation_mismatch_is_warning_not_error() {
        let lines = raw_lines(&[
            "2024-01-02 FAC-1 Facture",
            "PRODUIT 1 1930,50 1930,50 1930,50",
            "Total 1930,50",
            "Solde final 1929,90",
        ]);

        let statement = parse_statement(&lines, "PHARMACIE TEST").unwrap();
        assert_eq!(statement.reconciled, Some(false));
        assert_eq!(statement.records.len(), 1);
        assert!(
            statement
                .warnings
                .iter()
                .any(|w| w.contains("declared final balance"))
        );
    }

    #[test]
    fn test_thousands_repair_single_amount() {
        // "1" + "234,56" is one split amount, not a quantity and a price.
        let lines = raw_lines(&["Paiement", "2024-01-05 1 234,56", "Vente"]);

        let statement = parse_statement(&lines, "PHARMACIE TEST").unwrap();
        assert_eq!(statement.records.len(), 1);
        assert_eq!(statement.records[0].amount, dec("-1234.56"));
    }

    #[test]
    fn test_parse_words_end_to_end() {
        let mut words = Vec::new();
        let mut y = 10.0;
        for line in [
            "2024-01-02 FAC-1 Facture",
            "PRODUIT TEST 2 10,00 10,00 20,00",
            "Total 20,00",
        ] {
            for (i, token) in line.split_whitespace().enumerate() {
                words.push(Word {
                    text: token.to_string(),
                    page: 1,
                    x: i as f64 * 50.0,
                    y: y + (i % 2) as f64 * 0.3,
                });
            }
            y += 12.0;
        }

        let statement = StatementParser::new()
            .parse_words(&words, "PHARMACIE TEST")
            .unwrap();
        assert_eq!(statement.records.len(), 1);
        assert_eq!(statement.records[0].amount, dec("20.00"));
    }
}
