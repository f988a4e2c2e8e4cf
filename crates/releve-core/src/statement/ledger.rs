//! Running balance, same-day offset dedup and reconciliation.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{TransactionKind, TransactionRecord};

/// Suppress double-booked payments: when a return/credit-note magnitude
/// equals the same-day payment sum (within tolerance), that day's payment
/// rows are settlement echoes of the credit, not real cash. Their effect is
/// zeroed and they are flagged `offsetting`; the rows stay for audit.
///
/// Returns the number of suppressed payment rows.
pub fn apply_offset_dedup(records: &mut [TransactionRecord], tolerance: Decimal) -> usize {
    let mut payment_sums: HashMap<NaiveDate, Decimal> = HashMap::new();
    for record in records.iter() {
        if record.kind == TransactionKind::Payment {
            *payment_sums.entry(record.date).or_insert(Decimal::ZERO) += record.amount.abs();
        }
    }

    let mut offset_dates: HashSet<NaiveDate> = HashSet::new();
    for record in records.iter() {
        if !matches!(
            record.kind,
            TransactionKind::Return | TransactionKind::CreditNote
        ) {
            continue;
        }
        if let Some(sum) = payment_sums.get(&record.date) {
            if (record.amount.abs() - *sum).abs() <= tolerance {
                offset_dates.insert(record.date);
            }
        }
    }

    let mut suppressed = 0;
    for record in records.iter_mut() {
        if record.kind == TransactionKind::Payment && offset_dates.contains(&record.date) {
            debug!(date = %record.date, amount = %record.amount, "offsetting payment suppressed");
            record.amount = Decimal::ZERO;
            record.offsetting = true;
            suppressed += 1;
        }
    }
    suppressed
}

/// Fold the signed amounts into a running balance, rounding to 2 decimals
/// after every step to match the source's per-line rounding. Each record
/// receives its post-update balance; the final balance is returned.
pub fn accumulate(records: &mut [TransactionRecord], initial_balance: Decimal) -> Decimal {
    let mut balance = initial_balance;
    for record in records.iter_mut() {
        balance = (balance + record.amount).round_dp(2);
        record.running_balance = balance;
    }
    balance
}

/// Compare computed and declared balances. `None` when the document printed
/// no final balance; a mismatch is a warning, never an error.
pub fn reconcile(
    computed: Decimal,
    declared: Option<Decimal>,
    tolerance: Decimal,
) -> Option<bool> {
    declared.map(|value| (computed - value).abs() <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(kind: TransactionKind, date: &str, amount: &str) -> TransactionRecord {
        TransactionRecord {
            client_name: "PHARMACIE TEST".to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            reference: None,
            kind,
            product: None,
            quantity: None,
            unit_price: None,
            discount: None,
            discounted_unit_price: None,
            amount: dec(amount),
            running_balance: Decimal::ZERO,
            offsetting: false,
        }
    }

    #[test]
    fn test_accumulate_rounds_each_step() {
        let mut records = vec![
            record(TransactionKind::Sale, "2024-01-01", "10.005"),
            record(TransactionKind::Sale, "2024-01-02", "10.005"),
        ];

        let computed = accumulate(&mut records, Decimal::ZERO);
        // Banker's rounding per step: 10.005 -> 10.00, 20.005 -> 20.00.
        assert_eq!(records[0].running_balance, dec("10.00"));
        assert_eq!(computed, dec("20.00"));
    }

    #[test]
    fn test_accumulate_starts_from_initial_balance() {
        let mut records = vec![record(TransactionKind::Payment, "2024-01-01", "-30.00")];
        let computed = accumulate(&mut records, dec("50.00"));
        assert_eq!(computed, dec("20.00"));
    }

    #[test]
    fn test_offset_dedup_zeroes_matching_payments() {
        let mut records = vec![
            record(TransactionKind::Return, "2024-01-05", "-84.91"),
            record(TransactionKind::Payment, "2024-01-05", "-84.91"),
        ];

        let suppressed = apply_offset_dedup(&mut records, dec("0.01"));
        assert_eq!(suppressed, 1);
        assert_eq!(records[1].amount, Decimal::ZERO);
        assert!(records[1].offsetting);
        // The return keeps its effect: the double-booked cash row was the
        // suppressed one.
        assert_eq!(records[0].amount, dec("-84.91"));
        assert!(!records[0].offsetting);
    }

    #[test]
    fn test_offset_dedup_sums_same_day_payments() {
        let mut records = vec![
            record(TransactionKind::CreditNote, "2024-01-05", "-100.00"),
            record(TransactionKind::Payment, "2024-01-05", "-60.00"),
            record(TransactionKind::Payment, "2024-01-05", "-40.00"),
        ];

        let suppressed = apply_offset_dedup(&mut records, dec("0.01"));
        assert_eq!(suppressed, 2);
        assert!(records[1].offsetting && records[2].offsetting);
    }

    #[test]
    fn test_offset_dedup_ignores_different_days() {
        let mut records = vec![
            record(TransactionKind::Return, "2024-01-05", "-84.91"),
            record(TransactionKind::Payment, "2024-01-06", "-84.91"),
        ];

        assert_eq!(apply_offset_dedup(&mut records, dec("0.01")), 0);
        assert_eq!(records[1].amount, dec("-84.91"));
    }

    #[test]
    fn test_offset_dedup_ignores_mismatched_magnitude() {
        let mut records = vec![
            record(TransactionKind::Return, "2024-01-05", "-84.91"),
            record(TransactionKind::Payment, "2024-01-05", "-80.00"),
        ];

        assert_eq!(apply_offset_dedup(&mut records, dec("0.01")), 0);
    }

    #[test]
    fn test_reconcile_within_tolerance() {
        assert_eq!(
            reconcile(dec("1929.89"), Some(dec("1929.90")), dec("0.01")),
            Some(true)
        );
        assert_eq!(
            reconcile(dec("1930.50"), Some(dec("1929.90")), dec("0.01")),
            Some(false)
        );
        assert_eq!(reconcile(dec("10.00"), None, dec("0.01")), None);
    }
}
