//! Trailing-number extraction and amount normalization.
//!
//! Statement lines end in a run of numeric columns (quantity, prices,
//! totals) preceded by free text. The run is assembled by scanning the
//! whitespace tokens backwards, so description words never have to be
//! understood; payment lines additionally re-glue amounts the extractor
//! broke at thousands groups («1 929,9»).

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::NUMERIC_TOKEN;

/// Longest pure-digit token still treated as a number; anything longer is
/// a reference/identifier and stops the scan.
const MAX_INTEGER_DIGITS: usize = 5;

/// The trailing numeric run of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericTail {
    /// Raw number tokens, restored to left-to-right order. Payment-line
    /// tokens may carry internal spaces from thousands-group joins.
    pub tokens: Vec<String>,

    /// Index into the line's whitespace tokens where the run begins.
    pub start: usize,
}

impl NumericTail {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Keep only the last `n` numbers, pushing the earlier ones back into
    /// the descriptive part of the line (dosage strengths and the like).
    pub fn clamp(&mut self, n: usize) {
        if self.tokens.len() > n {
            let drop = self.tokens.len() - n;
            self.tokens.drain(..drop);
            self.start += drop;
        }
    }
}

/// Scan the line's tokens from the end backwards, assembling the trailing
/// numeric run. `payment` enables the «paiement» continuations: adjacent
/// numbers collapse into one amount and a lone `-` next to a number is a
/// thousands-group separator rather than a stop signal.
pub fn trailing_numbers(tokens: &[&str], payment: bool) -> NumericTail {
    let mut collected: Vec<String> = Vec::new();
    let mut pending = String::new();
    let mut start = 0usize;

    for i in (0..tokens.len()).rev() {
        let token = tokens[i];
        if NUMERIC_TOKEN.is_match(token) {
            if token.len() > MAX_INTEGER_DIGITS && token.chars().all(|c| c.is_ascii_digit()) {
                start = i + 1;
                break;
            }
            if payment && !pending.is_empty() {
                pending = format!("{} {}", token, pending);
            } else {
                if !pending.is_empty() {
                    collected.push(std::mem::take(&mut pending));
                }
                pending = token.to_string();
            }
        } else if token == "-"
            && i > 0
            && payment
            && NUMERIC_TOKEN.is_match(tokens[i - 1])
        {
            pending = format!("- {}", pending);
        } else {
            start = i + 1;
            break;
        }
    }

    if !pending.is_empty() {
        collected.push(pending);
    }
    collected.reverse();

    NumericTail {
        tokens: collected,
        start,
    }
}

/// Normalize a raw number token to a [`Decimal`]: internal spaces
/// stripped, `,` mapped to the decimal point.
pub fn normalize_number(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    Decimal::from_str(&cleaned).ok()
}

/// Parse a quantity token; quantities are whole numbers in the source.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    i64::from_str(&cleaned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toks(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_product_tail_left_to_right() {
        let tokens = toks("DOLIPRANE 500MG CPR 1 48,00 4,80 43,20 43,20");
        let tail = trailing_numbers(&tokens, false);

        assert_eq!(tail.tokens, vec!["1", "48,00", "4,80", "43,20", "43,20"]);
        assert_eq!(tail.start, 3);
    }

    #[test]
    fn test_scan_stops_at_text() {
        let tokens = toks("Total 43,20");
        let tail = trailing_numbers(&tokens, false);

        assert_eq!(tail.tokens, vec!["43,20"]);
        assert_eq!(tail.start, 1);
    }

    #[test]
    fn test_long_integer_stops_scan() {
        // Reference numbers never become amounts.
        let tokens = toks("BON 123456 2 10,00");
        let tail = trailing_numbers(&tokens, false);

        assert_eq!(tail.tokens, vec!["2", "10,00"]);
        assert_eq!(tail.start, 2);
    }

    #[test]
    fn test_payment_joins_split_thousands() {
        let tokens = toks("2024-01-05 Paiement 1 929,9");
        let tail = trailing_numbers(&tokens, true);

        assert_eq!(tail.tokens, vec!["1 929,9"]);
        assert_eq!(normalize_number(&tail.tokens[0]), Some(dec("1929.9")));
    }

    #[test]
    fn test_non_payment_keeps_numbers_separate() {
        let tokens = toks("1 929,9");
        let tail = trailing_numbers(&tokens, false);

        assert_eq!(tail.tokens, vec!["1", "929,9"]);
    }

    #[test]
    fn test_clamp_moves_extra_numbers_to_description() {
        let tokens = toks("VITAMINE C 500 1000 2 10,00 10,00 20,00");
        let mut tail = trailing_numbers(&tokens, false);
        assert_eq!(tail.len(), 6);

        tail.clamp(5);
        assert_eq!(tail.tokens, vec!["1000", "2", "10,00", "10,00", "20,00"]);
        assert_eq!(tail.start, 3);
    }

    #[test]
    fn test_normalize_number() {
        assert_eq!(normalize_number("43,20"), Some(dec("43.20")));
        assert_eq!(normalize_number("1929.90"), Some(dec("1929.90")));
        assert_eq!(normalize_number("- 1 929,9"), Some(dec("-1929.9")));
        assert_eq!(normalize_number("abc"), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("6"), Some(6));
        assert_eq!(parse_quantity("6,00"), None);
    }
}
