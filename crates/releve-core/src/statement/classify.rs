//! Record-shape matchers and the classification state machine.
//!
//! Each shape the statement format prints (sale/return header, product
//! sub-line, block total, payment/credit triplet, balance lines) is a
//! predicate+extractor pair over merged lines; [`classify_lines`] drives
//! them with an `ExpectHeader ↔ InProductBlock` state machine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::models::{TransactionKind, TransactionRecord};

use super::numeric::{normalize_number, parse_quantity, trailing_numbers};
use super::patterns::{
    COUNTERPARTY_LABELS, DATE_LINE, LEADING_AMOUNT, NUMBERS_ROW, PAYMENT_LABELS, SALE_HEADER,
    SOLDE_FINAL, SOLDE_INITIAL, TOTAL_LINE,
};

/// Header opening a sale or return block.
#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub date: NaiveDate,
    pub reference: String,
    pub kind: TransactionKind,
}

/// Cash movement extracted from a payment/credit triplet.
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    /// Printed magnitude; the ledger effect is its negation.
    pub amount: Decimal,
}

/// Output of one classification pass, before balances are applied.
#[derive(Debug, Default)]
pub struct ClassifiedDocument {
    pub records: Vec<TransactionRecord>,
    pub initial_balance: Option<Decimal>,
    pub declared_final_balance: Option<Decimal>,
    pub warnings: Vec<String>,
}

/// Match a `DATE (FAC|RV)-NUMBER free-text` block header.
pub fn match_header(line: &str) -> Option<BlockHeader> {
    let caps = SALE_HEADER.captures(line)?;
    let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
    let kind = if &caps[3] == "RV" {
        TransactionKind::Return
    } else {
        TransactionKind::Sale
    };
    Some(BlockHeader {
        date,
        reference: caps[2].to_string(),
        kind,
    })
}

/// Match the 3-line payment/credit window: a bare «paiement»/«avoir»
/// label, a date+amount line, then a «vente»/«client» counterparty label.
pub fn match_payment_triplet(lines: &[String], i: usize) -> Option<PaymentEvent> {
    if i + 2 >= lines.len() {
        return None;
    }
    let label = lines[i].trim().to_lowercase();
    let kind = if label == PAYMENT_LABELS[0] {
        TransactionKind::Payment
    } else if label == PAYMENT_LABELS[1] {
        TransactionKind::CreditNote
    } else {
        return None;
    };

    let middle = lines[i + 1].trim();
    if !DATE_LINE.is_match(middle) {
        return None;
    }
    let counterparty = lines[i + 2].trim().to_lowercase();
    if !COUNTERPARTY_LABELS.contains(&counterparty.as_str()) {
        return None;
    }

    let (date_token, rest) = middle.split_once(char::is_whitespace)?;
    let date = NaiveDate::parse_from_str(date_token, "%Y-%m-%d").ok()?;

    // Payment amounts can carry space-embedded thousands groups; the
    // backward scan glues them back into one number.
    let rest_tokens: Vec<&str> = rest.split_whitespace().collect();
    let tail = trailing_numbers(&rest_tokens, true);
    let amount = tail
        .tokens
        .first()
        .and_then(|raw| normalize_number(raw))?;

    Some(PaymentEvent { date, kind, amount })
}

/// Match the final-balance shapes. Returns the declared value and how many
/// lines the match consumed.
pub fn match_final_balance(lines: &[String], i: usize) -> Option<(Decimal, usize)> {
    let line = lines[i].trim();

    // Single line: "Solde final 1929,90" (possibly rejoined by the merger).
    if SOLDE_FINAL.is_match(line) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let joined: String = tokens.get(2..)?.concat();
        return normalize_number(&joined).map(|v| (v, 1));
    }

    // Word grouping sometimes lands the label and the value on separate
    // bands: "… solde", "1929.90", "… final".
    let lower = line.to_lowercase();
    if lower.contains("solde") && i + 2 < lines.len() {
        if lines[i + 2].to_lowercase().contains("final") {
            let value = LEADING_AMOUNT
                .captures(lines[i + 1].trim())
                .and_then(|caps| normalize_number(&caps[1]))?;
            return Some((value, 3));
        }
    }

    None
}

/// Match an opening-balance line: "Solde initial 50,00".
pub fn match_initial_balance(line: &str) -> Option<Decimal> {
    if !SOLDE_INITIAL.is_match(line.trim()) {
        return None;
    }
    let tokens: Vec<&str> = line.split_whitespace().collect();
    normalize_number(&tokens.get(2..)?.concat())
}

/// Extract one product sub-line of the current block.
///
/// `Ok(None)` means the line is not a product row (description, stray
/// text); `Err` carries a data-quality warning for a row that looked like
/// a product but would not parse; the block continues without it.
fn extract_product(
    lines: &[String],
    i: usize,
    header: &BlockHeader,
    client_name: &str,
    max_numbers: usize,
    tolerance: Decimal,
) -> Result<Option<TransactionRecord>, String> {
    let line = lines[i].as_str();
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut tail = trailing_numbers(&tokens, false);
    if tail.len() < 4 {
        return Ok(None);
    }
    tail.clamp(max_numbers);

    // 5 numbers: [qty, price, discount, discounted, printed total]; the
    // printed total is recomputed, not trusted. 4 numbers: same columns
    // without the total, disambiguated by the collapse rules below.
    let qty_raw = &tail.tokens[0];
    let quantity = parse_quantity(qty_raw)
        .ok_or_else(|| format!("unparseable quantity '{}' in line '{}'", qty_raw, line))?;

    let parse_price = |idx: usize| -> Result<Decimal, String> {
        normalize_number(&tail.tokens[idx])
            .ok_or_else(|| format!("unparseable amount '{}' in line '{}'", tail.tokens[idx], line))
    };
    let unit_price = parse_price(1)?;
    let mut discount = parse_price(2)?;
    let mut discounted = parse_price(3)?;

    if tail.len() == 4 {
        match header.kind {
            TransactionKind::Sale => {
                // Without a printed total the discount column can actually
                // be the undiscounted price repeated: no discount.
                if (unit_price - discount).abs() <= tolerance {
                    discount = Decimal::ZERO;
                    discounted = unit_price;
                }
            }
            TransactionKind::Return => {
                discount = Decimal::ZERO;
                if (unit_price - discounted).abs() > tolerance {
                    discounted = unit_price;
                }
            }
            _ => {}
        }
    }

    let total = (Decimal::from(quantity) * discounted).round_dp(2);
    let amount = match header.kind {
        TransactionKind::Return => -total,
        _ => total,
    };

    let product = if tail.start > 0 {
        Some(tokens[..tail.start].join(" "))
    } else {
        recover_product_name(lines, i)
    };

    Ok(Some(TransactionRecord {
        client_name: client_name.to_string(),
        date: header.date,
        reference: Some(header.reference.clone()),
        kind: header.kind,
        product,
        quantity: Some(quantity),
        unit_price: Some(unit_price),
        discount: Some(discount),
        discounted_unit_price: Some(discounted),
        amount,
        running_balance: Decimal::ZERO,
        offsetting: false,
    }))
}

/// Walk upwards to the nearest line that is neither a bare numbers row nor
/// a date header; that line is the wrapped product description.
fn recover_product_name(lines: &[String], i: usize) -> Option<String> {
    for j in (0..i).rev() {
        let candidate = lines[j].trim();
        if DATE_LINE.is_match(candidate) {
            return None;
        }
        if NUMBERS_ROW.is_match(candidate) {
            continue;
        }
        return Some(candidate.to_string());
    }
    None
}

fn payment_record(client_name: &str, event: &PaymentEvent) -> TransactionRecord {
    TransactionRecord {
        client_name: client_name.to_string(),
        date: event.date,
        reference: None,
        kind: event.kind,
        product: None,
        quantity: None,
        unit_price: None,
        discount: None,
        discounted_unit_price: None,
        amount: -event.amount.abs(),
        running_balance: Decimal::ZERO,
        offsetting: false,
    }
}

/// Run the full classification pass over merged lines.
pub fn classify_lines(
    lines: &[String],
    client_name: &str,
    max_numbers: usize,
    tolerance: Decimal,
) -> ClassifiedDocument {
    let mut doc = ClassifiedDocument::default();
    // `Some` while inside a sale/return product block.
    let mut block: Option<BlockHeader> = None;
    let mut last_date: Option<NaiveDate> = None;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();

        if let Some(header) = match_header(line) {
            trace!(reference = %header.reference, "block header");
            block = Some(header);
            i += 1;
            continue;
        }

        // Cash movements are recognized independently of the block state;
        // a triplet inside an unterminated block closes it.
        if let Some(event) = match_payment_triplet(lines, i) {
            check_date_order(&mut doc.warnings, &mut last_date, event.date);
            doc.records.push(payment_record(client_name, &event));
            block = None;
            i += 3;
            continue;
        }

        if let Some((value, consumed)) = match_final_balance(lines, i) {
            debug!(declared = %value, "final balance line found");
            doc.declared_final_balance = Some(value);
            i += consumed;
            break;
        }

        if block.is_some() && TOTAL_LINE.is_match(line) {
            // The printed block total is discarded; sub-lines are summed
            // instead.
            block = None;
            i += 1;
            continue;
        }

        if let Some(header) = block.as_ref() {
            match extract_product(lines, i, header, client_name, max_numbers, tolerance) {
                Ok(Some(record)) => {
                    check_date_order(&mut doc.warnings, &mut last_date, record.date);
                    doc.records.push(record);
                }
                Ok(None) => {}
                Err(warning) => {
                    debug!("{warning}");
                    doc.warnings.push(warning);
                }
            }
        } else if let Some(value) = match_initial_balance(line) {
            doc.initial_balance = Some(value);
        }
        // Anything unmatched is a header/footer artifact; skip it.
        i += 1;
    }

    doc
}

fn check_date_order(warnings: &mut Vec<String>, last_date: &mut Option<NaiveDate>, date: NaiveDate) {
    if let Some(prev) = *last_date {
        if date < prev {
            warnings.push(format!("out-of-order date {date} after {prev}"));
        }
    }
    *last_date = Some(date);
}
