//! Word grouping and logical-line reconstruction.
//!
//! PDF extraction yields positioned words, not lines; rows of the statement
//! table are words sharing a vertical band. [`group_words`] rebuilds the
//! page's reading order from those bands, and [`merge_lines`] repairs the
//! wrap artifacts so each logical record (or product sub-row) ends up on a
//! single line.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{RawLine, Word};

use super::patterns::{
    is_triplet_label, DATE_LINE, NUMERIC_CONTINUATION, NUMERIC_TOKEN, SOLDE_FINAL, SOLDE_INITIAL,
    THOUSANDS_SPLIT, TOTAL_LINE,
};

/// Group positioned words into ordered logical lines.
///
/// Words are bucketed by their vertical position rounded to the nearest
/// integer, ordered left-to-right within a bucket and joined with single
/// spaces; buckets run top-to-bottom, pages in document order.
pub fn group_words(words: &[Word]) -> Vec<RawLine> {
    let mut pages: BTreeMap<u32, BTreeMap<i64, Vec<(f64, &str)>>> = BTreeMap::new();

    for word in words {
        let bucket = word.y.round() as i64;
        pages
            .entry(word.page)
            .or_default()
            .entry(bucket)
            .or_default()
            .push((word.x, word.text.as_str()));
    }

    let mut lines = Vec::new();
    for (page, buckets) in pages {
        for (vertical, mut row) in buckets {
            row.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            let text = row.iter().map(|(_, t)| *t).collect::<Vec<_>>().join(" ");
            lines.push(RawLine::new(text, page, vertical));
        }
    }
    lines
}

/// Rejoin a thousands-separated number the extractor split at the comma
/// group. A multi-digit lone part is concatenated outright (`"12 345,60"`
/// → `"12345,60"`); a single digit keeps its space and stays one amount
/// (`"1 929,90"`), resolved later by the numeric tokenizer; joining it
/// here would swallow genuine `qty 1` product rows.
pub fn repair_thousands(line: &str) -> Cow<'_, str> {
    THOUSANDS_SPLIT.replace_all(line, |caps: &regex::Captures<'_>| {
        if caps[2].len() > 1 {
            format!("{}{}{}", &caps[1], &caps[2], &caps[3])
        } else {
            format!("{}{} {}", &caps[1], &caps[2], &caps[3])
        }
    })
}

/// Merge loosely-grouped raw lines into logical record lines.
///
/// Boundary rules, in order:
/// - date-stamped and balance lines flush the buffer and open a new one;
/// - `Total …` lines and bare paiement/avoir/vente/client labels flush the
///   buffer and stand alone;
/// - a line of 1-2 bare numeric tokens is a wrapped tail and is appended
///   while the buffer has not started with a date;
/// - anything else is appended while the buffer has neither started with a
///   date nor already collected a full numeric tail, and otherwise starts a
///   fresh buffer.
pub fn merge_lines(lines: &[RawLine]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    let mut buffer = String::new();

    for raw in lines {
        let trimmed = raw.text.trim();
        if trimmed.is_empty() {
            continue;
        }
        let line = repair_thousands(trimmed);

        if DATE_LINE.is_match(&line) || SOLDE_FINAL.is_match(&line) || SOLDE_INITIAL.is_match(&line)
        {
            flush(&mut merged, &mut buffer);
            buffer.push_str(&line);
        } else if TOTAL_LINE.is_match(&line) || is_triplet_label(&line) {
            flush(&mut merged, &mut buffer);
            merged.push(line.into_owned());
        } else if NUMERIC_CONTINUATION.is_match(&line)
            && !buffer.is_empty()
            && !DATE_LINE.is_match(&buffer)
        {
            buffer.push(' ');
            buffer.push_str(&line);
        } else if buffer.is_empty() {
            buffer.push_str(&line);
        } else if DATE_LINE.is_match(&buffer) || has_complete_tail(&buffer) {
            flush(&mut merged, &mut buffer);
            buffer.push_str(&line);
        } else {
            buffer.push(' ');
            buffer.push_str(&line);
        }
    }

    flush(&mut merged, &mut buffer);
    merged
}

fn flush(merged: &mut Vec<String>, buffer: &mut String) {
    if !buffer.is_empty() {
        merged.push(std::mem::take(buffer));
    }
}

/// A buffer ending in 3+ numeric tokens already carries a full product
/// tail; unrelated text must not be folded into it.
fn has_complete_tail(buffer: &str) -> bool {
    buffer
        .split_whitespace()
        .rev()
        .take_while(|t| NUMERIC_TOKEN.is_match(t))
        .count()
        >= 3
}
