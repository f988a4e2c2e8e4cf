//! End-to-end reconstruction of a realistic multi-block statement.

use std::str::FromStr;

use rust_decimal::Decimal;

use releve_core::models::{RawLine, TransactionKind, Word};
use releve_core::statement::{StatementParser, group_words};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn raw_lines(texts: &[&str]) -> Vec<RawLine> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| RawLine::new(*t, 1 + (i / 40) as u32, (i % 40) as i64))
        .collect()
}

#[test]
fn reconstructs_full_statement() {
    let lines = raw_lines(&[
        "Sobrus Pharma",
        "Relevé de compte détaillé",
        "PHARMACIE EL BARAKA",
        "Solde initial 0,00",
        // Sale with two products, one discounted.
        "2024-01-02 FAC-1201 Facture",
        "DOLIPRANE 500MG CPR",
        "1 48,00 4,80 43,20 43,20",
        "AMOXICILLINE 1G SACHET",
        "6 15,00 15,00 90,00",
        "Total 133,20",
        // Payment a few days later.
        "Paiement",
        "2024-01-10 50,00",
        "Vente",
        // Return, later offset by a same-day booked payment.
        "2024-02-01 RV-88 Retour",
        "SMECTA SACHETS",
        "1 84,91 84,91 84,91 84,91",
        "Total 84,91",
        "Paiement",
        "2024-02-01 84,91",
        "Client",
        // Credit note.
        "Avoir",
        "2024-02-15 10,00",
        "Client",
        "Solde final",
        "-11,71",
    ]);

    let statement = StatementParser::new()
        .parse(&lines, "PHARMACIE EL BARAKA")
        .unwrap();

    let kinds: Vec<TransactionKind> = statement.records.iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TransactionKind::Sale,
            TransactionKind::Sale,
            TransactionKind::Payment,
            TransactionKind::Return,
            TransactionKind::Payment,
            TransactionKind::CreditNote,
        ]
    );

    // Sale amounts: 43.20 and 6 x 15.00 with the repeated-price collapse.
    assert_eq!(statement.records[0].amount, dec("43.20"));
    assert_eq!(statement.records[0].product.as_deref(), Some("DOLIPRANE 500MG CPR"));
    assert_eq!(statement.records[1].amount, dec("90.00"));
    assert_eq!(statement.records[1].discount, Some(dec("0")));

    // Running balance walks the document: 43.20, 133.20, 83.20, -1.71,
    // -1.71 (offset payment), -11.71.
    let balances: Vec<Decimal> = statement
        .records
        .iter()
        .map(|r| r.running_balance)
        .collect();
    assert_eq!(
        balances,
        vec![
            dec("43.20"),
            dec("133.20"),
            dec("83.20"),
            dec("-1.71"),
            dec("-1.71"),
            dec("-11.71"),
        ]
    );

    // The same-day payment echo of RV-88 is kept but neutralized.
    assert!(statement.records[4].offsetting);
    assert_eq!(statement.records[4].amount, Decimal::ZERO);

    assert_eq!(statement.computed_final_balance, dec("-11.71"));
    assert_eq!(statement.declared_final_balance, Some(dec("-11.71")));
    assert_eq!(statement.reconciled, Some(true));
    assert!(statement.warnings.is_empty());
}

#[test]
fn word_dump_and_line_input_agree() {
    let mut words = Vec::new();
    let mut y = 50.0;
    for line in [
        "2024-01-02 FAC-9 Facture",
        "PRODUIT TEST 2 10,00 10,00 20,00",
        "Total 20,00",
    ] {
        for (i, token) in line.split_whitespace().enumerate() {
            words.push(Word {
                text: token.to_string(),
                page: 1,
                x: 30.0 + i as f64 * 60.0,
                y: y + (i % 2) as f64 * 0.3,
            });
        }
        y += 14.0;
    }

    let grouped = group_words(&words);
    let from_words = StatementParser::new()
        .parse(&grouped, "PHARMACIE EL BARAKA")
        .unwrap();

    let from_lines = StatementParser::new()
        .parse(
            &raw_lines(&[
                "2024-01-02 FAC-9 Facture",
                "PRODUIT TEST 2 10,00 10,00 20,00",
                "Total 20,00",
            ]),
            "PHARMACIE EL BARAKA",
        )
        .unwrap();

    assert_eq!(from_words.records.len(), from_lines.records.len());
    assert_eq!(
        from_words.computed_final_balance,
        from_lines.computed_final_balance
    );
    assert_eq!(from_words.records[0].amount, dec("20.00"));
}
