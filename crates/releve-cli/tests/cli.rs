//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

#[test]
fn help_lists_commands() {
    Command::cargo_bin("releve")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("batch"));
}

#[test]
fn parse_word_dump_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let dump = dir.path().join("statement.json");

    let mut words = Vec::new();
    let mut y = 50.0;
    for line in [
        "2024-01-02 FAC-1 Facture",
        "PRODUIT TEST 2 10,00 10,00 20,00",
        "Total 20,00",
        "Solde final 20,00",
    ] {
        for (i, token) in line.split_whitespace().enumerate() {
            words.push(json!({
                "text": token,
                "page": 1,
                "x": 30.0 + i as f64 * 60.0,
                "y": y,
            }));
        }
        y += 14.0;
    }
    std::fs::write(&dump, serde_json::to_string(&words).unwrap()).unwrap();

    Command::cargo_bin("releve")
        .unwrap()
        .args(["parse", "--client", "PHARMACIE TEST", "--format", "csv"])
        .arg(&dump)
        .assert()
        .success()
        .stdout(predicate::str::contains("sale"))
        .stdout(predicate::str::contains("20.00"));
}

#[test]
fn parse_rejects_missing_file() {
    Command::cargo_bin("releve")
        .unwrap()
        .args(["parse", "--client", "X", "missing.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn config_init_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("releve.json");

    Command::cargo_bin("releve")
        .unwrap()
        .args(["config", "--init", "--path"])
        .arg(&path)
        .assert()
        .success();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("balance_tolerance"));
}

#[test]
fn clients_import_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("releve.db");
    let directory = dir.path().join("clients.json");
    std::fs::write(
        &directory,
        r#"[{"name": "PHARMACIE TEST", "portal_key": "42"}]"#,
    )
    .unwrap();

    Command::cargo_bin("releve")
        .unwrap()
        .args(["clients", "--db"])
        .arg(&db)
        .arg("--import")
        .arg(&directory)
        .assert()
        .success();

    Command::cargo_bin("releve")
        .unwrap()
        .args(["clients", "--list", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("PHARMACIE TEST"));
}

#[test]
fn batch_requires_session() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("releve.db");

    Command::cargo_bin("releve")
        .unwrap()
        .env_remove("RELEVE_SESSION")
        .args(["batch", "--db"])
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("session"));
}
