//! SQLite persistence for reconstructed statements.
//!
//! Rows are keyed by client and fully replaced on every re-run; there is
//! no incremental merge. Monetary values are stored as text so the
//! 2-decimal amounts survive the round trip exactly.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

use releve_core::models::{ClientKey, Statement, TransactionKind, TransactionRecord};

/// Errors raised by the statement store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored value no longer parses back into the model.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Declared/computed balance pair persisted per client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBalance {
    pub declared: Option<Decimal>,
    pub computed: Decimal,
    pub reconciled: Option<bool>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS client_keys (
    name        TEXT PRIMARY KEY,
    portal_key  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS ledger_rows (
    client                TEXT NOT NULL,
    position              INTEGER NOT NULL,
    date                  TEXT NOT NULL,
    reference             TEXT,
    kind                  TEXT NOT NULL,
    product               TEXT,
    quantity              INTEGER,
    unit_price            TEXT,
    discount              TEXT,
    discounted_unit_price TEXT,
    amount                TEXT NOT NULL,
    running_balance       TEXT NOT NULL,
    offsetting            INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (client, position)
);
CREATE TABLE IF NOT EXISTS final_balances (
    client      TEXT PRIMARY KEY,
    declared    TEXT,
    computed    TEXT NOT NULL,
    reconciled  INTEGER
);
";

/// Store for client keys and reconstructed ledgers.
pub struct StatementStore {
    conn: Connection,
}

impl StatementStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// In-memory store, mainly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Replace the whole client directory.
    pub fn replace_client_keys(&mut self, keys: &[ClientKey]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM client_keys", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO client_keys (name, portal_key) VALUES (?1, ?2)")?;
            for key in keys {
                stmt.execute(params![key.name, key.portal_key])?;
            }
        }
        tx.commit()?;
        info!(count = keys.len(), "client directory replaced");
        Ok(())
    }

    /// All known clients, ordered by name.
    pub fn client_keys(&self) -> Result<Vec<ClientKey>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, portal_key FROM client_keys ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(ClientKey {
                name: row.get(0)?,
                portal_key: row.get(1)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Look up one client by name.
    pub fn client_key(&self, name: &str) -> Result<Option<ClientKey>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, portal_key FROM client_keys WHERE name = ?1")?;
        let mut rows = stmt.query_map(params![name], |row| {
            Ok(ClientKey {
                name: row.get(0)?,
                portal_key: row.get(1)?,
            })
        })?;
        rows.next().transpose().map_err(Into::into)
    }

    /// Persist one statement, replacing any previous rows for its client.
    pub fn save_statement(&mut self, statement: &Statement) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM ledger_rows WHERE client = ?1",
            params![statement.client_name],
        )?;
        tx.execute(
            "DELETE FROM final_balances WHERE client = ?1",
            params![statement.client_name],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO ledger_rows (client, position, date, reference, kind, product,
                     quantity, unit_price, discount, discounted_unit_price, amount,
                     running_balance, offsetting)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for (position, record) in statement.records.iter().enumerate() {
                stmt.execute(params![
                    record.client_name,
                    position as i64,
                    record.date.to_string(),
                    record.reference,
                    record.kind.as_str(),
                    record.product,
                    record.quantity,
                    record.unit_price.map(|d| d.to_string()),
                    record.discount.map(|d| d.to_string()),
                    record.discounted_unit_price.map(|d| d.to_string()),
                    record.amount.to_string(),
                    record.running_balance.to_string(),
                    record.offsetting,
                ])?;
            }
        }

        tx.execute(
            "INSERT INTO final_balances (client, declared, computed, reconciled)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                statement.client_name,
                statement.declared_final_balance.map(|d| d.to_string()),
                statement.computed_final_balance.to_string(),
                statement.reconciled,
            ],
        )?;

        tx.commit()?;
        debug!(
            client = %statement.client_name,
            rows = statement.records.len(),
            "statement saved"
        );
        Ok(())
    }

    /// Load one client's ledger rows in document order.
    pub fn ledger_rows(&self, client: &str) -> Result<Vec<TransactionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT client, date, reference, kind, product, quantity, unit_price,
                    discount, discounted_unit_price, amount, running_balance, offsetting
             FROM ledger_rows WHERE client = ?1 ORDER BY position",
        )?;

        let raw_rows = stmt.query_map(params![client], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<i64>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, Option<String>>(8)?,
                row.get::<_, String>(9)?,
                row.get::<_, String>(10)?,
                row.get::<_, bool>(11)?,
            ))
        })?;

        let mut records = Vec::new();
        for raw in raw_rows {
            let (
                client_name,
                date,
                reference,
                kind,
                product,
                quantity,
                unit_price,
                discount,
                discounted_unit_price,
                amount,
                running_balance,
                offsetting,
            ) = raw?;

            records.push(TransactionRecord {
                client_name,
                date: parse_date(&date)?,
                reference,
                kind: TransactionKind::from_str(&kind)
                    .ok_or_else(|| StoreError::Corrupt(format!("unknown kind '{kind}'")))?,
                product,
                quantity,
                unit_price: parse_optional_decimal(unit_price)?,
                discount: parse_optional_decimal(discount)?,
                discounted_unit_price: parse_optional_decimal(discounted_unit_price)?,
                amount: parse_decimal(&amount)?,
                running_balance: parse_decimal(&running_balance)?,
                offsetting,
            });
        }
        Ok(records)
    }

    /// Load one client's stored balance line.
    pub fn final_balance(&self, client: &str) -> Result<Option<StoredBalance>> {
        let mut stmt = self.conn.prepare(
            "SELECT declared, computed, reconciled FROM final_balances WHERE client = ?1",
        )?;
        let mut rows = stmt.query_map(params![client], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<bool>>(2)?,
            ))
        })?;

        match rows.next().transpose()? {
            None => Ok(None),
            Some((declared, computed, reconciled)) => Ok(Some(StoredBalance {
                declared: parse_optional_decimal(declared)?,
                computed: parse_decimal(&computed)?,
                reconciled,
            })),
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| StoreError::Corrupt(format!("bad date '{s}': {e}")))
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|e| StoreError::Corrupt(format!("bad amount '{s}': {e}")))
}

fn parse_optional_decimal(s: Option<String>) -> Result<Option<Decimal>> {
    s.map(|v| parse_decimal(&v)).transpose()
}
