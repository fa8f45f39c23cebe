//! Transaction persistence seam.
//!
//! The verifier needs lookup-by-reference and the state machine needs one
//! update per transaction; everything else about persistence belongs to the
//! surrounding application. Implementations must be thread-safe and must
//! serialize lookup-then-update per reference — the acquirer retries and
//! double-sends callbacks.

use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::error::AzulError;
use crate::transaction::{Transaction, TransactionState};

/// Storage backend for [`Transaction`] records.
pub trait TransactionStore: Send + Sync {
    /// Persist a fresh transaction. Fails if the reference is already taken;
    /// references are never reused.
    fn insert(&self, transaction: Transaction) -> Result<(), AzulError>;

    /// All transactions carrying this reference. The uniqueness invariant
    /// makes more than one element a data-corruption signal the verifier
    /// reports rather than hides.
    fn find_by_reference(&self, reference: &str) -> Result<Vec<Transaction>, AzulError>;

    /// Write back the post-callback state of a known transaction.
    fn update(&self, transaction: &Transaction) -> Result<(), AzulError>;
}

/// In-memory store backed by DashMap. Fast, but pending checkouts are lost
/// on restart — callbacks for them will no longer match.
#[derive(Default)]
pub struct InMemoryTransactionStore {
    transactions: DashMap<String, Transaction>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn insert(&self, transaction: Transaction) -> Result<(), AzulError> {
        use dashmap::mapref::entry::Entry;
        match self.transactions.entry(transaction.reference.clone()) {
            Entry::Occupied(_) => Err(AzulError::Validation(format!(
                "reference already used: {}",
                transaction.reference
            ))),
            Entry::Vacant(slot) => {
                slot.insert(transaction);
                Ok(())
            }
        }
    }

    fn find_by_reference(&self, reference: &str) -> Result<Vec<Transaction>, AzulError> {
        Ok(self
            .transactions
            .get(reference)
            .map(|tx| vec![tx.clone()])
            .unwrap_or_default())
    }

    fn update(&self, transaction: &Transaction) -> Result<(), AzulError> {
        match self.transactions.get_mut(&transaction.reference) {
            Some(mut slot) => {
                *slot = transaction.clone();
                Ok(())
            }
            None => Err(AzulError::Store(format!(
                "unknown reference: {}",
                transaction.reference
            ))),
        }
    }
}

/// Persistent store backed by SQLite. Survives restarts, which matters here:
/// the redirect round-trip through the acquirer can outlive a deploy.
pub struct SqliteTransactionStore {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteTransactionStore {
    /// Open (or create) the transaction database at the given path.
    ///
    /// On Unix the file permissions are restricted to 0600; the table holds
    /// order references and amounts.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = rusqlite::Connection::open(path)?;
        Self::init(&conn)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
                tracing::warn!(
                    path = %path,
                    error = %e,
                    "failed to set transaction database file permissions to 0600"
                );
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database; useful in tests and throwaway tooling.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS transactions (
                reference TEXT PRIMARY KEY,
                amount TEXT NOT NULL,
                currency TEXT NOT NULL,
                state TEXT NOT NULL,
                acquirer_reference TEXT,
                state_message TEXT,
                config_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            PRAGMA journal_mode=WAL;",
        )
    }

    fn lock(&self) -> MutexGuard<'_, rusqlite::Connection> {
        match self.conn.lock() {
            Ok(conn) => conn,
            Err(poisoned) => {
                tracing::error!("transaction store mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

type Row = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

fn parse_row(row: Row) -> Result<Transaction, AzulError> {
    let (reference, amount, currency, state, acquirer_reference, state_message, config_id, created_at) =
        row;
    Ok(Transaction {
        amount: Decimal::from_str(&amount)
            .map_err(|e| AzulError::Store(format!("corrupt amount for {reference}: {e}")))?,
        state: state
            .parse::<TransactionState>()
            .map_err(|e| AzulError::Store(format!("corrupt state for {reference}: {e}")))?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| AzulError::Store(format!("corrupt timestamp for {reference}: {e}")))?
            .with_timezone(&chrono::Utc),
        reference,
        currency,
        acquirer_reference,
        state_message,
        config_id,
    })
}

impl TransactionStore for SqliteTransactionStore {
    fn insert(&self, transaction: Transaction) -> Result<(), AzulError> {
        let conn = self.lock();
        // PRIMARY KEY enforces reference uniqueness at the database level,
        // atomically across processes.
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO transactions
             (reference, amount, currency, state, acquirer_reference, state_message, config_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                transaction.reference,
                transaction.amount.to_string(),
                transaction.currency,
                transaction.state.to_string(),
                transaction.acquirer_reference,
                transaction.state_message,
                transaction.config_id,
                transaction.created_at.to_rfc3339(),
            ],
        );
        match inserted {
            Ok(1) => Ok(()),
            Ok(_) => Err(AzulError::Validation(format!(
                "reference already used: {}",
                transaction.reference
            ))),
            Err(e) => Err(AzulError::Store(e.to_string())),
        }
    }

    fn find_by_reference(&self, reference: &str) -> Result<Vec<Transaction>, AzulError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT reference, amount, currency, state, acquirer_reference,
                        state_message, config_id, created_at
                 FROM transactions WHERE reference = ?1",
            )
            .map_err(|e| AzulError::Store(e.to_string()))?;
        let rows = stmt
            .query_map([reference], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            })
            .map_err(|e| AzulError::Store(e.to_string()))?
            .collect::<Result<Vec<Row>, _>>()
            .map_err(|e| AzulError::Store(e.to_string()))?;
        rows.into_iter().map(parse_row).collect()
    }

    fn update(&self, transaction: &Transaction) -> Result<(), AzulError> {
        let conn = self.lock();
        let changed = conn
            .execute(
                "UPDATE transactions
                 SET state = ?2, acquirer_reference = ?3, state_message = ?4
                 WHERE reference = ?1",
                rusqlite::params![
                    transaction.reference,
                    transaction.state.to_string(),
                    transaction.acquirer_reference,
                    transaction.state_message,
                ],
            )
            .map_err(|e| AzulError::Store(e.to_string()))?;
        if changed == 1 {
            Ok(())
        } else {
            Err(AzulError::Store(format!(
                "unknown reference: {}",
                transaction.reference
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(reference: &str) -> Transaction {
        Transaction::new(reference, dec!(118.00), "DOP", "39038540035")
    }

    fn exercise(store: &dyn TransactionStore) {
        store.insert(sample("SO001")).unwrap();

        // Duplicate reference is rejected.
        let dup = store.insert(sample("SO001")).unwrap_err();
        assert!(matches!(dup, AzulError::Validation(_)));

        // Exactly one match, round-tripped intact.
        let found = store.find_by_reference("SO001").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].amount, dec!(118.00));
        assert_eq!(found[0].state, TransactionState::Pending);

        assert!(store.find_by_reference("SO999").unwrap().is_empty());

        // State write-back is visible to the next lookup.
        let mut tx = found.into_iter().next().unwrap();
        tx.state = TransactionState::Done;
        tx.acquirer_reference = Some("44196".into());
        store.update(&tx).unwrap();
        let after = store.find_by_reference("SO001").unwrap();
        assert_eq!(after[0].state, TransactionState::Done);
        assert_eq!(after[0].acquirer_reference.as_deref(), Some("44196"));

        // Updating an unknown reference is a storage error.
        let ghost = sample("SO404");
        assert!(matches!(store.update(&ghost), Err(AzulError::Store(_))));
    }

    #[test]
    fn in_memory_store_contract() {
        exercise(&InMemoryTransactionStore::new());
    }

    #[test]
    fn sqlite_store_contract() {
        exercise(&SqliteTransactionStore::open_in_memory().unwrap());
    }
}
