//! One checkout attempt and its lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle of a checkout attempt. `Pending` is the only non-terminal
/// state; a transaction leaves it exactly once, driven by the acquirer
/// callback. Acquirer-side intermediate statuses would also map here as
/// `Pending` but none are emitted by the page today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    Pending,
    Done,
    Cancel,
    Error,
}

impl TransactionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionState::Pending)
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionState::Pending => "pending",
            TransactionState::Done => "done",
            TransactionState::Cancel => "cancel",
            TransactionState::Error => "error",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TransactionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionState::Pending),
            "done" => Ok(TransactionState::Done),
            "cancel" => Ok(TransactionState::Cancel),
            "error" => Ok(TransactionState::Error),
            other => Err(format!("unknown transaction state: {other}")),
        }
    }
}

/// A single checkout attempt. The merchant-assigned `reference` is unique
/// and never reused; the acquirer-assigned reference is captured from the
/// callback on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub state: TransactionState,
    pub acquirer_reference: Option<String>,
    /// Human-readable status detail, set on declined or failed callbacks.
    pub state_message: Option<String>,
    /// Identifier of the acquirer configuration this checkout was built
    /// against (callers typically use the merchant id).
    pub config_id: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// A fresh pending transaction, created when checkout begins.
    pub fn new(
        reference: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        config_id: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            amount,
            currency: currency.into(),
            state: TransactionState::Pending,
            acquirer_reference: None,
            state_message: None,
            config_id: config_id.into(),
            created_at: Utc::now(),
        }
    }
}
