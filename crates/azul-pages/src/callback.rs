//! The acquirer's callback payload: an unordered field map posted back to
//! the merchant after the hosted-page exchange.

use std::collections::HashMap;

use crate::protocol::{fields, ProtocolVersion};

/// Textual result status of the exchange, parsed from `ResponseMessage`.
/// Codes are compared uppercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Approved,
    Declined,
    Cancelled,
    /// Anything the page emitted outside the three known codes, kept
    /// verbatim (uppercased) for diagnostics.
    Other(String),
}

impl Outcome {
    pub fn parse(code: &str) -> Outcome {
        match code.to_ascii_uppercase().as_str() {
            "APROBADA" => Outcome::Approved,
            "DECLINADA" => Outcome::Declined,
            "CANCELADA" => Outcome::Cancelled,
            other => Outcome::Other(other.to_string()),
        }
    }
}

/// One inbound callback, consumed once. Field values arrive form-encoded;
/// the HTTP layer merges the callback URL's own query parameters in before
/// handing the map over.
#[derive(Debug, Clone)]
pub struct InboundCallback {
    values: HashMap<String, String>,
}

impl InboundCallback {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Raw field value. Present-but-empty is still `Some`; signing treats
    /// both the same.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// The merchant reference the callback claims to settle. Empty counts
    /// as absent.
    pub fn reference(&self) -> Option<&str> {
        self.field(fields::CB_ORDER_NUMBER).filter(|v| !v.is_empty())
    }

    pub fn outcome(&self) -> Outcome {
        Outcome::parse(self.field(fields::CB_RESPONSE_MESSAGE).unwrap_or(""))
    }

    /// The signature the acquirer claims to have computed. Empty counts as
    /// absent (cancellations are unsigned).
    pub fn claimed_signature(&self) -> Option<&str> {
        self.field(fields::CB_AUTH_HASH).filter(|v| !v.is_empty())
    }

    pub fn claimed_amount(&self) -> Option<&str> {
        self.field(fields::CB_AMOUNT)
    }

    /// Acquirer-assigned reference; which field carries it depends on the
    /// protocol generation.
    pub fn acquirer_reference(&self, protocol: ProtocolVersion) -> Option<&str> {
        self.field(protocol.acquirer_reference_field())
            .filter(|v| !v.is_empty())
    }

    pub fn error_description(&self) -> Option<&str> {
        self.field(fields::CB_ERROR_DESCRIPTION).filter(|v| !v.is_empty())
    }
}

impl From<HashMap<String, String>> for InboundCallback {
    fn from(values: HashMap<String, String>) -> Self {
        Self::new(values)
    }
}
