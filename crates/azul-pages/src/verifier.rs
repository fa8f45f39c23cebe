//! Resolves an inbound callback to its pending transaction and verifies
//! authenticity and financial consistency.

use std::fmt;

use crate::amount;
use crate::callback::{InboundCallback, Outcome};
use crate::config::AcquirerConfig;
use crate::error::AzulError;
use crate::protocol::{fields, Direction};
use crate::signature;
use crate::store::TransactionStore;
use crate::transaction::Transaction;

/// One financial/reference disagreement between the callback and the
/// transaction it claims to settle. Collected, not thrown: the caller
/// decides what a non-empty list means (it gates the `done` transition).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub parameter: &'static str,
    pub received: Option<String>,
    pub expected: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.received {
            Some(received) => write!(
                f,
                "{} (received {received}, expected {})",
                self.parameter, self.expected
            ),
            None => write!(f, "{} (missing, expected {})", self.parameter, self.expected),
        }
    }
}

/// A callback that passed resolution and, where required, signature
/// verification. Carries everything the state machine needs.
#[derive(Debug, Clone)]
pub struct VerifiedCallback {
    pub transaction: Transaction,
    pub outcome: Outcome,
    pub acquirer_reference: Option<String>,
    pub error_description: Option<String>,
    pub mismatches: Vec<Mismatch>,
}

/// Locate the transaction a callback refers to and verify the callback
/// against it. Never mutates anything; safe to re-run on the same input.
///
/// Cancellations skip signature and amount verification entirely: the page
/// does not sign them and sends no amount worth checking.
pub fn resolve_and_verify(
    store: &dyn TransactionStore,
    config: &AcquirerConfig,
    callback: &InboundCallback,
) -> Result<VerifiedCallback, AzulError> {
    let reference = callback.reference().ok_or_else(|| {
        tracing::warn!("received callback with missing reference");
        AzulError::Validation("received callback with missing reference".into())
    })?;

    let mut matches = store.find_by_reference(reference)?;
    let transaction = match matches.len() {
        1 => matches.remove(0),
        0 => {
            tracing::warn!(reference, "no order found for callback");
            return Err(AzulError::Validation(format!(
                "received callback for reference {reference}; no order found"
            )));
        }
        n => {
            tracing::error!(reference, count = n, "multiple orders found for callback");
            return Err(AzulError::Validation(format!(
                "received callback for reference {reference}; multiple order found"
            )));
        }
    };

    let outcome = callback.outcome();
    let acquirer_reference = callback
        .acquirer_reference(config.protocol)
        .map(str::to_owned);
    let error_description = callback.error_description().map(str::to_owned);

    if outcome == Outcome::Cancelled {
        tracing::info!(reference, "cancellation callback, skipping signature check");
        return Ok(VerifiedCallback {
            transaction,
            outcome,
            acquirer_reference,
            error_description,
            mismatches: Vec::new(),
        });
    }

    let computed = signature::sign(config, Direction::Inbound, |name| callback.field(name))?;
    let claimed = callback.claimed_signature().unwrap_or("");
    if !signature::matches(config, &computed, claimed) {
        tracing::warn!(
            reference,
            claimed = %claimed,
            computed = %computed,
            "callback signature verification failed"
        );
        return Err(AzulError::Validation(format!(
            "invalid shasign, received {claimed}, computed {computed}"
        )));
    }

    let mut mismatches = Vec::new();
    if let Some(recorded) = &transaction.acquirer_reference {
        if acquirer_reference.as_deref() != Some(recorded.as_str()) {
            mismatches.push(Mismatch {
                parameter: "Transaction Id",
                received: acquirer_reference.clone(),
                expected: recorded.clone(),
            });
        }
    }
    // Compare against the transaction's own amount under the same rounding
    // and scaling the outbound form used, not the callback's view of itself.
    let expected_amount = amount::format_minor_units(transaction.amount)?;
    if callback.claimed_amount() != Some(expected_amount.as_str()) {
        mismatches.push(Mismatch {
            parameter: "Amount",
            received: callback.claimed_amount().map(str::to_owned),
            expected: expected_amount,
        });
    }

    if !mismatches.is_empty() {
        let detail = mismatches
            .iter()
            .map(Mismatch::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        tracing::warn!(reference, mismatches = %detail, "callback consistency check failed");
    }

    Ok(VerifiedCallback {
        transaction,
        outcome,
        acquirer_reference,
        error_description,
        mismatches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::store::InMemoryTransactionStore;
    use crate::transaction::TransactionState;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn store_with_pending() -> InMemoryTransactionStore {
        let store = InMemoryTransactionStore::new();
        store
            .insert(Transaction::new("SO001", dec!(118.00), "DOP", "39038540035"))
            .unwrap();
        store
    }

    fn approved_fields() -> HashMap<String, String> {
        [
            ("OrderNumber", "SO001"),
            ("Amount", "11800"),
            ("AuthorizationCode", "OK2025"),
            ("DateTime", "20260807143000"),
            ("ResponseCode", "ISO8583"),
            ("IsoCode", "00"),
            ("ResponseMessage", "APROBADA"),
            ("ErrorDescription", ""),
            ("AzulOrderId", "44196"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// An acquirer-side callback with a correctly computed signature.
    fn signed_callback(config: &AcquirerConfig, mut values: HashMap<String, String>) -> InboundCallback {
        let unsigned = InboundCallback::new(values.clone());
        let hash = signature::sign(config, Direction::Inbound, |name| unsigned.field(name)).unwrap();
        values.insert("AuthHash".into(), hash);
        InboundCallback::new(values)
    }

    #[test]
    fn missing_reference_fails_validation() {
        let store = store_with_pending();
        let mut values = approved_fields();
        values.remove("OrderNumber");
        let err =
            resolve_and_verify(&store, &test_config(), &InboundCallback::new(values)).unwrap_err();
        assert!(err.to_string().contains("missing reference"));
    }

    /// A store whose uniqueness guarantee has been violated, e.g. by a bad
    /// migration. The verifier must refuse to pick one of the matches.
    struct CorruptStore(Transaction);

    impl TransactionStore for CorruptStore {
        fn insert(&self, _transaction: Transaction) -> Result<(), AzulError> {
            unimplemented!()
        }

        fn find_by_reference(&self, _reference: &str) -> Result<Vec<Transaction>, AzulError> {
            Ok(vec![self.0.clone(), self.0.clone()])
        }

        fn update(&self, _transaction: &Transaction) -> Result<(), AzulError> {
            unimplemented!()
        }
    }

    #[test]
    fn duplicate_references_fail_with_multiple_order_found() {
        let store = CorruptStore(Transaction::new("SO001", dec!(118.00), "DOP", "39038540035"));
        let config = test_config();
        let callback = signed_callback(&config, approved_fields());
        let err = resolve_and_verify(&store, &config, &callback).unwrap_err();
        assert!(err.to_string().contains("multiple order found"));
    }

    #[test]
    fn unknown_reference_fails_with_no_order_found() {
        let store = InMemoryTransactionStore::new();
        let callback = signed_callback(&test_config(), approved_fields());
        let err = resolve_and_verify(&store, &test_config(), &callback).unwrap_err();
        assert!(err.to_string().contains("no order found"));
    }

    #[test]
    fn valid_signature_resolves_the_transaction() {
        let store = store_with_pending();
        let config = test_config();
        let callback = signed_callback(&config, approved_fields());
        let verified = resolve_and_verify(&store, &config, &callback).unwrap();
        assert_eq!(verified.transaction.reference, "SO001");
        assert_eq!(verified.transaction.state, TransactionState::Pending);
        assert_eq!(verified.outcome, Outcome::Approved);
        assert_eq!(verified.acquirer_reference.as_deref(), Some("44196"));
        assert!(verified.mismatches.is_empty());
    }

    #[test]
    fn tampered_signature_fails_with_invalid_shasign() {
        let store = store_with_pending();
        let mut values = approved_fields();
        values.insert("AuthHash".into(), "deadbeef".repeat(16));
        let err =
            resolve_and_verify(&store, &test_config(), &InboundCallback::new(values)).unwrap_err();
        assert!(err.to_string().contains("invalid shasign"));
    }

    #[test]
    fn absent_signature_fails_for_non_cancel_outcomes() {
        let store = store_with_pending();
        let err = resolve_and_verify(
            &store,
            &test_config(),
            &InboundCallback::new(approved_fields()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid shasign"));
    }

    #[test]
    fn cancellation_bypasses_signature_and_amount_checks() {
        let store = store_with_pending();
        let values: HashMap<String, String> = [
            ("OrderNumber", "SO001"),
            ("ResponseMessage", "CANCELADA"),
            ("AuthHash", "garbage-not-even-hex"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let verified =
            resolve_and_verify(&store, &test_config(), &InboundCallback::new(values)).unwrap();
        assert_eq!(verified.outcome, Outcome::Cancelled);
        assert!(verified.mismatches.is_empty());
    }

    #[test]
    fn tampered_amount_is_a_mismatch_despite_valid_signature() {
        // The signature legitimately covers the tampered amount; only the
        // comparison against the transaction's own recomputed amount can
        // catch the disagreement.
        let store = store_with_pending();
        let config = test_config();
        let mut values = approved_fields();
        values.insert("Amount".into(), "99999".into());
        let callback = signed_callback(&config, values);
        let verified = resolve_and_verify(&store, &config, &callback).unwrap();
        assert_eq!(verified.mismatches.len(), 1);
        let mismatch = &verified.mismatches[0];
        assert_eq!(mismatch.parameter, "Amount");
        assert_eq!(mismatch.received.as_deref(), Some("99999"));
        assert_eq!(mismatch.expected, "11800");
    }

    #[test]
    fn acquirer_reference_disagreement_is_collected_not_fatal() {
        let store = InMemoryTransactionStore::new();
        let mut tx = Transaction::new("SO001", dec!(118.00), "DOP", "39038540035");
        tx.acquirer_reference = Some("OLD-REF".into());
        store.insert(tx).unwrap();

        let config = test_config();
        let callback = signed_callback(&config, approved_fields());
        let verified = resolve_and_verify(&store, &config, &callback).unwrap();
        assert_eq!(verified.mismatches.len(), 1);
        assert_eq!(verified.mismatches[0].parameter, "Transaction Id");
    }

    #[test]
    fn verification_is_re_entrant() {
        let store = store_with_pending();
        let config = test_config();
        let callback = signed_callback(&config, approved_fields());
        let first = resolve_and_verify(&store, &config, &callback).unwrap();
        let second = resolve_and_verify(&store, &config, &callback).unwrap();
        assert_eq!(first.transaction, second.transaction);
        assert_eq!(first.mismatches, second.mismatches);
    }
}
