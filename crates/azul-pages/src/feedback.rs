//! End-to-end callback processing: resolve → verify → transition → one
//! store write. This is the single place the system mutates a transaction.

use crate::callback::InboundCallback;
use crate::config::AcquirerConfig;
use crate::error::AzulError;
use crate::state;
use crate::store::TransactionStore;
use crate::transaction::Transaction;
use crate::verifier;

/// Result of processing one callback. `recognized` is `false` when the
/// outcome code was unknown or an approval failed its consistency check —
/// the caller should show the shopper a generic failure in that case.
#[derive(Debug, Clone)]
pub struct ProcessedFeedback {
    pub transaction: Transaction,
    pub recognized: bool,
}

/// Process one acquirer callback against the store.
///
/// A callback for a transaction that already left `pending` is ignored: the
/// acquirer retries delivery, and re-applying a terminal outcome could flip
/// a settled order. The prior state is reported back unchanged.
pub fn process_feedback(
    store: &dyn TransactionStore,
    config: &AcquirerConfig,
    callback: &InboundCallback,
) -> Result<ProcessedFeedback, AzulError> {
    let verified = verifier::resolve_and_verify(store, config, callback)?;

    if verified.transaction.state.is_terminal() {
        tracing::warn!(
            reference = %verified.transaction.reference,
            state = %verified.transaction.state,
            "callback for already-final transaction ignored"
        );
        return Ok(ProcessedFeedback {
            transaction: verified.transaction,
            recognized: true,
        });
    }

    let disposition = state::transition(&verified);
    let mut transaction = verified.transaction;
    transaction.state = disposition.state;
    transaction.acquirer_reference = disposition.acquirer_reference;
    transaction.state_message = disposition.message;
    store.update(&transaction)?;

    tracing::info!(
        reference = %transaction.reference,
        state = %transaction.state,
        acquirer_reference = transaction.acquirer_reference.as_deref().unwrap_or(""),
        recognized = disposition.recognized,
        "payment feedback processed"
    );
    Ok(ProcessedFeedback {
        transaction,
        recognized: disposition.recognized,
    })
}
