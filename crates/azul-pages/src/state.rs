//! Maps a verified callback outcome onto the transaction lifecycle.

use crate::callback::Outcome;
use crate::transaction::TransactionState;
use crate::verifier::VerifiedCallback;

const FALLBACK_MESSAGE: &str = "payment feedback error";

/// What the callback does to the transaction, plus whether the outcome was
/// a recognized, successfully-processed one. `recognized` is `false` for
/// unknown outcome codes and for approvals that failed the consistency
/// check, so the caller can surface a generic failure to the shopper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposition {
    pub state: TransactionState,
    pub acquirer_reference: Option<String>,
    pub message: Option<String>,
    pub recognized: bool,
}

/// Pure transition function: `pending` → `done` | `cancel` | `error`.
/// Mutating the stored transaction is the caller's job (see
/// [`crate::feedback::process_feedback`]).
pub fn transition(verified: &VerifiedCallback) -> Disposition {
    match &verified.outcome {
        Outcome::Approved => {
            if verified.mismatches.is_empty() {
                Disposition {
                    state: TransactionState::Done,
                    acquirer_reference: verified.acquirer_reference.clone(),
                    message: None,
                    recognized: true,
                }
            } else {
                // An approval that disagrees with the order's own numbers
                // never lands in `done`.
                let detail = verified
                    .mismatches
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                Disposition {
                    state: TransactionState::Error,
                    acquirer_reference: verified.acquirer_reference.clone(),
                    message: Some(format!("parameter mismatch: {detail}")),
                    recognized: false,
                }
            }
        }
        Outcome::Declined => Disposition {
            state: TransactionState::Error,
            acquirer_reference: verified.acquirer_reference.clone(),
            message: Some(
                verified
                    .error_description
                    .clone()
                    .unwrap_or_else(|| "payment declined".into()),
            ),
            recognized: true,
        },
        Outcome::Cancelled => Disposition {
            state: TransactionState::Cancel,
            acquirer_reference: None,
            message: None,
            recognized: true,
        },
        Outcome::Other(code) => {
            tracing::warn!(code = %code, "unrecognized callback outcome code");
            Disposition {
                state: TransactionState::Error,
                acquirer_reference: verified.acquirer_reference.clone(),
                message: Some(
                    verified
                        .error_description
                        .clone()
                        .unwrap_or_else(|| FALLBACK_MESSAGE.into()),
                ),
                recognized: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;
    use crate::verifier::Mismatch;
    use rust_decimal_macros::dec;

    fn verified(outcome: Outcome) -> VerifiedCallback {
        VerifiedCallback {
            transaction: Transaction::new("SO001", dec!(118.00), "DOP", "39038540035"),
            outcome,
            acquirer_reference: Some("44196".into()),
            error_description: None,
            mismatches: Vec::new(),
        }
    }

    #[test]
    fn approved_goes_done_and_records_acquirer_reference() {
        let d = transition(&verified(Outcome::Approved));
        assert_eq!(d.state, TransactionState::Done);
        assert_eq!(d.acquirer_reference.as_deref(), Some("44196"));
        assert!(d.recognized);
    }

    #[test]
    fn approved_with_mismatch_is_gated_to_error() {
        let mut v = verified(Outcome::Approved);
        v.mismatches.push(Mismatch {
            parameter: "Amount",
            received: Some("99999".into()),
            expected: "11800".into(),
        });
        let d = transition(&v);
        assert_eq!(d.state, TransactionState::Error);
        assert!(!d.recognized);
        let message = d.message.unwrap();
        assert!(message.contains("Amount"));
        assert!(message.contains("99999"));
    }

    #[test]
    fn declined_is_an_error_but_a_recognized_one() {
        let mut v = verified(Outcome::Declined);
        v.error_description = Some("INSUFFICIENT FUNDS".into());
        let d = transition(&v);
        assert_eq!(d.state, TransactionState::Error);
        assert_eq!(d.message.as_deref(), Some("INSUFFICIENT FUNDS"));
        assert_eq!(d.acquirer_reference.as_deref(), Some("44196"));
        assert!(d.recognized);
    }

    #[test]
    fn cancelled_clears_the_acquirer_reference() {
        let d = transition(&verified(Outcome::Cancelled));
        assert_eq!(d.state, TransactionState::Cancel);
        assert!(d.acquirer_reference.is_none());
        assert!(d.recognized);
    }

    #[test]
    fn unknown_outcome_is_an_unrecognized_error() {
        let d = transition(&verified(Outcome::Other("TIMEOUT".into())));
        assert_eq!(d.state, TransactionState::Error);
        assert_eq!(d.message.as_deref(), Some("payment feedback error"));
        assert!(!d.recognized);
    }

    #[test]
    fn unknown_outcome_keeps_the_acquirer_error_description() {
        let mut v = verified(Outcome::Other("REVISAR".into()));
        v.error_description = Some("CONTACTE AL EMISOR".into());
        let d = transition(&v);
        assert_eq!(d.message.as_deref(), Some("CONTACTE AL EMISOR"));
    }
}
