//! Assembles the redirect form posted to the hosted payment page.

use rust_decimal::Decimal;
use url::Url;

use crate::amount;
use crate::config::AcquirerConfig;
use crate::error::AzulError;
use crate::protocol::{fields, Direction};
use crate::signature;
use crate::transaction::Transaction;

/// Merchant-side callback paths the acquirer redirects the browser back to.
pub const APPROVED_PATH: &str = "/payment/azul/approved";
pub const DECLINED_PATH: &str = "/payment/azul/declined";
pub const CANCEL_PATH: &str = "/payment/azul/cancel";

/// Fixed currency marker the page expects.
const CURRENCY_MARKER: &str = "$";

/// Caller-supplied values for one checkout. The type replaces the loose
/// value dict of older integrations; emptiness is still validated so a
/// caller wiring fields through from a form cannot send a blank checkout.
#[derive(Debug, Clone)]
pub struct CheckoutValues {
    /// Merchant order reference, unique per checkout attempt.
    pub reference: String,
    /// Where the shopper lands after the whole exchange completes.
    pub return_url: String,
    /// Explicit tax portion; when `None` the ITBIS is derived from the
    /// tax-inclusive amount.
    pub tax: Option<Decimal>,
}

/// The ordered field set submitted to the payment page, signature included.
/// Built fresh per checkout, never persisted; insertion order is the order
/// the fields are rendered in.
#[derive(Debug, Clone, Default)]
pub struct OutboundPayload {
    entries: Vec<(&'static str, String)>,
}

impl OutboundPayload {
    fn push(&mut self, name: &'static str, value: impl Into<String>) {
        self.entries.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All fields in submission order.
    pub fn entries(&self) -> &[(&'static str, String)] {
        &self.entries
    }

    pub fn auth_hash(&self) -> Option<&str> {
        self.get(fields::OUTBOUND_AUTH_HASH)
    }
}

/// Build the complete, signed field set for one checkout.
///
/// `base_url` is the merchant's own externally-reachable root, passed
/// explicitly — the builder reads no ambient request context. No side
/// effects; rendering and auto-submitting the form is the caller's job.
pub fn build_outbound_payload(
    transaction: &Transaction,
    config: &AcquirerConfig,
    base_url: &Url,
    values: &CheckoutValues,
) -> Result<OutboundPayload, AzulError> {
    config.validate()?;
    if values.reference.trim().is_empty() {
        return Err(AzulError::Validation("missing reference".into()));
    }
    if transaction.amount <= Decimal::ZERO {
        return Err(AzulError::Validation(format!(
            "missing or invalid amount: {}",
            transaction.amount
        )));
    }

    let amount = amount::format_minor_units(transaction.amount)?;
    let itbis = amount::format_minor_units(
        values
            .tax
            .unwrap_or_else(|| amount::derive_itbis(transaction.amount)),
    )?;

    let mut payload = OutboundPayload::default();
    payload.push(fields::MERCHANT_ID, config.merchant_id.clone());
    payload.push(fields::MERCHANT_NAME, config.merchant_name.clone());
    payload.push(fields::MERCHANT_TYPE, config.merchant_type.clone());
    payload.push(fields::CURRENCY_CODE, CURRENCY_MARKER);
    payload.push(fields::ORDER_NUMBER, values.reference.clone());
    payload.push(fields::AMOUNT, amount);
    payload.push(fields::ITBIS, itbis);
    payload.push(
        fields::APPROVED_URL,
        callback_url(base_url, APPROVED_PATH, &values.return_url, None)?,
    );
    payload.push(
        fields::DECLINED_URL,
        callback_url(base_url, DECLINED_PATH, &values.return_url, None)?,
    );
    payload.push(
        fields::CANCEL_URL,
        callback_url(
            base_url,
            CANCEL_PATH,
            &values.return_url,
            Some(&values.reference),
        )?,
    );

    // Two reserved custom-field slots, always inert.
    payload.push(fields::USE_CUSTOM_FIELD_1, "0");
    payload.push(fields::CUSTOM_FIELD_1_LABEL, "");
    payload.push(fields::CUSTOM_FIELD_1_VALUE, "");
    payload.push(fields::USE_CUSTOM_FIELD_2, "0");
    payload.push(fields::CUSTOM_FIELD_2_LABEL, "");
    payload.push(fields::CUSTOM_FIELD_2_VALUE, "");

    let auth_hash = signature::sign(config, Direction::Outbound, |name| payload.get(name))?;
    payload.push(fields::OUTBOUND_AUTH_HASH, auth_hash);

    tracing::debug!(
        reference = %values.reference,
        amount = %payload.get(fields::AMOUNT).unwrap_or(""),
        page = %config.payment_page_url(),
        "outbound payload assembled"
    );
    Ok(payload)
}

fn callback_url(
    base: &Url,
    path: &str,
    return_url: &str,
    reference: Option<&str>,
) -> Result<String, AzulError> {
    let mut url = base
        .join(path)
        .map_err(|e| AzulError::Validation(format!("invalid base url: {e}")))?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("return_url", return_url);
        if let Some(reference) = reference {
            pairs.append_pair("reference", reference);
        }
    }
    Ok(url.to_string())
}
