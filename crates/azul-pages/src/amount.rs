//! Monetary formatting for the Payment Page.
//!
//! The page expects amounts as integer minor-currency units: rounded to two
//! decimal places, multiplied by 100, no decimal separator. `118.00` is sent
//! as `"11800"`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::AzulError;

/// ITBIS-inclusive divisor: an 18% tax-inclusive price `p` carries a tax
/// portion of `p - p / 1.18`.
const ITBIS_DIVISOR: Decimal = Decimal::from_parts(118, 0, 0, false, 2);

/// Format an amount as integer minor units, the only numeric representation
/// the page accepts. Rounds half away from zero at two decimals, then scales
/// by 100.
pub fn format_minor_units(amount: Decimal) -> Result<String, AzulError> {
    let cents =
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero) * Decimal::ONE_HUNDRED;
    let units = cents
        .to_i64()
        .ok_or_else(|| AzulError::Validation(format!("amount out of range: {amount}")))?;
    Ok(units.to_string())
}

/// Tax portion of a tax-inclusive amount when the order carries no explicit
/// tax breakdown.
pub fn derive_itbis(amount: Decimal) -> Decimal {
    amount - amount / ITBIS_DIVISOR
}
