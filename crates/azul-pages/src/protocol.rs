//! Protocol generations of the Azul Payment Page hash scheme.
//!
//! Two generations of the scheme are live in the field and a merchant
//! account is provisioned for exactly one of them:
//!
//! - [`ProtocolVersion::V1`] — plain SHA-512 over the field concatenation,
//!   hash comparison ignores case, the response code and ISO code arrive
//!   fused in a single `ResponseCodeISOCode` field, and the acquirer
//!   reference is carried in `RRN`.
//! - [`ProtocolVersion::V2`] — HMAC-SHA512 keyed with the shared secret,
//!   exact (constant-time) hash comparison, separate `ResponseCode` and
//!   `IsoCode` fields, and the acquirer reference in `AzulOrderId`.
//!
//! The version owns everything that differs between the generations: the
//! ordered signing field lists, the digest algorithm, the comparison policy
//! and the acquirer-reference field name. Nothing else in the crate branches
//! on the generation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Well-known field names of the Payment Page wire contract.
pub mod fields {
    pub const MERCHANT_ID: &str = "Azul_MerchantId";
    pub const MERCHANT_NAME: &str = "Azul_MerchantName";
    pub const MERCHANT_TYPE: &str = "Azul_MerchantType";
    pub const CURRENCY_CODE: &str = "Azul_CurrencyCode";
    pub const ORDER_NUMBER: &str = "Azul_OrderNumber";
    pub const AMOUNT: &str = "Azul_Amount";
    pub const ITBIS: &str = "Azul_ITBIS";
    pub const APPROVED_URL: &str = "Azul_ApprovedUrl";
    pub const DECLINED_URL: &str = "Azul_DeclinedUrl";
    pub const CANCEL_URL: &str = "Azul_CancelUrl";
    pub const USE_CUSTOM_FIELD_1: &str = "Azul_UseCustomField1";
    pub const CUSTOM_FIELD_1_LABEL: &str = "Azul_CustomField1Label";
    pub const CUSTOM_FIELD_1_VALUE: &str = "Azul_CustomField1Value";
    pub const USE_CUSTOM_FIELD_2: &str = "Azul_UseCustomField2";
    pub const CUSTOM_FIELD_2_LABEL: &str = "Azul_CustomField2Label";
    pub const CUSTOM_FIELD_2_VALUE: &str = "Azul_CustomField2Value";
    pub const OUTBOUND_AUTH_HASH: &str = "Azul_AuthHash";

    pub const CB_ORDER_NUMBER: &str = "OrderNumber";
    pub const CB_AMOUNT: &str = "Amount";
    pub const CB_AUTHORIZATION_CODE: &str = "AuthorizationCode";
    pub const CB_DATE_TIME: &str = "DateTime";
    pub const CB_RESPONSE_CODE_ISO_CODE: &str = "ResponseCodeISOCode";
    pub const CB_RESPONSE_CODE: &str = "ResponseCode";
    pub const CB_ISO_CODE: &str = "IsoCode";
    pub const CB_RESPONSE_MESSAGE: &str = "ResponseMessage";
    pub const CB_ERROR_DESCRIPTION: &str = "ErrorDescription";
    pub const CB_RRN: &str = "RRN";
    pub const CB_AZUL_ORDER_ID: &str = "AzulOrderId";
    pub const CB_AUTH_HASH: &str = "AuthHash";
}

/// Ordered signing list for merchant → acquirer traffic. Identical in both
/// generations.
const OUTBOUND_FIELDS: &[&str] = &[
    fields::MERCHANT_ID,
    fields::MERCHANT_NAME,
    fields::MERCHANT_TYPE,
    fields::CURRENCY_CODE,
    fields::ORDER_NUMBER,
    fields::AMOUNT,
    fields::ITBIS,
    fields::APPROVED_URL,
    fields::DECLINED_URL,
    fields::CANCEL_URL,
    fields::USE_CUSTOM_FIELD_1,
    fields::CUSTOM_FIELD_1_LABEL,
    fields::CUSTOM_FIELD_1_VALUE,
    fields::USE_CUSTOM_FIELD_2,
    fields::CUSTOM_FIELD_2_LABEL,
    fields::CUSTOM_FIELD_2_VALUE,
];

/// Ordered signing list for acquirer → merchant traffic, first generation.
const INBOUND_FIELDS_V1: &[&str] = &[
    fields::CB_ORDER_NUMBER,
    fields::CB_AMOUNT,
    fields::CB_AUTHORIZATION_CODE,
    fields::CB_DATE_TIME,
    fields::CB_RESPONSE_CODE_ISO_CODE,
    fields::CB_RESPONSE_MESSAGE,
    fields::CB_ERROR_DESCRIPTION,
    fields::CB_RRN,
];

/// Ordered signing list for acquirer → merchant traffic, second generation.
const INBOUND_FIELDS_V2: &[&str] = &[
    fields::CB_ORDER_NUMBER,
    fields::CB_AMOUNT,
    fields::CB_AUTHORIZATION_CODE,
    fields::CB_DATE_TIME,
    fields::CB_RESPONSE_CODE,
    fields::CB_ISO_CODE,
    fields::CB_RESPONSE_MESSAGE,
    fields::CB_ERROR_DESCRIPTION,
    fields::CB_AZUL_ORDER_ID,
];

/// Which party authored the signed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Merchant → acquirer: the redirect form posted to the payment page.
    Outbound,
    /// Acquirer → merchant: the callback posted back after the exchange.
    Inbound,
}

/// How a claimed hash is compared against the recomputed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureComparison {
    /// ASCII-case-insensitive equality (V1 pages emit uppercase hex).
    CaseInsensitive,
    /// Exact equality, constant-time.
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    V1,
    #[default]
    V2,
}

impl ProtocolVersion {
    /// The ordered field list signed for the given traffic direction.
    pub fn signed_fields(&self, direction: Direction) -> &'static [&'static str] {
        match direction {
            Direction::Outbound => OUTBOUND_FIELDS,
            Direction::Inbound => match self {
                ProtocolVersion::V1 => INBOUND_FIELDS_V1,
                ProtocolVersion::V2 => INBOUND_FIELDS_V2,
            },
        }
    }

    pub fn comparison(&self) -> SignatureComparison {
        match self {
            ProtocolVersion::V1 => SignatureComparison::CaseInsensitive,
            ProtocolVersion::V2 => SignatureComparison::Exact,
        }
    }

    /// Callback field carrying the acquirer-assigned transaction reference.
    pub fn acquirer_reference_field(&self) -> &'static str {
        match self {
            ProtocolVersion::V1 => fields::CB_RRN,
            ProtocolVersion::V2 => fields::CB_AZUL_ORDER_ID,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V1 => write!(f, "v1"),
            ProtocolVersion::V2 => write!(f, "v2"),
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(ProtocolVersion::V1),
            "v2" | "2" => Ok(ProtocolVersion::V2),
            other => Err(format!("unknown protocol version: {other}")),
        }
    }
}
