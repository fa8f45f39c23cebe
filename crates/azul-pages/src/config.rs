//! Merchant-side acquirer configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AzulError;
use crate::protocol::ProtocolVersion;

const PRODUCTION_PAGE_URL: &str = "https://pagos.azul.com.do/paymentpage/Default.aspx";
const TEST_PAGE_URL: &str = "https://pruebas.azul.com.do/paymentpage/Default.aspx";

/// Which acquirer endpoint the redirect form is submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Test,
    Production,
}

impl Environment {
    /// Hosted payment page URL for this environment.
    pub fn payment_page_url(&self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_PAGE_URL,
            Environment::Test => TEST_PAGE_URL,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "prod" | "production" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// One merchant account at the acquirer. Created by an administrator,
/// read-only at transaction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquirerConfig {
    pub merchant_id: String,
    pub merchant_type: String,
    /// Display name shown on the hosted page.
    pub merchant_name: String,
    /// Pre-shared secret. Never transmitted; used as the hash suffix and,
    /// in [`ProtocolVersion::V2`], as the HMAC key.
    pub auth_key: String,
    pub environment: Environment,
    pub protocol: ProtocolVersion,
}

impl AcquirerConfig {
    /// Payment page URL selected by the environment flag.
    pub fn payment_page_url(&self) -> &'static str {
        self.environment.payment_page_url()
    }

    /// Every mandatory field must be present before a checkout may start.
    pub fn validate(&self) -> Result<(), AzulError> {
        let missing = [
            ("merchant id", &self.merchant_id),
            ("merchant type", &self.merchant_type),
            ("merchant name", &self.merchant_name),
            ("auth key", &self.auth_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AzulError::Configuration(format!(
                "missing acquirer configuration: {}",
                missing.join(", ")
            )))
        }
    }
}
