//! Environment-driven server configuration.

use azul_pages::config::{AcquirerConfig, Environment};
use azul_pages::protocol::ProtocolVersion;
use url::Url;

/// Everything the server binary needs, read once at startup.
pub struct ServerConfig {
    pub acquirer: AcquirerConfig,
    pub base_url: Url,
    pub port: u16,
    pub db_path: String,
    pub rate_limit_rpm: u64,
    pub metrics_token: Option<Vec<u8>>,
}

impl ServerConfig {
    /// Read configuration from the environment, exiting on anything
    /// unusable. A payment server with half a configuration must not come
    /// up at all.
    pub fn from_env() -> Self {
        let environment: Environment = parsed_or("AZUL_ENVIRONMENT", Environment::Test);
        let protocol: ProtocolVersion = parsed_or("AZUL_PROTOCOL", ProtocolVersion::V2);

        let acquirer = AcquirerConfig {
            merchant_id: required("AZUL_MERCHANT_ID"),
            merchant_type: required("AZUL_MERCHANT_TYPE"),
            merchant_name: required("AZUL_MERCHANT_NAME"),
            auth_key: required("AZUL_AUTH_KEY"),
            environment,
            protocol,
        };

        let base_url = required("BASE_URL");
        let base_url = match Url::parse(&base_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(base_url = %base_url, error = %e, "BASE_URL is not a valid URL");
                std::process::exit(1);
            }
        };

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let db_path = std::env::var("TRANSACTIONS_DB_PATH")
            .unwrap_or_else(|_| "./azul-transactions.db".to_string());

        let rate_limit_rpm: u64 = std::env::var("RATE_LIMIT_RPM")
            .ok()
            .and_then(|r| r.parse().ok())
            .unwrap_or(120);

        let metrics_token = std::env::var("METRICS_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| s.into_bytes());

        Self {
            acquirer,
            base_url,
            port,
            db_path,
            rate_limit_rpm,
            metrics_token,
        }
    }
}

fn required(name: &str) -> String {
    match std::env::var(name).ok().filter(|v| !v.is_empty()) {
        Some(value) => value,
        None => {
            tracing::error!("{name} is required");
            std::process::exit(1);
        }
    }
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(value = %raw, "invalid {name}: {e}");
                std::process::exit(1);
            }
        },
        Err(_) => default,
    }
}
