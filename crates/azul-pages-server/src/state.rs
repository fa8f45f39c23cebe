use std::sync::Arc;

use azul_pages::config::AcquirerConfig;
use azul_pages::store::TransactionStore;
use url::Url;

/// Shared application state for the checkout/callback server.
pub struct AppState {
    pub acquirer: AcquirerConfig,
    /// The merchant's externally-reachable root; callback URLs are joined
    /// onto it.
    pub base_url: Url,
    pub store: Arc<dyn TransactionStore>,
    /// Bearer token for the /metrics endpoint.
    pub metrics_token: Option<Vec<u8>>,
}
