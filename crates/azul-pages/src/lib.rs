//! Azul Payment Page integration core.
//!
//! A redirect-based card-payment flow: the merchant builds a signed form
//! that the browser auto-submits to the acquirer's hosted page, and the
//! page later redirects the browser back to one of three merchant callback
//! endpoints carrying a signed outcome.
//!
//! # Flow
//!
//! - [`payload::build_outbound_payload`] — assemble and sign the redirect
//!   form when checkout begins
//! - [`verifier::resolve_and_verify`] — match an inbound callback to its
//!   pending transaction, verify signature and financial consistency
//! - [`feedback::process_feedback`] — drive the lifecycle
//!   (`pending → done | cancel | error`) and persist the one state write
//!
//! Both live generations of the page's hash scheme are supported; see
//! [`protocol::ProtocolVersion`].
//!
//! # Quick example
//!
//! ```no_run
//! use azul_pages::config::{AcquirerConfig, Environment};
//! use azul_pages::payload::{build_outbound_payload, CheckoutValues};
//! use azul_pages::protocol::ProtocolVersion;
//! use azul_pages::store::{InMemoryTransactionStore, TransactionStore};
//! use azul_pages::transaction::Transaction;
//! use rust_decimal::Decimal;
//! use url::Url;
//!
//! let config = AcquirerConfig {
//!     merchant_id: "39038540035".into(),
//!     merchant_type: "E-Commerce".into(),
//!     merchant_name: "My Shop".into(),
//!     auth_key: "secret".into(),
//!     environment: Environment::Test,
//!     protocol: ProtocolVersion::V2,
//! };
//!
//! let store = InMemoryTransactionStore::new();
//! let tx = Transaction::new("SO001", Decimal::new(11800, 2), "DOP", config.merchant_id.clone());
//! store.insert(tx.clone()).unwrap();
//!
//! let base_url = Url::parse("https://shop.example.com").unwrap();
//! let values = CheckoutValues {
//!     reference: "SO001".into(),
//!     return_url: "/shop/confirm".into(),
//!     tax: None,
//! };
//! let payload = build_outbound_payload(&tx, &config, &base_url, &values).unwrap();
//! // Render `payload.entries()` as hidden inputs posted to
//! // `config.payment_page_url()`.
//! ```

pub mod amount;
pub mod callback;
pub mod config;
pub mod error;
pub mod feedback;
pub mod payload;
pub mod protocol;
pub mod security;
pub mod signature;
pub mod state;
pub mod store;
pub mod transaction;
pub mod verifier;

pub use callback::{InboundCallback, Outcome};
pub use config::{AcquirerConfig, Environment};
pub use error::AzulError;
pub use feedback::{process_feedback, ProcessedFeedback};
pub use payload::{build_outbound_payload, CheckoutValues, OutboundPayload};
pub use protocol::{Direction, ProtocolVersion};
pub use state::{transition, Disposition};
pub use store::{InMemoryTransactionStore, SqliteTransactionStore, TransactionStore};
pub use transaction::{Transaction, TransactionState};
pub use verifier::{resolve_and_verify, Mismatch, VerifiedCallback};
