//! HTTP glue for the Azul Payment Page flow.
//!
//! - [`routes`] — checkout initiation and the three acquirer callback
//!   endpoints
//! - [`form`] — the auto-submitting redirect page
//! - [`config`] — environment-driven server configuration
//! - [`metrics`] — Prometheus counters for checkouts and callbacks

pub mod config;
pub mod form;
pub mod metrics;
pub mod routes;
pub mod state;
