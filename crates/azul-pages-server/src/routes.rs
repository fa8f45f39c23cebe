//! Checkout initiation and the three acquirer callback endpoints.
//!
//! The callback endpoints are functionally identical — same field set, same
//! verification, same state machine — and differ only in which outcome the
//! acquirer intends. After processing, the shopper's browser is redirected
//! to the `return_url` the checkout was started with.

use std::collections::HashMap;

use actix_web::{get, post, web, HttpRequest, HttpResponse};
use azul_pages::callback::InboundCallback;
use azul_pages::error::AzulError;
use azul_pages::payload::{build_outbound_payload, CheckoutValues};
use azul_pages::protocol::fields;
use azul_pages::transaction::Transaction;
use azul_pages::{feedback, security};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::form::render_payment_form;
use crate::metrics;
use crate::state::AppState;

const DEFAULT_CURRENCY: &str = "DOP";
const DEFAULT_RETURN_URL: &str = "/";

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub reference: String,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub return_url: Option<String>,
    pub tax: Option<Decimal>,
}

fn error_response(err: &AzulError) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        AzulError::Validation(_) => HttpResponse::BadRequest().json(body),
        AzulError::Configuration(_) | AzulError::Store(_) => {
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn rejection_reason(err: &AzulError) -> &'static str {
    match err {
        AzulError::Validation(_) => "validation",
        AzulError::Configuration(_) => "configuration",
        AzulError::Store(_) => "storage",
    }
}

/// Start a checkout: persist the pending transaction and hand the browser
/// the auto-submitting form aimed at the acquirer's page.
#[post("/payment/azul/checkout")]
pub async fn checkout(
    state: web::Data<AppState>,
    request: web::Form<CheckoutRequest>,
) -> HttpResponse {
    let request = request.into_inner();
    let transaction = Transaction::new(
        request.reference.clone(),
        request.amount,
        request.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
        state.acquirer.merchant_id.clone(),
    );
    let values = CheckoutValues {
        reference: request.reference,
        return_url: request
            .return_url
            .unwrap_or_else(|| DEFAULT_RETURN_URL.to_string()),
        tax: request.tax,
    };

    // Build before insert: a payload failure must not leave a stray pending
    // transaction behind.
    let payload = match build_outbound_payload(&transaction, &state.acquirer, &state.base_url, &values)
    {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(reference = %transaction.reference, error = %e, "checkout rejected");
            metrics::CHECKOUT_REQUESTS
                .with_label_values(&["rejected"])
                .inc();
            return error_response(&e);
        }
    };
    if let Err(e) = state.store.insert(transaction) {
        metrics::CHECKOUT_REQUESTS
            .with_label_values(&["rejected"])
            .inc();
        return error_response(&e);
    }

    metrics::CHECKOUT_REQUESTS.with_label_values(&["ok"]).inc();
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_payment_form(state.acquirer.payment_page_url(), &payload))
}

/// Shared handler for all three outcome endpoints. The callback URL's own
/// query parameters (`return_url`, and `reference` on cancels) are merged
/// underneath the acquirer's form fields.
fn handle_callback(
    state: &AppState,
    endpoint: &'static str,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
) -> HttpResponse {
    let mut merged = query;
    merged.extend(form);

    if endpoint == "cancel" {
        // Cancellations arrive sparsely populated. The outcome code is
        // implied by the endpoint, and the reference travels in the query
        // parameter the cancel URL was built with.
        merged
            .entry(fields::CB_RESPONSE_MESSAGE.to_string())
            .or_insert_with(|| "CANCELADA".to_string());
        if let Some(reference) = merged.get("reference").cloned() {
            merged
                .entry(fields::CB_ORDER_NUMBER.to_string())
                .or_insert(reference);
        }
    }

    let return_url = merged
        .get("return_url")
        .cloned()
        .unwrap_or_else(|| DEFAULT_RETURN_URL.to_string());

    let callback = InboundCallback::new(merged);
    match feedback::process_feedback(state.store.as_ref(), &state.acquirer, &callback) {
        Ok(processed) => {
            let result = processed.transaction.state.to_string();
            metrics::CALLBACK_REQUESTS
                .with_label_values(&[endpoint, result.as_str()])
                .inc();
            HttpResponse::Found()
                .insert_header(("Location", return_url))
                .finish()
        }
        Err(e) => {
            tracing::warn!(endpoint, error = %e, "callback rejected");
            metrics::CALLBACK_REJECTIONS
                .with_label_values(&[rejection_reason(&e)])
                .inc();
            error_response(&e)
        }
    }
}

#[post("/payment/azul/approved")]
pub async fn approved(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
    form: web::Form<HashMap<String, String>>,
) -> HttpResponse {
    handle_callback(&state, "approved", query.into_inner(), form.into_inner())
}

#[post("/payment/azul/declined")]
pub async fn declined(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
    form: web::Form<HashMap<String, String>>,
) -> HttpResponse {
    handle_callback(&state, "declined", query.into_inner(), form.into_inner())
}

#[post("/payment/azul/cancel")]
pub async fn cancel(
    state: web::Data<AppState>,
    query: web::Query<HashMap<String, String>>,
    form: web::Form<HashMap<String, String>>,
) -> HttpResponse {
    handle_callback(&state, "cancel", query.into_inner(), form.into_inner())
}

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    // A store probe is the only dependency worth checking; the acquirer is
    // reached by the shopper's browser, not by us.
    match state.store.find_by_reference("") {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "azul-pages-server",
            "environment": state.acquirer.environment.to_string(),
        })),
        Err(e) => {
            tracing::error!(error = %e, "health check: store unreachable");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "degraded",
                "service": "azul-pages-server",
            }))
        }
    }
}

#[get("/metrics")]
pub async fn metrics_endpoint(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    match &state.metrics_token {
        Some(token) => {
            let authorized = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| security::constant_time_eq(t.as_bytes(), token))
                .unwrap_or(false);

            if !authorized {
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "unauthorized",
                    "message": "Valid Bearer token required for /metrics"
                }));
            }
        }
        None => {
            // No token configured — metrics stay protected by default.
            let public_metrics = std::env::var("AZUL_PUBLIC_METRICS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false);
            if !public_metrics {
                return HttpResponse::Forbidden().json(serde_json::json!({
                    "error": "forbidden",
                    "message": "Set METRICS_TOKEN or AZUL_PUBLIC_METRICS=true to access /metrics"
                }));
            }
        }
    }
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}
