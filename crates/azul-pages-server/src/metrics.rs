use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};
use std::sync::LazyLock;

pub static CHECKOUT_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "azul_checkout_total",
        "Checkout initiations by result",
        &["result"]
    )
    .unwrap()
});

pub static CALLBACK_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "azul_callback_total",
        "Acquirer callbacks by endpoint and final transaction state",
        &["endpoint", "result"]
    )
    .unwrap()
});

pub static CALLBACK_REJECTIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "azul_callback_rejected_total",
        "Callbacks rejected before reaching the state machine",
        &["reason"]
    )
    .unwrap()
});

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
