use std::sync::Arc;

use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use azul_pages::store::SqliteTransactionStore;
use azul_pages_server::config::ServerConfig;
use azul_pages_server::routes;
use azul_pages_server::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    if let Err(e) = config.acquirer.validate() {
        tracing::error!(error = %e, "acquirer configuration incomplete, refusing to start");
        std::process::exit(1);
    }

    // Pending checkouts must survive a restart: a shopper is at the
    // acquirer's page mid-redirect while we redeploy, and the callback has
    // to find its transaction. No in-memory fallback.
    let store = match SqliteTransactionStore::open(&config.db_path) {
        Ok(store) => {
            tracing::info!("transaction store: SQLite at {}", config.db_path);
            Arc::new(store)
        }
        Err(e) => {
            tracing::error!("failed to open transaction store at {}: {e}", config.db_path);
            std::process::exit(1);
        }
    };

    let port = config.port;
    let rate_limit_rpm = config.rate_limit_rpm;
    let state = web::Data::new(AppState {
        acquirer: config.acquirer,
        base_url: config.base_url,
        store,
        metrics_token: config.metrics_token,
    });

    tracing::info!("Azul Payment Page server listening on port {port}");
    tracing::info!(
        merchant_id = %state.acquirer.merchant_id,
        environment = %state.acquirer.environment,
        protocol = %state.acquirer.protocol,
        "acquirer configuration loaded"
    );
    tracing::info!("  POST http://localhost:{port}/payment/azul/checkout");
    tracing::info!("  POST http://localhost:{port}/payment/azul/approved");
    tracing::info!("  POST http://localhost:{port}/payment/azul/declined");
    tracing::info!("  POST http://localhost:{port}/payment/azul/cancel");

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm)
        .finish()
        .expect("failed to build rate limiter config");

    HttpServer::new(move || {
        App::new()
            .wrap(Governor::new(&governor_conf))
            .app_data(state.clone())
            .service(routes::checkout)
            .service(routes::approved)
            .service(routes::declined)
            .service(routes::cancel)
            .service(routes::health)
            .service(routes::metrics_endpoint)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
