mod app;
mod auth;
mod config;
mod db;
mod error;
mod schema;
mod users;

use tracing::{error, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "accountd=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = db::AppState::init()?;

    // Connect-and-migrate runs off to the side so the health endpoint is
    // answerable while the store is still coming up.
    let bootstrap = state.clone();
    tokio::spawn(async move {
        let cfg = &bootstrap.config.db;
        if !db::ensure_ready(&bootstrap.db, cfg.connect_attempts, cfg.retry_delay).await {
            warn!(
                attempts = cfg.connect_attempts,
                "database unreachable; serving in degraded mode"
            );
            return;
        }
        match schema::ensure_schema(&bootstrap.db).await {
            Ok(()) => bootstrap.mark_store_ready(),
            Err(e) => error!(error = %e, "schema setup failed; data endpoints degraded"),
        }
    });

    let app = app::build_app(state);
    app::serve(app).await
}
