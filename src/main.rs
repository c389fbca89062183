use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use gazeta::config::{Cli, Config};
use gazeta::state::AppState;
use gazeta::{db, routes, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(config.db_path())?;
    db::run_migrations(&pool)?;

    // Build app state
    let state = AppState {
        db: pool,
        config: config.clone(),
    };

    // Build router
    let mut app = routes::router();

    // Test-only seed endpoint: fills the database with demo content
    if std::env::var("GAZETA_TEST_SEED").is_ok() {
        app = app.route("/test/seed", get(test_seed));
    }

    let app = app.layer(TraceLayer::new_for_http()).with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Test-only: populate the demo dataset and report table counts.
/// Only mounted when GAZETA_TEST_SEED env var is set.
async fn test_seed(State(state): State<AppState>) -> impl IntoResponse {
    match seed::demo(&state.db) {
        Ok(summary) => axum::Json(serde_json::json!({
            "users": summary.users,
            "posts": summary.posts,
            "tags": summary.tags,
            "comments": summary.comments,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Seeding failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Seed failed").into_response()
        }
    }
}
