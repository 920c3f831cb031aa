use std::net::SocketAddr;

use bolster_server::{app, AppState, Config, Database};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    info!(
        bind_address = config.bind_address.as_str(),
        database = config.database_url.as_str(),
        "starting bolster"
    );

    let db = match Database::new(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("database error: {e}");
            std::process::exit(1);
        }
    };

    if let Ok(purged) = db.purge_expired_sessions().await {
        if purged > 0 {
            info!(purged, "purged expired sessions");
        }
    }

    let bind_address = config.bind_address.clone();
    let state = AppState::new(config, db);
    let app = app(state);

    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("failed to bind {bind_address}: {e}");
            std::process::exit(1);
        }
    };

    info!(bind_address = bind_address.as_str(), "listening");

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("shutdown signal received, terminating");
}
