//! Bolster storefront server.
//!
//! Wires configuration, persistence, sessions, and route handlers into
//! an axum application.

pub mod config;
pub mod db;
pub mod error;
pub mod mail;
pub mod rate_limit;
pub mod routes;
pub mod session;
pub mod state;
pub mod templates;
pub mod uploads;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{Html, IntoResponse};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use db::Database;
pub use error::AppError;
pub use state::AppState;

/// Assemble the application with its middleware stack.
pub fn app(state: AppState) -> Router {
    let upload_dir = state.config.upload_dir.clone();

    routes::router()
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Html(
            r#"<!doctype html>
<html><head><title>Not Found - Bolster</title></head>
<body><h1>404</h1><p>We couldn't find that page.</p><p><a href="/">Back to the store</a></p></body></html>"#,
        ),
    )
}
