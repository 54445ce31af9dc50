use crate::config::{BuildInfo, SharedConfig};
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use tracing::debug;

mod handlers;
mod validators;

/// Build the routes for the webhook receiver
pub fn routes(path: &str) -> Router {
    Router::new()
        .route(path, post(handlers::eas))
        .route("/health", get(health))
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    #[serde(flatten)]
    build: BuildInfo,
}

async fn health(Extension(cfg): Extension<SharedConfig>) -> Json<Health> {
    debug!("alive and healthy!");
    Json(Health {
        status: "ok",
        build: cfg.build.clone(),
    })
}
