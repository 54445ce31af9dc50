use crate::{config::SharedConfig, notifier::Notifier};
use axum::{extract::DefaultBodyLimit, Extension, Router};
use std::sync::Arc;

mod error;
mod logging;
mod webhooks;

pub(crate) use error::{Error, Result};

/// Build all the routes for the service
pub fn routes(config: SharedConfig, notifier: Arc<Notifier>) -> Router {
    Router::new()
        .merge(webhooks::routes(&config.server.path))
        .layer(DefaultBodyLimit::max(config.server.max_body))
        .layer(Extension(notifier))
        .layer(Extension(config))
        .layer(logging::layer())
}
