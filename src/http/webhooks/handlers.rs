use super::validators;
use crate::{
    config::SharedConfig,
    event::BuildEvent,
    http::{Error, Result},
    notifier::Notifier,
};
use axum::{
    body::Bytes,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Extension, Json,
};
use sentry::{Hub, SentryFutureExt};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Handle webhooks from EAS build status changes
pub async fn eas(
    Extension(cfg): Extension<SharedConfig>,
    Extension(notifier): Extension<Arc<Notifier>>,
    headers: HeaderMap,
    raw_body: Bytes,
) -> Response {
    // Tags set while handling a delivery must not outlive it
    let hub = Arc::new(Hub::new_from_top(Hub::current()));

    async move {
        relay(&cfg, &notifier, &headers, &raw_body)
            .await
            .into_response()
    }
    .bind_hub(hub)
    .await
}

async fn relay(
    cfg: &SharedConfig,
    notifier: &Notifier,
    headers: &HeaderMap,
    raw_body: &[u8],
) -> Result<Json<Value>> {
    validators::eas(
        raw_body,
        headers.get(&cfg.webhook.header),
        cfg.webhook.secret.as_bytes(),
    )?;

    let body: Value = serde_json::from_slice(raw_body)?;
    let event = BuildEvent::from_value(&body).ok_or(Error::InvalidJson)?;
    info!(
        status = ?event.status,
        platform = ?event.platform,
        build = ?event.id,
        "got new build hook"
    );

    sentry::configure_scope(|scope| {
        if let Some(status) = &event.status {
            scope.set_tag("hook.status", status);
        }
        if let Some(platform) = &event.platform {
            scope.set_tag("hook.platform", platform);
        }
        if let Some(id) = &event.id {
            scope.set_tag("hook.build", id);
        }
    });

    notifier.notify(&event).await?;

    Ok(Json(json!({ "ok": true })))
}
