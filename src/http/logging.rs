use axum::http::{header::CONTENT_LENGTH, Request};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, MakeSpan, TraceLayer},
    LatencyUnit,
};
use tracing::{field::Empty, span, Level, Span};
use uuid::Uuid;

/// Builds the span a delivery is handled in. Only the path is recorded since
/// providers may put tokens in the query string.
#[derive(Clone, Copy)]
pub struct DeliverySpan;

impl<B> MakeSpan<B> for DeliverySpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let span = span!(
            Level::INFO,
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            version = ?request.version(),
            length = Empty,
            id = %Uuid::new_v4(),
        );

        if let Some(length) = request
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
        {
            span.record("length", &length);
        }

        span
    }
}

/// Create a logging middleware layer
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, DeliverySpan> {
    TraceLayer::new_for_http()
        .make_span_with(DeliverySpan)
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
        .on_failure(DefaultOnFailure::new().level(Level::ERROR))
}
