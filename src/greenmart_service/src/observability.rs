use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use rand::Rng;
use tracing::Span;
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs color-eyre and the tracing subscriber stack. Call once at
/// startup.
pub fn init_tracing() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(ErrorLayer::default())
        .init();

    Ok(())
}

/// Span for one HTTP request, tagged with a random request id.
pub fn make_span_with_request_id(request: &Request<Body>) -> Span {
    let request_id = format!("{:016x}", rand::rng().random::<u64>());
    tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
    )
}

pub fn on_request(_request: &Request<Body>, _span: &Span) {
    tracing::info!("started processing request");
}

pub fn on_response<B>(response: &Response<B>, latency: Duration, _span: &Span) {
    tracing::info!(
        status = %response.status(),
        latency_ms = latency.as_millis(),
        "finished processing request"
    );
}
