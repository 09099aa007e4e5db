//! Access log middleware.
//!
//! Logs one line per request once the handler has answered: method, path,
//! status and how long it took. Client errors are logged at `warn`, server
//! errors at `error`, everything else at `info`.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis();

    if response.status().is_server_error() {
        tracing::error!(%method, %path, status, elapsed_ms, "request failed");
    } else if response.status().is_client_error() {
        tracing::warn!(%method, %path, status, elapsed_ms, "request rejected");
    } else {
        tracing::info!(%method, %path, status, elapsed_ms, "request handled");
    }

    response
}
