use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use serde_json::json;
use std::net::SocketAddr;

async fn healthcheck() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}

/// Serve the submitter's healthcheck on the given socket address.
pub fn serve_healthcheck(socket: impl Into<SocketAddr>) -> tokio::task::JoinHandle<()> {
    let router = Router::new().route("/healthcheck", get(healthcheck)).fallback(not_found);

    let addr = socket.into();
    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => {
                if let Err(err) = axum::serve(listener, router).await {
                    tracing::error!(%err, "healthcheck serve failed");
                }
            }
            Err(err) => {
                tracing::error!(%err, "failed to bind healthcheck address");
            }
        };
    })
}
