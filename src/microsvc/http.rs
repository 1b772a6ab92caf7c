//! HTTP transport for microsvc - maps HTTP requests to action dispatch.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `POST /:command` - dispatch an action. Body = JSON input, request headers → Session.
//! - `GET /health` - `{ "ok", "service", "connected", "commands" }`.
//!
//! ## Example
//!
//! ```ignore
//! let mut service = microsvc::Service::new("markets", adapter);
//! service.start().await?;
//! let service = Arc::new(service);
//!
//! // Get the router to compose with other axum routes
//! let app = microsvc::router(service.clone());
//!
//! // Or serve directly
//! microsvc::serve(service, "0.0.0.0:3000").await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::service::{error_body, Service};
use super::session::Session;
use crate::driver::DocumentClient;

/// Build an axum `Router` that dispatches actions via the given service.
pub fn router<C: DocumentClient + 'static>(service: Arc<Service<C>>) -> Router {
    Router::new()
        .route("/health", get(health_handler::<C>))
        .route("/:command", post(command_handler::<C>))
        .with_state(service)
}

/// Serve the service over HTTP at the given address (e.g. `"0.0.0.0:3000"`).
pub async fn serve<C: DocumentClient + 'static>(
    service: Arc<Service<C>>,
    addr: &str,
) -> Result<(), std::io::Error> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health_handler<C: DocumentClient + 'static>(
    State(service): State<Arc<Service<C>>>,
) -> impl IntoResponse {
    let connected = service.adapter().is_connected();
    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = json!({
        "ok": connected,
        "service": service.name(),
        "connected": connected,
        "commands": service.commands(),
    });
    (status, Json(body))
}

async fn command_handler<C: DocumentClient + 'static>(
    State(service): State<Arc<Service<C>>>,
    Path(command): Path<String>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> impl IntoResponse {
    let session = session_from_headers(&headers);
    match service.dispatch(&command, input, session).await {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(error_body(&e))).into_response()
        }
    }
}

/// Every header with a UTF-8 value becomes a session variable.
fn session_from_headers(headers: &HeaderMap) -> Session {
    let mut vars = HashMap::new();
    for (name, value) in headers.iter() {
        if let Ok(v) = value.to_str() {
            vars.insert(name.as_str().to_string(), v.to_string());
        }
    }
    Session::from_map(vars)
}
