use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::Registry;
use crate::error::{AppResult, DomainError, InfraError};
use crate::hardening::MAX_BODY_BYTES;
use crate::services::ServiceError;

/// Dev persistence API: read and write room documents.
pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/api/rooms/{room_id}", get(get_room).post(post_room))
        .fallback(not_found)
        .with_state(registry)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

/// Run the HTTP server until it fails
pub async fn serve(addr: std::net::SocketAddr, registry: Arc<Registry>) -> AppResult<()> {
    let app = router(registry);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| InfraError::Net(format!("bind {}: {}", addr, e)))?;
    info!(%addr, "dev persistence listening");
    axum::serve(listener, app).await.map_err(InfraError::from)?;
    Ok(())
}

fn respond(status: StatusCode, body: Value) -> Response {
    (status, [(header::CACHE_CONTROL, "no-store")], Json(body)).into_response()
}

async fn not_found() -> Response {
    respond(StatusCode::NOT_FOUND, json!({ "error": "Not found" }))
}

async fn get_room(State(registry): State<Arc<Registry>>, Path(room_id): Path<String>) -> Response {
    match registry.services.room.get_document(&room_id).await {
        Ok(room) => respond(StatusCode::OK, json!({ "room": room })),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn post_room(State(registry): State<Arc<Registry>>, Path(room_id): Path<String>, body: Bytes) -> Response {
    let room = match parse_body(&body) {
        Ok(room) => room,
        Err(e) => return ApiError(e).into_response(),
    };
    match registry.services.room.save_document(&room_id, &room).await {
        Ok(path) => respond(StatusCode::OK, json!({ "ok": true, "file": path.display().to_string() })),
        Err(e) => ApiError(e).into_response(),
    }
}

/// `{ room: object }`; an empty body reads as `{}`.
fn parse_body(body: &[u8]) -> Result<Value, ServiceError> {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    let parsed: Value = if text.is_empty() {
        json!({})
    } else {
        serde_json::from_str(text).map_err(|e| ServiceError::InvalidInput(e.to_string()))?
    };
    match parsed.get("room") {
        Some(room) if room.is_object() => Ok(room.clone()),
        _ => Err(ServiceError::InvalidInput("Expected body: { room: object }".into())),
    }
}

struct ApiError(ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = match &err {
            ServiceError::NotFound { .. } | ServiceError::Domain(DomainError::InvalidRoomId(_)) => {
                return respond(StatusCode::NOT_FOUND, json!({ "error": "Not found" }));
            }
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %err, "room persistence failed");
        } else {
            warn!(error = %err, "rejected room request");
        }
        let message = match &err {
            ServiceError::InvalidInput(msg) => msg.clone(),
            e => e.to_string(),
        };
        respond(status, json!({ "error": message }))
    }
}
