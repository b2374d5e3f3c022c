//! HTTP surface of the relay.

use crate::models::{ErrorResponse, UploadRequest, UploadResponse, UNAVAILABLE_MESSAGE};
use crate::predictor::Predictor;
use crate::Error;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidInput(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
            }
            other => {
                error!("Error: {}", other);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ErrorResponse::new(UNAVAILABLE_MESSAGE)),
                )
                    .into_response()
            }
        }
    }
}

pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn upload(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(body)) => UploadRequest::from_json(body),
        // A body that is not declared as JSON carries no image.
        Err(JsonRejection::MissingJsonContentType(_)) => UploadRequest::default(),
        Err(rejection) => {
            warn!("Rejected upload body: {}", rejection.body_text());
            return (
                rejection.status(),
                Json(ErrorResponse::new(rejection.body_text())),
            )
                .into_response();
        }
    };

    let image = match request.into_payload() {
        Ok(image) => image,
        Err(e) => return e.into_response(),
    };

    match state.predictor.fetch_prediction(&image).await {
        Ok(words) => {
            info!("Predicted {} words", words.len());
            Json(UploadResponse { words }).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Bind `addr` and serve the relay until the process is stopped.
pub async fn serve(addr: &str, state: AppState, body_limit: usize) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    info!("Server running on http://localhost:{}", local.port());

    axum::serve(listener, router(state, body_limit)).await?;
    Ok(())
}
