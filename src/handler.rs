use std::sync::Arc;

use axum::{
    Json, Router,
    http::{Method, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

use tracing::info;

use crate::accounts::{self, MaybeUser};
use crate::api::{JsonBody, SuccessResponse, created, non_empty};
use crate::assets::serve_embedded;
use crate::config::Session;
use crate::db::Database;
use crate::error::ApiError;
use crate::{journal, scripture, studies};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub session: Arc<Session>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ClientLog {
    pub message: Option<String>,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// Assembles the API under `/api` and the SPA bundle as the fallback.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    let api = Router::new()
        .route("/health", get(healthcheck))
        .route("/logs", post(client_log))
        .nest("/auth", accounts::routes())
        .merge(journal::routes())
        .merge(scripture::routes())
        .merge(studies::routes())
        .fallback(api_not_found);

    Router::new()
        .nest("/api", api)
        .fallback(serve_embedded)
        .layer(cors)
        .with_state(state)
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Sink for errors reported by the browser.
pub async fn client_log(
    MaybeUser(user): MaybeUser,
    JsonBody(payload): JsonBody<ClientLog>,
) -> Result<Response, ApiError> {
    let message = non_empty(payload.message).ok_or_else(|| ApiError::validation("message is required"))?;
    let details = match payload.details {
        serde_json::Value::Null => serde_json::json!({}),
        value @ serde_json::Value::Object(_) => value,
        value => serde_json::json!({ "value": value }),
    };

    tracing::warn!(
        target: "client",
        user_id = user.map(|u| u.id),
        details = %details,
        "{}",
        message
    );

    Ok(created(SuccessResponse { success: true }))
}

pub async fn api_not_found() -> ApiError {
    ApiError::not_found("Not found")
}
