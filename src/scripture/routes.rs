use axum::{Router, routing::get};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bible/lookup", get(handler::lookup))
        .route("/bible/search", get(handler::search))
        .route("/topics", get(handler::list_topics))
        .route("/topics/:slug", get(handler::get_topic))
}
