use axum::{Router, routing::get};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/studies", get(handler::list_studies))
        .route("/studies/:id", get(handler::get_study))
}
