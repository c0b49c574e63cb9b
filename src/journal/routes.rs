use axum::{
    Router,
    routing::{delete, get},
};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/progress", get(handler::get_progress).post(handler::update_progress))
        .route("/notes", get(handler::list_notes).post(handler::create_note))
        .route(
            "/notes/:id",
            delete(handler::delete_note)
                .put(handler::update_note)
                .patch(handler::update_note),
        )
        .route("/bookmarks", get(handler::list_bookmarks).post(handler::create_bookmark))
        .route("/bookmarks/:id", delete(handler::delete_bookmark))
}
