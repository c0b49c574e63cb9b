use axum::{extract::State, response::Response};
use serde::{Deserialize, Serialize};

use super::{Bookmark, BookmarkInput, Journal, Note, NoteInput};
use crate::accounts::CurrentUser;
use crate::api::{JsonBody, PathParam, QueryParams, created, non_empty, ok, success};
use crate::error::ApiError;
use crate::handler::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub study_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub study_id: Option<String>,
    pub day: Option<i64>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct NotePayload {
    pub content: Option<String>,
    pub study_id: Option<String>,
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookmarkPayload {
    pub reference: Option<String>,
    pub study_id: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DaysResponse {
    pub days: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub notes: Vec<Note>,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub note: Note,
}

#[derive(Debug, Serialize)]
pub struct BookmarksResponse {
    pub bookmarks: Vec<Bookmark>,
}

#[derive(Debug, Serialize)]
pub struct BookmarkResponse {
    pub bookmark: Bookmark,
}

impl NotePayload {
    fn into_input(self) -> Result<NoteInput, ApiError> {
        let content = non_empty(self.content).ok_or_else(|| ApiError::validation("Note content is required"))?;
        Ok(NoteInput {
            study_id: self.study_id,
            reference: self.reference,
            content,
        })
    }
}

// ============================================================================
// Progress
// ============================================================================

pub async fn get_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    QueryParams(query): QueryParams<ProgressQuery>,
) -> Result<Response, ApiError> {
    let study_id = non_empty(query.study_id).ok_or_else(|| ApiError::validation("study_id is required"))?;

    let days = Journal::new(state.db.connection(), user.id)
        .completed_days(&study_id)
        .await?;
    Ok(ok(DaysResponse { days }))
}

pub async fn update_progress(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<ProgressUpdate>,
) -> Result<Response, ApiError> {
    let (Some(study_id), Some(day)) = (non_empty(payload.study_id), payload.day.filter(|d| *d > 0)) else {
        return Err(ApiError::validation("study_id and day are required"));
    };

    let days = Journal::new(state.db.connection(), user.id)
        .set_day_completed(&study_id, day, payload.completed)
        .await?;

    tracing::debug!(user_id = user.id, study_id = %study_id, day, completed = payload.completed, "progress updated");
    Ok(ok(DaysResponse { days }))
}

// ============================================================================
// Notes
// ============================================================================

pub async fn list_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, ApiError> {
    let notes = Journal::new(state.db.connection(), user.id).list_notes().await?;
    Ok(ok(NotesResponse { notes }))
}

pub async fn create_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<NotePayload>,
) -> Result<Response, ApiError> {
    let input = payload.into_input()?;
    let note = Journal::new(state.db.connection(), user.id)
        .create_note(input)
        .await?;
    Ok(created(NoteResponse { note }))
}

pub async fn update_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<NotePayload>,
) -> Result<Response, ApiError> {
    let input = payload.into_input()?;
    match Journal::new(state.db.connection(), user.id)
        .update_note(id, input)
        .await?
    {
        Some(note) => Ok(ok(NoteResponse { note })),
        None => Err(ApiError::not_found("Note not found")),
    }
}

pub async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<Response, ApiError> {
    Journal::new(state.db.connection(), user.id).delete_note(id).await?;
    Ok(success())
}

// ============================================================================
// Bookmarks
// ============================================================================

pub async fn list_bookmarks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, ApiError> {
    let bookmarks = Journal::new(state.db.connection(), user.id)
        .list_bookmarks()
        .await?;
    Ok(ok(BookmarksResponse { bookmarks }))
}

pub async fn create_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<BookmarkPayload>,
) -> Result<Response, ApiError> {
    let reference = non_empty(payload.reference).ok_or_else(|| ApiError::validation("Reference is required"))?;

    let bookmark = Journal::new(state.db.connection(), user.id)
        .create_bookmark(BookmarkInput {
            study_id: payload.study_id,
            reference,
            note: payload.note,
        })
        .await?;
    Ok(created(BookmarkResponse { bookmark }))
}

pub async fn delete_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathParam(id): PathParam<i64>,
) -> Result<Response, ApiError> {
    Journal::new(state.db.connection(), user.id)
        .delete_bookmark(id)
        .await?;
    Ok(success())
}
