use axum::response::Response;
use serde::Serialize;

use crate::api::{PathParam, ok};
use crate::content::{StudyPlan, find_study, load_studies};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct StudiesResponse {
    pub studies: Vec<StudyPlan>,
}

#[derive(Debug, Serialize)]
pub struct StudyResponse {
    pub study: StudyPlan,
}

pub async fn list_studies() -> Response {
    ok(StudiesResponse {
        studies: load_studies(),
    })
}

pub async fn get_study(PathParam(id): PathParam<String>) -> Result<Response, ApiError> {
    let study = find_study(&id).ok_or_else(|| ApiError::not_found("Study not found"))?;
    Ok(ok(StudyResponse { study }))
}
