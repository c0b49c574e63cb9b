use axum::{extract::State, response::Response};
use serde::{Deserialize, Serialize};

use super::{
    ContextVerse, Passage, Scripture, SearchFilters, SearchHit, Topic, TopicRef, Verse,
    is_match_syntax_error,
};
use crate::api::{PathParam, QueryParams, non_empty, ok};
use crate::error::ApiError;
use crate::handler::AppState;
use crate::reference::parse_reference;

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub reference: Option<String>,
    pub book: Option<String>,
    pub chapter: Option<i64>,
    pub verse: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub testament: Option<String>,
    pub book: Option<String>,
    pub topic: Option<String>,
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopicsQuery {
    pub filter: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub verse: Verse,
    pub context: Vec<ContextVerse>,
    pub topics: Vec<TopicRef>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub topics: Vec<Topic>,
}

#[derive(Debug, Serialize)]
pub struct TopicDetailResponse {
    pub topic: Topic,
    pub passages: Vec<Passage>,
}

impl LookupQuery {
    /// Resolves either the `reference` string or the explicit
    /// `book`/`chapter`/`verse` triple. `reference` wins when both are given.
    fn locator(self) -> Result<(String, i64, i64), ApiError> {
        if let Some(reference) = non_empty(self.reference) {
            let parsed = parse_reference(&reference);
            let Some((parsed, verse)) = parsed.and_then(|p| p.verse.map(|v| (p, v))) else {
                return Err(ApiError::validation(
                    "reference must include book, chapter, and verse",
                ));
            };
            return Ok((parsed.book, i64::from(parsed.chapter), i64::from(verse)));
        }

        match (
            non_empty(self.book),
            self.chapter.filter(|c| *c > 0),
            self.verse.filter(|v| *v > 0),
        ) {
            (Some(book), Some(chapter), Some(verse)) => Ok((book, chapter, verse)),
            _ => Err(ApiError::validation(
                "reference, or book + chapter + verse are required",
            )),
        }
    }
}

pub async fn lookup(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<LookupQuery>,
) -> Result<Response, ApiError> {
    let (book, chapter, verse) = query.locator()?;
    let scripture = Scripture::new(state.db.connection());

    let Some(found) = scripture.find_verse(&book, chapter, verse).await? else {
        return Err(ApiError::not_found("Verse not found"));
    };

    let context = scripture.context(&book, chapter, verse).await?;
    let topics = scripture.topics_for_verse(found.id).await?;

    Ok(ok(LookupResponse {
        verse: found,
        context,
        topics,
    }))
}

pub async fn search(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SearchQuery>,
) -> Result<Response, ApiError> {
    let text = non_empty(query.q).ok_or_else(|| ApiError::validation("q is required"))?;
    let filters = SearchFilters {
        testament: non_empty(query.testament),
        book: non_empty(query.book),
        topic: non_empty(query.topic),
        focus: non_empty(query.filter),
    };

    let results = Scripture::new(state.db.connection())
        .search(&text, &filters)
        .await
        .map_err(|e| {
            if is_match_syntax_error(&e) {
                tracing::debug!(query = %text, error = %e, "rejected search query");
                ApiError::validation("invalid search query")
            } else {
                ApiError::Internal(e)
            }
        })?;

    Ok(ok(SearchResponse { results }))
}

pub async fn list_topics(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TopicsQuery>,
) -> Result<Response, ApiError> {
    let filter = non_empty(query.filter);
    let search = non_empty(query.q);

    let topics = Scripture::new(state.db.connection())
        .list_topics(filter.as_deref(), search.as_deref())
        .await?;
    Ok(ok(TopicsResponse { topics }))
}

pub async fn get_topic(
    State(state): State<AppState>,
    PathParam(slug): PathParam<String>,
) -> Result<Response, ApiError> {
    let scripture = Scripture::new(state.db.connection());

    let Some(topic) = scripture.find_topic(&slug).await? else {
        return Err(ApiError::not_found("Topic not found"));
    };
    let passages = scripture.passages(topic.id).await?;

    Ok(ok(TopicDetailResponse { topic, passages }))
}
