use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::{Accounts, User, session::session_token};
use crate::error::ApiError;
use crate::handler::AppState;

/// The signed-in user. Rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The signed-in user, if there is one.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<User>, ApiError> {
    let Some(token) = session_token(&parts.headers, &state.session.cookie_name) else {
        return Ok(None);
    };

    let user = Accounts::new(state.db.connection())
        .user_for_session(&token)
        .await?;
    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve(parts, state).await?))
    }
}
