use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::{
    Accounts, MaybeUser, User, hash_password,
    session::{clear_cookie, session_cookie, session_token},
    verify_password, verify_unknown_account,
};
use crate::api::{JsonBody, SuccessResponse};
use crate::error::ApiError;
use crate::handler::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: Option<User>,
}

fn signed_in(state: &AppState, user: User, token: &str) -> Response {
    (
        [(header::SET_COOKIE, session_cookie(&state.session, token))],
        Json(UserResponse { user: Some(user) }),
    )
        .into_response()
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<Response, ApiError> {
    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_string();
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Name, email, and password are required"));
    }

    if Accounts::new(state.db.connection()).email_exists(&email).await? {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(anyhow::Error::from)??;

    let tx = state.db.begin().await?;
    let accounts = Accounts::new(tx.connection());
    let result = async {
        let user = accounts.create_user(&name, &email, &password_hash).await?;
        let token = accounts.create_session(user.id, state.session.ttl_hours).await?;
        Ok::<_, anyhow::Error>((user, token))
    }
    .await;

    let (user, token) = tx.finish(result).await.map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            ApiError::Conflict("Email already registered".to_string())
        } else {
            ApiError::Internal(e)
        }
    })?;

    tracing::info!(user_id = user.id, "registered user");
    Ok(signed_in(&state, user, &token))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = payload.email.trim();
    let accounts = Accounts::new(state.db.connection());

    let password = payload.password;
    let Some((user_id, stored_hash)) = accounts.credentials_for(email).await? else {
        tokio::task::spawn_blocking(move || verify_unknown_account(&password))
            .await
            .map_err(anyhow::Error::from)?;
        return Err(ApiError::InvalidCredentials);
    };

    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(anyhow::Error::from)?;
    if !valid {
        tracing::info!(user_id, "rejected login");
        return Err(ApiError::InvalidCredentials);
    }

    let Some(user) = accounts.get_user(user_id).await? else {
        return Err(ApiError::InvalidCredentials);
    };
    let token = accounts.create_session(user.id, state.session.ttl_hours).await?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok(signed_in(&state, user, &token))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers, &state.session.cookie_name) {
        Accounts::new(state.db.connection()).delete_session(&token).await?;
    }

    Ok((
        [(header::SET_COOKIE, clear_cookie(&state.session))],
        Json(SuccessResponse { success: true }),
    )
        .into_response())
}

pub async fn me(MaybeUser(user): MaybeUser) -> Json<UserResponse> {
    Json(UserResponse { user })
}
