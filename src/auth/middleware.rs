use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use super::{token_lookup, verify_session_token};
use crate::access::AccessContext;
use crate::server::AppState;
use crate::types::{Session, User};

/// Extractor that requires an authenticated owner session.
pub struct RequireUser {
    pub session: Session,
    pub user: User,
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    SessionExpired,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid session token"),
            AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "Session expired"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                "Bearer realm=\"localizard\"".parse().unwrap(),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw_token = bearer_token(parts)?.ok_or(AuthError::MissingAuth)?;
        let (session, user) = validate_session(state, &raw_token)?;
        Ok(RequireUser { session, user })
    }
}

/// Builds the access context for public read endpoints: an owner session if a
/// valid Bearer token is presented, otherwise an API key from `X-Api-Key`,
/// otherwise anonymous. A malformed or expired session token is rejected
/// rather than downgraded.
impl FromRequestParts<Arc<AppState>> for AccessContext {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(raw_token) = bearer_token(parts)? {
            let (_, user) = validate_session(state, &raw_token)?;
            return Ok(AccessContext::Owner(user.id));
        }

        let api_key = parts
            .headers
            .get("X-Api-Key")
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);

        Ok(match api_key {
            Some(key) => AccessContext::ApiKey(key),
            None => AccessContext::Anonymous,
        })
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth_header {
        None => Ok(None),
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) => Ok(Some(token.to_string())),
            None => Err(AuthError::InvalidScheme),
        },
    }
}

fn validate_session(
    state: &Arc<AppState>,
    raw_token: &str,
) -> Result<(Session, User), AuthError> {
    let lookup = token_lookup(raw_token).map_err(|_| AuthError::InvalidToken)?;

    let session = state
        .store
        .get_session_by_lookup(&lookup)
        .map_err(|_| AuthError::InternalError)?
        .ok_or(AuthError::InvalidToken)?;

    if !verify_session_token(raw_token, &session.token_hash)
        .map_err(|_| AuthError::InternalError)?
    {
        return Err(AuthError::InvalidToken);
    }

    if let Some(expires_at) = &session.expires_at {
        if expires_at < &Utc::now() {
            return Err(AuthError::SessionExpired);
        }
    }

    let user = state
        .store
        .get_user(&session.user_id)
        .map_err(|_| AuthError::InternalError)?
        .ok_or(AuthError::InvalidToken)?;

    if let Err(e) = state.store.update_session_last_used(&session.id) {
        tracing::warn!("Failed to update session last_used_at: {e}");
    }

    Ok((session, user))
}
