use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{RequireUser, hash_password, mint_session_token, verify_password};
use crate::server::AppState;
use crate::server::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::{validate_email, validate_password};
use crate::types::{Session, User};

fn mint_session(state: &AppState, user_id: &str) -> Result<String, ApiError> {
    let token =
        mint_session_token().map_err(|_| ApiError::internal("Failed to create session"))?;

    let session = Session {
        id: Uuid::new_v4().to_string(),
        token_hash: token.hash,
        token_lookup: token.lookup,
        user_id: user_id.to_string(),
        created_at: Utc::now(),
        expires_at: Some(token.expires_at),
        last_used_at: None,
    };
    state.store.create_session(&session).map_err(ApiError::from)?;

    Ok(token.raw)
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    validate_email(&req.email)?;
    validate_password(&req.password)?;

    let password_hash =
        hash_password(&req.password).map_err(|_| ApiError::internal("Failed to hash password"))?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: req.email,
        password_hash,
        created_at: now,
        updated_at: now,
    };

    // The unique index on email is the authority; a duplicate surfaces as
    // Conflict even if two registrations race.
    state.store.create_user(&user).map_err(ApiError::from)?;

    let token = mint_session(&state, &user.id)?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthResponse { token, user })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    // Uniform failure for unknown email and wrong password.
    let invalid = || ApiError::unauthorized("invalid email or password");

    let user = state
        .store
        .get_user_by_email(&req.email)
        .map_err(ApiError::from)?
        .ok_or_else(invalid)?;

    let matches = verify_password(&req.password, &user.password_hash)
        .map_err(|_| ApiError::internal("Failed to verify password"))?;
    if !matches {
        return Err(invalid());
    }

    let token = mint_session(&state, &user.id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(AuthResponse { token, user })))
}

pub async fn logout(auth: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state
        .store
        .delete_session(&auth.session.id)
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
