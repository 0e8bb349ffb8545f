use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireUser;
use crate::server::dto::CreateLocaleRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::server::validation::validate_locale_name;
use crate::server::{AppState, require_owner};
use crate::types::{Locale, Project};

fn owned_project(state: &AppState, auth: &RequireUser, name: &str) -> Result<Project, ApiError> {
    let project = state
        .store
        .get_project_by_name(name)
        .map_err(ApiError::from)?
        .or_not_found("Project not found")?;

    require_owner(&auth.user, &project)?;
    Ok(project)
}

pub async fn list_locales(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let project = owned_project(&state, &auth, &name)?;

    let locales = state.store.list_locales(&project.id).map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(locales)))
}

pub async fn create_locale(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<CreateLocaleRequest>,
) -> impl IntoResponse {
    let project = owned_project(&state, &auth, &name)?;

    validate_locale_name(&req.name)?;

    if state
        .store
        .get_locale_by_name(&project.id, &req.name)
        .map_err(ApiError::from)?
        .is_some()
    {
        return Err(ApiError::conflict("a locale with this name already exists"));
    }

    let locale = Locale {
        id: Uuid::new_v4().to_string(),
        project_id: project.id.clone(),
        name: req.name,
        created_at: Utc::now(),
    };

    state.store.create_locale(&locale).map_err(ApiError::from)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(locale))))
}

/// Deleting a locale cascades to every translation in it.
pub async fn delete_locale(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((name, locale_name)): Path<(String, String)>,
) -> impl IntoResponse {
    let project = owned_project(&state, &auth, &name)?;

    let locale = state
        .store
        .get_locale_by_name(&project.id, &locale_name)
        .map_err(ApiError::from)?
        .or_not_found("Locale not found")?;

    state.store.delete_locale(&locale.id).map_err(ApiError::from)?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
