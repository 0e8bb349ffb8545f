use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{RequireUser, generate_api_key};
use crate::server::dto::{
    ApiKeyResponse, CreateProjectRequest, ProjectLabelsResponse, UpdateProjectRequest,
};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::server::validation::validate_project_name;
use crate::server::{AppState, require_owner};
use crate::types::Project;

pub async fn list_projects(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let projects = state
        .store
        .list_user_projects(&auth.user.id)
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(projects)))
}

pub async fn create_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> impl IntoResponse {
    validate_project_name(&req.name)?;

    // Pre-check is a UX nicety; the unique index backstops the race.
    if state
        .store
        .get_project_by_name(&req.name)
        .map_err(ApiError::from)?
        .is_some()
    {
        return Err(ApiError::conflict("a project with this name already exists"));
    }

    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4().to_string(),
        user_id: auth.user.id.clone(),
        name: req.name,
        public: false,
        created_at: now,
        updated_at: now,
    };

    state.store.create_project(&project).map_err(ApiError::from)?;
    state
        .store
        .rotate_api_key(&project.id, &generate_api_key())
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(project))))
}

fn owned_project(
    state: &AppState,
    auth: &RequireUser,
    name: &str,
) -> Result<Project, ApiError> {
    let project = state
        .store
        .get_project_by_name(name)
        .map_err(ApiError::from)?
        .or_not_found("Project not found")?;

    require_owner(&auth.user, &project)?;
    Ok(project)
}

/// Dashboard view of a project: its locales plus labels ordered by key, each
/// with the locales already translated.
pub async fn get_project_labels(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let project = owned_project(&state, &auth, &name)?;

    let locales = state.store.list_locales(&project.id).map_err(ApiError::from)?;
    let labels = state
        .store
        .list_labels_with_status(&project.id)
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(ProjectLabelsResponse {
        locales,
        labels,
    })))
}

pub async fn update_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<UpdateProjectRequest>,
) -> impl IntoResponse {
    let mut project = owned_project(&state, &auth, &name)?;

    // The name is immutable; only visibility can change.
    if let Some(public) = req.public {
        state
            .store
            .set_project_public(&project.id, public)
            .map_err(ApiError::from)?;
        project.public = public;
        project.updated_at = Utc::now();
    }

    Ok::<_, ApiError>(Json(ApiResponse::success(project)))
}

pub async fn delete_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let project = owned_project(&state, &auth, &name)?;

    state.store.delete_project(&project.id).map_err(ApiError::from)?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn get_api_key(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let project = owned_project(&state, &auth, &name)?;

    let key = state
        .store
        .get_api_key(&project.id)
        .map_err(ApiError::from)?
        .or_not_found("API key not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(ApiKeyResponse::from(key))))
}

/// Replaces the project's API key with a fresh value. The old key stops
/// working immediately; there is no grace period.
pub async fn rotate_api_key(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let project = owned_project(&state, &auth, &name)?;

    let key = state
        .store
        .rotate_api_key(&project.id, &generate_api_key())
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(ApiKeyResponse::from(key))))
}
