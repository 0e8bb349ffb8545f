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
use crate::server::dto::{
    CreateLabelRequest, LabelDetailResponse, LabelTranslation, UpdateLabelRequest,
    UpsertTranslationsRequest, UpsertTranslationsResponse,
};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::server::validation::{
    keys_prefix_related, validate_label_description, validate_label_key,
};
use crate::server::{AppState, require_owner};
use crate::store::TranslationUpdate;
use crate::types::{Label, Project};

/// Rejects a key that would collide with an existing key in the nested
/// shape: equal keys, or one being a dot-boundary prefix of the other.
fn check_key_available(
    state: &AppState,
    project_id: &str,
    key: &str,
    exclude_label_id: Option<&str>,
) -> Result<(), ApiError> {
    let labels = state.store.list_labels(project_id).map_err(ApiError::from)?;

    for existing in &labels {
        if exclude_label_id == Some(existing.id.as_str()) {
            continue;
        }
        if existing.key == key {
            return Err(ApiError::conflict("a label with this key already exists"));
        }
        if keys_prefix_related(&existing.key, key) {
            return Err(ApiError::conflict(format!(
                "label key '{key}' conflicts with existing key '{}'",
                existing.key
            )));
        }
    }

    Ok(())
}

fn owned_label(state: &AppState, auth: &RequireUser, id: &str) -> Result<(Label, Project), ApiError> {
    let label = state
        .store
        .get_label(id)
        .map_err(ApiError::from)?
        .or_not_found("Label not found")?;

    let project = state
        .store
        .get_project(&label.project_id)
        .map_err(ApiError::from)?
        .or_not_found("Label not found")?;

    require_owner(&auth.user, &project)?;
    Ok((label, project))
}

pub async fn create_label(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<CreateLabelRequest>,
) -> impl IntoResponse {
    let project = state
        .store
        .get_project_by_name(&name)
        .map_err(ApiError::from)?
        .or_not_found("Project not found")?;
    require_owner(&auth.user, &project)?;

    validate_label_key(&req.key)?;
    if let Some(ref description) = req.description {
        validate_label_description(description)?;
    }

    check_key_available(&state, &project.id, &req.key, None)?;

    let now = Utc::now();
    let label = Label {
        id: Uuid::new_v4().to_string(),
        project_id: project.id.clone(),
        key: req.key,
        description: req.description,
        created_at: now,
        updated_at: now,
    };

    // A race past the pre-check still surfaces as Conflict via the index.
    state.store.create_label(&label).map_err(ApiError::from)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(label))))
}

/// Label detail with one value row per project locale; locales without a
/// translation yet show an empty value.
pub async fn get_label(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (label, project) = owned_label(&state, &auth, &id)?;

    let locales = state.store.list_locales(&project.id).map_err(ApiError::from)?;
    let existing = state
        .store
        .list_label_translations(&label.id)
        .map_err(ApiError::from)?;

    let translations = locales
        .into_iter()
        .map(|locale| {
            let value = existing
                .iter()
                .find(|t| t.locale_id == locale.id)
                .map(|t| t.value.clone())
                .unwrap_or_default();
            LabelTranslation {
                locale_id: locale.id,
                locale_name: locale.name,
                value,
            }
        })
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(LabelDetailResponse {
        label,
        translations,
    })))
}

pub async fn update_label(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLabelRequest>,
) -> impl IntoResponse {
    let (mut label, project) = owned_label(&state, &auth, &id)?;

    if let Some(key) = req.key {
        validate_label_key(&key)?;
        if key != label.key {
            check_key_available(&state, &project.id, &key, Some(&label.id))?;
            label.key = key;
        }
    }
    if let Some(description) = req.description {
        validate_label_description(&description)?;
        label.description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
    }

    state.store.update_label(&label).map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(label)))
}

pub async fn delete_label(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (label, _project) = owned_label(&state, &auth, &id)?;

    state.store.delete_label(&label.id).map_err(ApiError::from)?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

/// Applies the submitted per-locale values for one label as a single
/// all-or-nothing batch.
pub async fn upsert_translations(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpsertTranslationsRequest>,
) -> impl IntoResponse {
    let (label, _project) = owned_label(&state, &auth, &id)?;

    let updates: Vec<TranslationUpdate> = req
        .translations
        .into_iter()
        .map(|t| TranslationUpdate {
            locale_id: t.locale_id,
            value: t.value,
        })
        .collect();

    let applied = state
        .store
        .upsert_translations(&label, &updates)
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(UpsertTranslationsResponse {
        applied,
    })))
}
