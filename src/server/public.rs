use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};

use crate::access::{AccessContext, Capability, authorize};
use crate::resolve::{Shape, resolve_locale, resolve_project};
use crate::server::AppState;
use crate::server::dto::{PublicProject, PublicProjectResponse, TranslationsQuery};
use crate::server::response::{ApiError, StoreOptionExt};
use crate::types::Project;

/// Looks up the project and runs the access decision. A missing project and a
/// wrong key both end up as NotFound here; only a missing credential is told
/// apart (Unauthorized). The lookup has to come first so the public flag can
/// be consulted, which means an anonymous caller can tell a missing project
/// (404) from an existing private one (401); an accepted cost of supporting
/// public projects.
fn readable_project(
    state: &AppState,
    ctx: &AccessContext,
    name: &str,
) -> Result<Project, ApiError> {
    let project = state
        .store
        .get_project_by_name(name)
        .map_err(ApiError::from)?
        .or_not_found("Project not found")?;

    let api_key = state.store.get_api_key(&project.id).map_err(ApiError::from)?;

    authorize(ctx, &project, api_key.as_ref(), Capability::Read).map_err(ApiError::from)?;
    Ok(project)
}

fn public_payload(project: Project, translations: serde_json::Value) -> impl IntoResponse {
    // Translations are meant to be fetched straight from browsers.
    (
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(PublicProjectResponse {
            project: PublicProject {
                name: project.name,
                created_at: project.created_at,
                updated_at: project.updated_at,
                translations,
            },
        }),
    )
}

/// `GET /api/v1/projects/{project}`: all locales of a project, flat by
/// default or nested with `?mode=nested`.
pub async fn get_project_translations(
    ctx: AccessContext,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<TranslationsQuery>,
) -> impl IntoResponse {
    let shape = Shape::parse(query.mode.as_deref()).map_err(ApiError::from)?;
    let project = readable_project(&state, &ctx, &name)?;

    let translations =
        resolve_project(state.store.as_ref(), &project.id, shape).map_err(ApiError::from)?;

    Ok::<_, ApiError>(public_payload(project, translations))
}

/// `GET /api/v1/projects/{project}/{locale}`: one locale's translations.
pub async fn get_locale_translations(
    ctx: AccessContext,
    State(state): State<Arc<AppState>>,
    Path((name, locale)): Path<(String, String)>,
    Query(query): Query<TranslationsQuery>,
) -> impl IntoResponse {
    let shape = Shape::parse(query.mode.as_deref()).map_err(ApiError::from)?;
    let project = readable_project(&state, &ctx, &name)?;

    let translations = resolve_locale(state.store.as_ref(), &project.id, &locale, shape)
        .map_err(ApiError::from)?;

    Ok::<_, ApiError>(public_payload(project, translations))
}
