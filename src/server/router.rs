use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::{auth, labels, locales, projects, public};
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/session", delete(auth::logout))
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{project}",
            get(public::get_project_translations)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/projects/{project}/labels",
            get(projects::get_project_labels).post(labels::create_label),
        )
        .route(
            "/projects/{project}/locales",
            get(locales::list_locales).post(locales::create_locale),
        )
        .route(
            "/projects/{project}/locales/{locale}",
            delete(locales::delete_locale),
        )
        .route(
            "/projects/{project}/api-key",
            get(projects::get_api_key).post(projects::rotate_api_key),
        )
        // Static siblings above win over the locale capture.
        .route(
            "/projects/{project}/{locale}",
            get(public::get_locale_translations),
        )
        .route(
            "/labels/{id}",
            get(labels::get_label)
                .patch(labels::update_label)
                .delete(labels::delete_label),
        )
        .route(
            "/labels/{id}/translations",
            put(labels::upsert_translations),
        )
}
