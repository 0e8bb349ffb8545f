mod auth;
pub mod dto;
mod labels;
mod locales;
mod projects;
mod public;
pub mod response;
mod router;
pub mod validation;

pub use router::{AppState, create_router};

use crate::access::{AccessContext, Capability, authorize};
use crate::types::{Project, User};
use response::ApiError;

/// Owner gate for dashboard routes: non-owners get NotFound so project
/// existence is not leaked.
pub(crate) fn require_owner(user: &User, project: &Project) -> Result<(), ApiError> {
    authorize(
        &AccessContext::Owner(user.id.clone()),
        project,
        None,
        Capability::Write,
    )
    .map_err(ApiError::from)
}
