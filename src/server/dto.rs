use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ApiKey, LabelWithStatus, Locale, User};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateLocaleRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLabelRequest {
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLabelRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertTranslationsRequest {
    pub translations: Vec<TranslationValue>,
}

#[derive(Debug, Deserialize)]
pub struct TranslationValue {
    pub locale_id: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct UpsertTranslationsResponse {
    pub applied: usize,
}

#[derive(Debug, Serialize)]
pub struct LabelDetailResponse {
    #[serde(flatten)]
    pub label: crate::types::Label,
    pub translations: Vec<LabelTranslation>,
}

/// One per-locale value row for the label edit form; locales without a
/// translation row yet appear with an empty value.
#[derive(Debug, Serialize)]
pub struct LabelTranslation {
    pub locale_id: String,
    pub locale_name: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectLabelsResponse {
    pub locales: Vec<Locale>,
    pub labels: Vec<LabelWithStatus>,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub key: String,
    pub updated_at: DateTime<Utc>,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(key: ApiKey) -> Self {
        Self {
            key: key.key,
            updated_at: key.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TranslationsQuery {
    #[serde(default)]
    pub mode: Option<String>,
}

/// Envelope for the public translations API; field names are part of the
/// external contract.
#[derive(Debug, Serialize)]
pub struct PublicProjectResponse {
    pub project: PublicProject,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProject {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub translations: Value,
}
