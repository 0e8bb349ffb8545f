mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// One submitted (locale, value) pair for a batched translation upsert.
#[derive(Debug, Clone)]
pub struct TranslationUpdate {
    pub locale_id: String,
    pub value: String,
}

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
    fn delete_session(&self, id: &str) -> Result<bool>;
    fn update_session_last_used(&self, id: &str) -> Result<()>;

    // Project operations
    fn create_project(&self, project: &Project) -> Result<()>;
    fn get_project(&self, id: &str) -> Result<Option<Project>>;
    fn get_project_by_name(&self, name: &str) -> Result<Option<Project>>;
    fn list_user_projects(&self, user_id: &str) -> Result<Vec<Project>>;
    fn set_project_public(&self, id: &str, public: bool) -> Result<()>;
    fn delete_project(&self, id: &str) -> Result<bool>;

    // Locale operations
    fn create_locale(&self, locale: &Locale) -> Result<()>;
    fn get_locale(&self, id: &str) -> Result<Option<Locale>>;
    fn get_locale_by_name(&self, project_id: &str, name: &str) -> Result<Option<Locale>>;
    fn list_locales(&self, project_id: &str) -> Result<Vec<Locale>>;
    fn delete_locale(&self, id: &str) -> Result<bool>;

    // Label operations
    fn create_label(&self, label: &Label) -> Result<()>;
    fn get_label(&self, id: &str) -> Result<Option<Label>>;
    fn get_label_by_key(&self, project_id: &str, key: &str) -> Result<Option<Label>>;
    fn list_labels(&self, project_id: &str) -> Result<Vec<Label>>;
    fn list_labels_with_status(&self, project_id: &str) -> Result<Vec<LabelWithStatus>>;
    fn update_label(&self, label: &Label) -> Result<()>;
    fn delete_label(&self, id: &str) -> Result<bool>;

    // Translation operations
    fn get_translation(&self, label_id: &str, locale_id: &str) -> Result<Option<Translation>>;
    fn list_label_translations(&self, label_id: &str) -> Result<Vec<Translation>>;

    /// Applies a batch of per-locale values for one label as a single
    /// transaction. Pairs whose locale does not belong to the label's project
    /// are discarded; pairs whose value already matches are skipped. Returns
    /// the number of rows created or updated.
    fn upsert_translations(&self, label: &Label, updates: &[TranslationUpdate]) -> Result<usize>;

    /// Non-empty translation values for a project, optionally restricted to
    /// one locale, ordered by locale name then label key.
    fn list_translation_rows(
        &self,
        project_id: &str,
        locale_name: Option<&str>,
    ) -> Result<Vec<TranslationRow>>;

    // API key operations
    fn get_api_key(&self, project_id: &str) -> Result<Option<ApiKey>>;
    fn rotate_api_key(&self, project_id: &str, key: &str) -> Result<ApiKey>;

    fn close(&self) -> Result<()>;
}
