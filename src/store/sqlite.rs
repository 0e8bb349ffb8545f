use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use super::schema::SCHEMA;
use super::{Store, TranslationUpdate};
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Maps a unique-constraint violation to a Conflict so callers can treat the
/// race-prone existence pre-check as a UX nicety and the index as authority.
fn map_constraint(e: rusqlite::Error, message: &str) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::conflict(message)
        }
        e => Error::from(e),
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO users (id, email, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.id,
                    user.email,
                    user.password_hash,
                    format_datetime(&user.created_at),
                    format_datetime(&user.updated_at),
                ],
            )
            .map_err(|e| map_constraint(e, "a user with this email already exists"))?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    password_hash: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                    updated_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    password_hash: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                    updated_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO sessions (id, token_hash, token_lookup, user_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    session.id,
                    session.token_hash,
                    session.token_lookup,
                    session.user_id,
                    format_datetime(&session.created_at),
                    session.expires_at.as_ref().map(format_datetime),
                ],
            )
            .map_err(|e| map_constraint(e, "session lookup collision"))?;
        Ok(())
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at
             FROM sessions WHERE token_lookup = ?1",
            params![lookup],
            |row| {
                Ok(Session {
                    id: row.get(0)?,
                    token_hash: row.get(1)?,
                    token_lookup: row.get(2)?,
                    user_id: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    expires_at: row
                        .get::<_, Option<String>>(5)?
                        .map(|s| parse_datetime(&s)),
                    last_used_at: row
                        .get::<_, Option<String>>(6)?
                        .map(|s| parse_datetime(&s)),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_session_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE sessions SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Project operations

    fn create_project(&self, project: &Project) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO projects (id, user_id, name, public, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    project.id,
                    project.user_id,
                    project.name,
                    project.public,
                    format_datetime(&project.created_at),
                    format_datetime(&project.updated_at),
                ],
            )
            .map_err(|e| map_constraint(e, "a project with this name already exists"))?;
        Ok(())
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, user_id, name, public, created_at, updated_at FROM projects WHERE id = ?1",
            params![id],
            |row| {
                Ok(Project {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    public: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    updated_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, user_id, name, public, created_at, updated_at FROM projects WHERE name = ?1",
            params![name],
            |row| {
                Ok(Project {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    public: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    updated_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_user_projects(&self, user_id: &str) -> Result<Vec<Project>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, public, created_at, updated_at
             FROM projects WHERE user_id = ?1 ORDER BY name",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Project {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                public: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
                updated_at: parse_datetime(&row.get::<_, String>(5)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn set_project_public(&self, id: &str, public: bool) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE projects SET public = ?1, updated_at = ?2 WHERE id = ?3",
            params![public, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_project(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Locale operations

    fn create_locale(&self, locale: &Locale) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO locales (id, project_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    locale.id,
                    locale.project_id,
                    locale.name,
                    format_datetime(&locale.created_at),
                ],
            )
            .map_err(|e| map_constraint(e, "a locale with this name already exists"))?;
        Ok(())
    }

    fn get_locale(&self, id: &str) -> Result<Option<Locale>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, project_id, name, created_at FROM locales WHERE id = ?1",
            params![id],
            |row| {
                Ok(Locale {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    name: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_locale_by_name(&self, project_id: &str, name: &str) -> Result<Option<Locale>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, project_id, name, created_at
             FROM locales WHERE project_id = ?1 AND name = ?2",
            params![project_id, name],
            |row| {
                Ok(Locale {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    name: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_locales(&self, project_id: &str) -> Result<Vec<Locale>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, name, created_at
             FROM locales WHERE project_id = ?1 ORDER BY name",
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            Ok(Locale {
                id: row.get(0)?,
                project_id: row.get(1)?,
                name: row.get(2)?,
                created_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_locale(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM locales WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Label operations

    fn create_label(&self, label: &Label) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO labels (id, project_id, key, description, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    label.id,
                    label.project_id,
                    label.key,
                    label.description,
                    format_datetime(&label.created_at),
                    format_datetime(&label.updated_at),
                ],
            )
            .map_err(|e| map_constraint(e, "a label with this key already exists"))?;
        Ok(())
    }

    fn get_label(&self, id: &str) -> Result<Option<Label>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, project_id, key, description, created_at, updated_at
             FROM labels WHERE id = ?1",
            params![id],
            |row| {
                Ok(Label {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    key: row.get(2)?,
                    description: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    updated_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_label_by_key(&self, project_id: &str, key: &str) -> Result<Option<Label>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, project_id, key, description, created_at, updated_at
             FROM labels WHERE project_id = ?1 AND key = ?2",
            params![project_id, key],
            |row| {
                Ok(Label {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    key: row.get(2)?,
                    description: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    updated_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_labels(&self, project_id: &str) -> Result<Vec<Label>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, key, description, created_at, updated_at
             FROM labels WHERE project_id = ?1 ORDER BY key",
        )?;

        let rows = stmt.query_map(params![project_id], |row| {
            Ok(Label {
                id: row.get(0)?,
                project_id: row.get(1)?,
                key: row.get(2)?,
                description: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
                updated_at: parse_datetime(&row.get::<_, String>(5)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_labels_with_status(&self, project_id: &str) -> Result<Vec<LabelWithStatus>> {
        let labels = self.list_labels(project_id)?;

        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT t.label_id, lo.name
             FROM translations t
             JOIN locales lo ON lo.id = t.locale_id
             JOIN labels la ON la.id = t.label_id
             WHERE la.project_id = ?1 AND t.value <> ''
             ORDER BY lo.name",
        )?;

        let mut by_label: HashMap<String, Vec<String>> = HashMap::new();
        let rows = stmt.query_map(params![project_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (label_id, locale_name) = row?;
            by_label.entry(label_id).or_default().push(locale_name);
        }

        Ok(labels
            .into_iter()
            .map(|label| {
                let translated_locales = by_label.remove(&label.id).unwrap_or_default();
                LabelWithStatus {
                    label,
                    translated_locales,
                }
            })
            .collect())
    }

    fn update_label(&self, label: &Label) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE labels SET key = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    label.key,
                    label.description,
                    format_datetime(&Utc::now()),
                    label.id
                ],
            )
            .map_err(|e| map_constraint(e, "a label with this key already exists"))?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_label(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM labels WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Translation operations

    fn get_translation(&self, label_id: &str, locale_id: &str) -> Result<Option<Translation>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, label_id, locale_id, value, created_at, updated_at
             FROM translations WHERE label_id = ?1 AND locale_id = ?2",
            params![label_id, locale_id],
            |row| {
                Ok(Translation {
                    id: row.get(0)?,
                    label_id: row.get(1)?,
                    locale_id: row.get(2)?,
                    value: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    updated_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_label_translations(&self, label_id: &str) -> Result<Vec<Translation>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.label_id, t.locale_id, t.value, t.created_at, t.updated_at
             FROM translations t
             JOIN locales lo ON lo.id = t.locale_id
             WHERE t.label_id = ?1 ORDER BY lo.name",
        )?;

        let rows = stmt.query_map(params![label_id], |row| {
            Ok(Translation {
                id: row.get(0)?,
                label_id: row.get(1)?,
                locale_id: row.get(2)?,
                value: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
                updated_at: parse_datetime(&row.get::<_, String>(5)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn upsert_translations(&self, label: &Label, updates: &[TranslationUpdate]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut applied = 0;

        for update in updates {
            // Discard locales that belong to another project.
            let locale_ok = tx
                .query_row(
                    "SELECT 1 FROM locales WHERE id = ?1 AND project_id = ?2",
                    params![update.locale_id, label.project_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !locale_ok {
                continue;
            }

            let existing = tx
                .query_row(
                    "SELECT id, value FROM translations WHERE label_id = ?1 AND locale_id = ?2",
                    params![label.id, update.locale_id],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()?;

            match existing {
                // Identical value: skip, so updated_at does not churn.
                Some((_, ref value)) if *value == update.value => {}
                Some((id, _)) => {
                    tx.execute(
                        "UPDATE translations SET value = ?1, updated_at = ?2 WHERE id = ?3",
                        params![update.value, format_datetime(&Utc::now()), id],
                    )?;
                    applied += 1;
                }
                None => {
                    let now = format_datetime(&Utc::now());
                    tx.execute(
                        "INSERT INTO translations (id, label_id, locale_id, value, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            Uuid::new_v4().to_string(),
                            label.id,
                            update.locale_id,
                            update.value,
                            now,
                            now
                        ],
                    )?;
                    applied += 1;
                }
            }
        }

        tx.commit()?;
        Ok(applied)
    }

    fn list_translation_rows(
        &self,
        project_id: &str,
        locale_name: Option<&str>,
    ) -> Result<Vec<TranslationRow>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT lo.name, la.key, t.value
             FROM translations t
             JOIN locales lo ON lo.id = t.locale_id
             JOIN labels la ON la.id = t.label_id
             WHERE la.project_id = ?1
               AND t.value <> ''
               AND (?2 IS NULL OR lo.name = ?2)
             ORDER BY lo.name, la.key",
        )?;

        let rows = stmt.query_map(params![project_id, locale_name], |row| {
            Ok(TranslationRow {
                locale_name: row.get(0)?,
                label_key: row.get(1)?,
                value: row.get(2)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // API key operations

    fn get_api_key(&self, project_id: &str) -> Result<Option<ApiKey>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, project_id, key, created_at, updated_at
             FROM api_keys WHERE project_id = ?1",
            params![project_id],
            |row| {
                Ok(ApiKey {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    key: row.get(2)?,
                    created_at: parse_datetime(&row.get::<_, String>(3)?),
                    updated_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn rotate_api_key(&self, project_id: &str, key: &str) -> Result<ApiKey> {
        let now = format_datetime(&Utc::now());
        // Row identity is preserved on rotation; only the value changes.
        self.conn().execute(
            "INSERT INTO api_keys (id, project_id, key, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(project_id) DO UPDATE SET key = excluded.key, updated_at = excluded.updated_at",
            params![Uuid::new_v4().to_string(), project_id, key, now],
        )?;

        self.get_api_key(project_id)?.ok_or(Error::NotFound)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
