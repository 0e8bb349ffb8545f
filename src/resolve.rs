//! Assembles label/translation data into the flat or nested key-value maps
//! served by the public API.
//!
//! Empty translation values are treated as untranslated and never emitted.
//! Flat maps are ordered by label key ascending (byte-wise), locales by name
//! ascending; the nested shape expands dotted keys into a tree in the same
//! pass.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Flat,
    Nested,
}

impl Shape {
    pub fn parse(mode: Option<&str>) -> Result<Self> {
        match mode {
            None | Some("flat") => Ok(Shape::Flat),
            Some("nested") => Ok(Shape::Nested),
            Some(other) => Err(Error::validation(
                "mode",
                format!("unknown mode '{other}', expected 'flat' or 'nested'"),
            )),
        }
    }
}

/// Resolves every locale of a project to its label-key/value map. Locales
/// with no non-empty translations still appear, as empty maps.
pub fn resolve_project(store: &dyn Store, project_id: &str, shape: Shape) -> Result<Value> {
    let locales = store.list_locales(project_id)?;
    let rows = store.list_translation_rows(project_id, None)?;

    let mut out = Map::new();
    for locale in &locales {
        let pairs: Vec<(&str, &str)> = rows
            .iter()
            .filter(|r| r.locale_name == locale.name)
            .map(|r| (r.label_key.as_str(), r.value.as_str()))
            .collect();
        out.insert(locale.name.clone(), shape_pairs(&pairs, shape)?);
    }

    Ok(Value::Object(out))
}

/// Resolves a single locale. An unknown locale name is NotFound, distinct
/// from a locale that merely has no translations yet.
pub fn resolve_locale(
    store: &dyn Store,
    project_id: &str,
    locale_name: &str,
    shape: Shape,
) -> Result<Value> {
    let locale = store
        .get_locale_by_name(project_id, locale_name)?
        .ok_or(Error::NotFound)?;

    let rows = store.list_translation_rows(project_id, Some(&locale.name))?;
    let pairs: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.label_key.as_str(), r.value.as_str()))
        .collect();

    shape_pairs(&pairs, shape)
}

fn shape_pairs(pairs: &[(&str, &str)], shape: Shape) -> Result<Value> {
    match shape {
        Shape::Flat => Ok(Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        )),
        Shape::Nested => nest_pairs(pairs),
    }
}

/// Expands dotted keys into a tree. Mutation-side validation forbids one key
/// from being a dot-boundary prefix of another, so a collision here means
/// legacy data; refuse rather than silently overwrite.
fn nest_pairs(pairs: &[(&str, &str)]) -> Result<Value> {
    let mut root = Map::new();

    for (key, value) in pairs {
        let mut current = &mut root;
        let mut parts = key.split('.').peekable();

        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                if current.contains_key(part) {
                    return Err(Error::conflict(format!(
                        "label key '{key}' collides with a nested group"
                    )));
                }
                current.insert(part.to_string(), Value::String(value.to_string()));
            } else {
                let entry = current
                    .entry(part.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                current = match entry {
                    Value::Object(map) => map,
                    _ => {
                        return Err(Error::conflict(format!(
                            "label key '{key}' extends the key of an existing value"
                        )));
                    }
                };
            }
        }
    }

    Ok(Value::Object(root))
}
