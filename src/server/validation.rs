use crate::server::response::ApiError;

const MIN_PROJECT_NAME_LEN: usize = 3;
const MAX_PROJECT_NAME_LEN: usize = 64;
const MAX_LOCALE_NAME_LEN: usize = 64;
const MAX_LABEL_KEY_LEN: usize = 255;
const MAX_LABEL_DESCRIPTION_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 6;

fn is_segment_char(c: char) -> bool {
    c.is_ascii_lowercase() || c == '-' || c == '_'
}

/// Project names: at least three lowercase letters, digits, and dashes.
pub fn validate_project_name(name: &str) -> Result<(), ApiError> {
    if name.len() < MIN_PROJECT_NAME_LEN {
        return Err(ApiError::validation(
            "name",
            format!("project name must be at least {MIN_PROJECT_NAME_LEN} characters"),
        ));
    }
    if name.len() > MAX_PROJECT_NAME_LEN {
        return Err(ApiError::validation(
            "name",
            format!("project name cannot exceed {MAX_PROJECT_NAME_LEN} characters"),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ApiError::validation(
            "name",
            "project name can only contain lowercase letters, numbers, and dashes",
        ));
    }
    Ok(())
}

/// Locale names: lowercase letters, underscores and dashes, no dots.
pub fn validate_locale_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() {
        return Err(ApiError::validation("name", "locale name cannot be empty"));
    }
    if name.len() > MAX_LOCALE_NAME_LEN {
        return Err(ApiError::validation(
            "name",
            format!("locale name cannot exceed {MAX_LOCALE_NAME_LEN} characters"),
        ));
    }
    if !name.chars().all(is_segment_char) {
        return Err(ApiError::validation(
            "name",
            "locale name can only contain lowercase letters, underscores and dashes",
        ));
    }
    Ok(())
}

/// Label keys: dotted paths of lowercase/underscore/dash segments.
pub fn validate_label_key(key: &str) -> Result<(), ApiError> {
    if key.is_empty() {
        return Err(ApiError::validation("key", "label key cannot be empty"));
    }
    if key.len() > MAX_LABEL_KEY_LEN {
        return Err(ApiError::validation(
            "key",
            format!("label key cannot exceed {MAX_LABEL_KEY_LEN} characters"),
        ));
    }
    if key
        .split('.')
        .any(|segment| segment.is_empty() || !segment.chars().all(is_segment_char))
    {
        return Err(ApiError::validation(
            "key",
            "label key must be lowercase letters, underscores and dashes, separated by dots",
        ));
    }
    Ok(())
}

pub fn validate_label_description(description: &str) -> Result<(), ApiError> {
    if description.len() > MAX_LABEL_DESCRIPTION_LEN {
        return Err(ApiError::validation(
            "description",
            format!("description cannot exceed {MAX_LABEL_DESCRIPTION_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if !email.contains('@') || !email.contains('.') {
        return Err(ApiError::validation("email", "email must be valid"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation("password", "password is too weak"));
    }
    Ok(())
}

/// True when one key is the other, or a dot-boundary prefix of the other.
/// Such pairs cannot both exist as leaves of the nested shape, so label
/// creation and renames reject them.
pub fn keys_prefix_related(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    (a.len() < b.len() && b.as_bytes()[a.len()] == b'.' && b.starts_with(a))
        || (b.len() < a.len() && a.as_bytes()[b.len()] == b'.' && a.starts_with(b))
}
