//! Field rules shared by the services. Each check returns the cleaned value.

use std::collections::HashMap;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::database::models::DEFAULT_TAG_COLOR;

pub const TAG_NAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 6;

/// Trimmed tag name: 1 to 50 characters of letters, digits, spaces, hyphens and underscores
pub fn tag_name(raw: Option<&str>) -> ServiceResult<String> {
    let name = raw.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ServiceError::validation("Tag name is required"));
    }
    if name.chars().count() > TAG_NAME_MAX_CHARS {
        return Err(ServiceError::validation("Tag name cannot exceed 50 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' || c == '_')
    {
        return Err(ServiceError::validation(
            "Tag name can only contain letters, numbers, spaces, hyphens, and underscores",
        ));
    }
    Ok(name.to_string())
}

/// `#RRGGBB`, falling back to the default color when absent
pub fn tag_color(raw: Option<&str>) -> ServiceResult<String> {
    match raw {
        None => Ok(DEFAULT_TAG_COLOR.to_string()),
        Some(color) if is_hex_color(color) => Ok(color.to_string()),
        Some(_) => Err(ServiceError::validation(
            "Color must be a valid hex color code (e.g., #FF5733)",
        )),
    }
}

fn is_hex_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// `local@domain.tld` with no whitespace and a single `@`
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

pub fn password(raw: &str) -> ServiceResult<()> {
    if raw.chars().count() < PASSWORD_MIN_CHARS {
        return Err(ServiceError::validation(
            "Password must be at least 6 characters long",
        ));
    }
    Ok(())
}

/// Trims a required text field, recording a field error when it is missing or blank
pub fn required(
    field: &str,
    value: Option<&str>,
    errors: &mut HashMap<String, String>,
) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.insert(field.to_string(), format!("{} is required", field));
            None
        }
    }
}

pub fn parse_id(raw: &str) -> ServiceResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::InvalidId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_names() {
        assert_eq!(tag_name(Some("  Work Stuff ")).unwrap(), "Work Stuff");
        assert_eq!(tag_name(Some("side-project_2")).unwrap(), "side-project_2");
        assert!(tag_name(None).is_err());
        assert!(tag_name(Some("   ")).is_err());
        assert!(tag_name(Some("work!")).is_err());
        assert!(tag_name(Some(&"a".repeat(50))).is_ok());
        assert!(tag_name(Some(&"a".repeat(51))).is_err());
    }

    #[test]
    fn tag_colors() {
        assert_eq!(tag_color(None).unwrap(), "#3498db");
        assert_eq!(tag_color(Some("#FF5733")).unwrap(), "#FF5733");
        assert!(tag_color(Some("FF5733")).is_err());
        assert!(tag_color(Some("#FF573")).is_err());
        assert!(tag_color(Some("#GG5733")).is_err());
    }

    #[test]
    fn emails() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada@.com"));
        assert!(!is_valid_email("ada@example."));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada @example.com"));
        assert!(!is_valid_email("ada@ex@ample.com"));
    }

    #[test]
    fn passwords() {
        assert!(password("123456").is_ok());
        assert!(password("12345").is_err());
    }

    #[test]
    fn required_fields_collect_errors() {
        let mut errors = HashMap::new();
        assert_eq!(required("name", Some(" Ada "), &mut errors).as_deref(), Some("Ada"));
        assert!(required("phone", Some("  "), &mut errors).is_none());
        assert!(required("email", None, &mut errors).is_none());
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("phone"));
    }
}
