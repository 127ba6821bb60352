use validator::{Validate, ValidationError};

use crate::error::ApiError;

/// Most tags a profile may list under expertise or interests
pub const MAX_TAGS: usize = 20;
const MAX_TAG_LEN: usize = 50;

/// Run the derived validator rules of a request payload.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload.validate().map_err(ApiError::from)
}

/// `validator` custom rule for expertise / interest tag lists.
///
/// # Examples
/// ```
/// use lms_api::validation::validate_tags;
///
/// assert!(validate_tags(&["rust".to_string(), "sql".to_string()]).is_ok());
/// assert!(validate_tags(&["   ".to_string()]).is_err());
/// ```
pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::new("too_many_tags"));
    }
    if tags
        .iter()
        .any(|t| t.trim().is_empty() || t.chars().count() > MAX_TAG_LEN)
    {
        return Err(ValidationError::new("invalid_tag"));
    }
    Ok(())
}

/// Trim tags and drop case-insensitive duplicates, keeping first spelling.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

/// Quiz options: between two and six non-empty choices.
pub fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    if !(2..=6).contains(&options.len()) {
        return Err(ValidationError::new("option_count"));
    }
    if options.iter().any(|o| o.trim().is_empty()) {
        return Err(ValidationError::new("empty_option"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tags() {
        assert!(validate_tags(&[]).is_ok());
        assert!(validate_tags(&["web".to_string()]).is_ok());
        assert!(validate_tags(&["".to_string()]).is_err());
        assert!(validate_tags(&["x".repeat(51)]).is_err());
        assert!(validate_tags(&vec!["tag".to_string(); MAX_TAGS + 1]).is_err());
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            " Rust ".to_string(),
            "rust".to_string(),
            "".to_string(),
            "Postgres".to_string(),
        ];
        assert_eq!(normalize_tags(&tags), vec!["Rust", "Postgres"]);
    }

    #[test]
    fn test_validate_options() {
        let two = vec!["a".to_string(), "b".to_string()];
        assert!(validate_options(&two).is_ok());
        assert!(validate_options(&["a".to_string()]).is_err());
        assert!(validate_options(&vec!["a".to_string(); 7]).is_err());
        assert!(validate_options(&["a".to_string(), " ".to_string()]).is_err());
    }
}
