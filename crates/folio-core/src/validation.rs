//! # Validation Module
//!
//! Input validation for renumbering sessions.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Job file / operator input                                    │
//! │  ├── Deserialization (serde)                                           │
//! │  └── THIS MODULE: series, filter and free-text rules                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Session state machine                                        │
//! │  ├── Empty selection, duplicate target series                          │
//! │  └── Phase ordering                                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── UNIQUE (tenant_id, series, correlative_number)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::SERIES_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest free-text response filter accepted.
pub const MAX_FREE_TEXT_LEN: usize = 100;

// =============================================================================
// Series Validators
// =============================================================================

/// Validates and normalizes a series code.
///
/// ## Rules
/// - Must not be empty
/// - Exactly 4 characters
/// - First character an uppercase letter, the rest uppercase letters or digits
///
/// Input is trimmed and upper-cased before checking.
///
/// ```rust
/// use folio_core::validation::validate_series;
///
/// assert_eq!(validate_series("f002").unwrap(), "F002");
/// assert!(validate_series("").is_err());
/// assert!(validate_series("1001").is_err());
/// ```
pub fn validate_series(series: &str) -> ValidationResult<String> {
    check_series("series", series)
}

/// Validates the target series of a renumbering.
pub fn validate_target_series(series: &str) -> ValidationResult<String> {
    check_series("target series", series)
}

fn check_series(field: &str, series: &str) -> ValidationResult<String> {
    let series = series.trim().to_ascii_uppercase();

    if series.is_empty() {
        return Err(ValidationError::required(field));
    }

    if series.chars().count() != SERIES_LEN {
        return Err(ValidationError::invalid_format(
            field,
            format!("must be exactly {} characters", SERIES_LEN),
        ));
    }

    let mut chars = series.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_uppercase());
    let rest_alnum = chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());

    if !starts_with_letter || !rest_alnum {
        return Err(ValidationError::invalid_format(
            field,
            "must be a letter followed by 3 letters or digits",
        ));
    }

    Ok(series)
}

/// Validates the series filter of a search.
///
/// The filter is matched by equality against a series or as a prefix of a
/// display number, so partial values like `F0` or `F001-0000` are allowed.
pub fn validate_series_filter(filter: &str) -> ValidationResult<String> {
    let filter = filter.trim().to_ascii_uppercase();

    if filter.is_empty() {
        return Err(ValidationError::required("series filter"));
    }

    if filter.len() > SERIES_LEN + 1 + crate::CORRELATIVE_WIDTH {
        return Err(ValidationError::TooLong {
            field: "series filter".to_string(),
            max: SERIES_LEN + 1 + crate::CORRELATIVE_WIDTH,
        });
    }

    if !filter.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::invalid_format(
            "series filter",
            "only letters, digits and '-' are allowed",
        ));
    }

    Ok(filter)
}

/// Validates an optional response-code/message filter.
///
/// Returns `None` for blank input so callers can skip the filter.
pub fn validate_free_text(text: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    if text.chars().count() > MAX_FREE_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: "response filter".to_string(),
            max: MAX_FREE_TEXT_LEN,
        });
    }

    Ok(Some(text.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_series() {
        assert_eq!(validate_series("F001").unwrap(), "F001");
        assert_eq!(validate_series(" fc01 ").unwrap(), "FC01");
        assert!(matches!(validate_series("   "), Err(ValidationError::Required { .. })));
        assert!(matches!(validate_series("F01"), Err(ValidationError::InvalidFormat { .. })));
        assert!(matches!(validate_series("F0001"), Err(ValidationError::InvalidFormat { .. })));
        assert!(matches!(validate_series("0001"), Err(ValidationError::InvalidFormat { .. })));
        assert!(matches!(validate_series("F-01"), Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn test_validate_target_series_names_field() {
        let err = validate_target_series("").unwrap_err();
        assert_eq!(err.to_string(), "target series is required");
    }

    #[test]
    fn test_validate_series_filter() {
        assert_eq!(validate_series_filter("f0").unwrap(), "F0");
        assert_eq!(validate_series_filter("F001-0000").unwrap(), "F001-0000");
        assert!(validate_series_filter("").is_err());
        assert!(validate_series_filter("F001 0001").is_err());
        assert!(validate_series_filter("F001-000000001").is_err());
    }

    #[test]
    fn test_validate_free_text() {
        assert_eq!(validate_free_text(None).unwrap(), None);
        assert_eq!(validate_free_text(Some("  ")).unwrap(), None);
        assert_eq!(validate_free_text(Some(" 2033 ")).unwrap(), Some("2033".to_string()));
        assert!(validate_free_text(Some(&"x".repeat(101))).is_err());
    }
}
