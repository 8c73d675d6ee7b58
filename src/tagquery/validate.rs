//! Tag key validation

use crate::error::ValidationError;

/// Characters the tag query grammar reserves for itself
pub const RESERVED_KEY_CHARS: &[char] = &[';', '!', '^', '='];

/// Validate the key of a query expression
///
/// Tag keys must be non-empty and may contain any character except
/// `;!^=` and control characters.
pub fn validate_query_expression_tag_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::Empty);
    }

    for c in key.chars() {
        if RESERVED_KEY_CHARS.contains(&c) {
            return Err(ValidationError::ReservedCharacter(c));
        }
        if c.is_control() {
            return Err(ValidationError::ControlCharacter(c));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        for key in ["host", "name", "__tag", "dc.region", "a-b_c", "with space", "ключ"] {
            assert!(validate_query_expression_tag_key(key).is_ok(), "{}", key);
        }
    }

    #[test]
    fn test_invalid_keys() {
        assert_eq!(validate_query_expression_tag_key(""), Err(ValidationError::Empty));
        assert_eq!(
            validate_query_expression_tag_key("a;b"),
            Err(ValidationError::ReservedCharacter(';'))
        );
        assert_eq!(
            validate_query_expression_tag_key("a\nb"),
            Err(ValidationError::ControlCharacter('\n'))
        );
    }
}
