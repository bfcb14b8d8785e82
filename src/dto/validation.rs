//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest identifier accepted for guilds, channels and users.
const MAX_SNOWFLAKE_LEN: usize = 20;

/// Validates that a platform identifier is a non-empty string of at most 20 ASCII digits.
///
/// # Examples
///
/// ```ignore
/// validate_snowflake("123456789012345678") // Ok
/// validate_snowflake("")                   // Err - empty
/// validate_snowflake("12ab")               // Err - not a number
/// ```
pub fn validate_snowflake(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_SNOWFLAKE_LEN {
        let mut err = ValidationError::new("snowflake_length");
        err.message = Some(
            format!(
                "Identifier must have between 1 and {MAX_SNOWFLAKE_LEN} digits (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("snowflake_format");
        err.message = Some("Identifier must contain only decimal digits".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_snowflake_valid() {
        assert!(validate_snowflake("1").is_ok());
        assert!(validate_snowflake("123456789012345678").is_ok());
        assert!(validate_snowflake("18446744073709551615").is_ok());
    }

    #[test]
    fn test_validate_snowflake_invalid_length() {
        assert!(validate_snowflake("").is_err());
        assert!(validate_snowflake("123456789012345678901").is_err()); // 21 digits
    }

    #[test]
    fn test_validate_snowflake_invalid_format() {
        assert!(validate_snowflake("12ab").is_err());
        assert!(validate_snowflake("-12").is_err());
        assert!(validate_snowflake("12 34").is_err()); // space
    }
}
