//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest participant identity accepted.
pub const MAX_PARTICIPANT_ID_LEN: usize = 255;
/// Longest free-text profile field accepted.
pub const MAX_PROFILE_FIELD_LEN: usize = 512;

/// Validates a participant identity (the `sub` claim of an auth profile).
///
/// # Examples
///
/// ```ignore
/// validate_participant_id("google-oauth2|1234") // Ok
/// validate_participant_id("")                   // Err - empty
/// validate_participant_id("auth0|a b")          // Err - whitespace
/// ```
pub fn validate_participant_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        let mut err = ValidationError::new("participant_id_empty");
        err.message = Some("Participant ID must not be empty".into());
        return Err(err);
    }

    if id.len() > MAX_PARTICIPANT_ID_LEN {
        let mut err = ValidationError::new("participant_id_length");
        err.message = Some(
            format!(
                "Participant ID must be at most {MAX_PARTICIPANT_ID_LEN} bytes (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        let mut err = ValidationError::new("participant_id_format");
        err.message = Some("Participant ID must not contain whitespace or control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates an optional free-text profile field (name, nickname, picture URL).
pub fn validate_profile_field(value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_PROFILE_FIELD_LEN {
        let mut err = ValidationError::new("profile_field_length");
        err.message = Some(
            format!("Profile fields must be at most {MAX_PROFILE_FIELD_LEN} bytes").into(),
        );
        return Err(err);
    }

    if value.chars().any(char::is_control) {
        let mut err = ValidationError::new("profile_field_format");
        err.message = Some("Profile fields must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_participant_id_valid() {
        assert!(validate_participant_id("google-oauth2|113942781234").is_ok());
        assert!(validate_participant_id("auth0|5f1c2d").is_ok());
        assert!(validate_participant_id("x").is_ok());
    }

    #[test]
    fn test_validate_participant_id_invalid_length() {
        assert!(validate_participant_id("").is_err());
        assert!(validate_participant_id(&"a".repeat(MAX_PARTICIPANT_ID_LEN)).is_ok());
        assert!(validate_participant_id(&"a".repeat(MAX_PARTICIPANT_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_participant_id_invalid_format() {
        assert!(validate_participant_id("auth0|a b").is_err()); // space
        assert!(validate_participant_id(" auth0|ab").is_err()); // leading space
        assert!(validate_participant_id("auth0|\u{0}").is_err()); // control
        assert!(validate_participant_id("auth0|ab\n").is_err()); // newline
    }

    #[test]
    fn test_validate_profile_field() {
        assert!(validate_profile_field("Danny DeVito").is_ok());
        assert!(validate_profile_field("").is_ok());
        assert!(validate_profile_field("bad\u{7}bell").is_err());
        assert!(validate_profile_field(&"n".repeat(MAX_PROFILE_FIELD_LEN + 1)).is_err());
    }
}
