use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::validation::{validate_participant_id, validate_profile_field},
    error::ServiceError,
    state::roster::{Participant, ParticipantId},
};

/// Participant profile as issued by the identity provider.
///
/// Only `sub` is required; the other claims are kept for display.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ParticipantPayload {
    /// Stable subject identifier, used as the participant identity.
    pub sub: String,
    /// Full display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Short display name.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub picture: Option<String>,
}

impl Validate for ParticipantPayload {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_participant_id(&self.sub) {
            errors.add("sub", e);
        }

        let optional = [
            ("name", &self.name),
            ("nickname", &self.nickname),
            ("picture", &self.picture),
        ];
        for (field, value) in optional {
            if let Some(value) = value
                && let Err(e) = validate_profile_field(value)
            {
                errors.add(field, e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl TryFrom<ParticipantPayload> for Participant {
    type Error = ServiceError;

    fn try_from(payload: ParticipantPayload) -> Result<Self, Self::Error> {
        payload.validate()?;
        Ok(Participant {
            id: ParticipantId::new(payload.sub),
            name: payload.name,
            nickname: payload.nickname,
            picture: payload.picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(sub: &str) -> ParticipantPayload {
        ParticipantPayload {
            sub: sub.into(),
            name: Some("Ada".into()),
            nickname: None,
            picture: None,
        }
    }

    #[test]
    fn valid_payload_becomes_participant() {
        let participant = Participant::try_from(payload("auth0|ada")).unwrap();
        assert_eq!(participant.id.as_str(), "auth0|ada");
        assert_eq!(participant.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn blank_subject_is_rejected() {
        let err = Participant::try_from(payload("")).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[test]
    fn control_characters_in_profile_are_rejected() {
        let mut bad = payload("auth0|ada");
        bad.nickname = Some("a\u{1b}[31m".into());
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("nickname"));
    }

    #[test]
    fn missing_optional_claims_deserialize() {
        let parsed: ParticipantPayload = serde_json::from_str(r#"{"sub":"auth0|x"}"#).unwrap();
        assert!(parsed.name.is_none() && parsed.picture.is_none());
    }
}
