use std::collections::BTreeMap;

use serde::Serialize;
use shared::domain::{ErrorKey, FeedbackStyle, Field};

use crate::verification::{VerificationPhase, VerificationSession};

/// Every field is always present; an untouched field is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValues {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone_number: String,
    pub nickname: String,
    pub gender: String,
    pub birthdate: String,
}

impl FormValues {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.email,
            Field::Password => &self.password,
            Field::ConfirmPassword => &self.confirm_password,
            Field::PhoneNumber => &self.phone_number,
            Field::Nickname => &self.nickname,
            Field::Gender => &self.gender,
            Field::Birthdate => &self.birthdate,
        }
    }

    pub(crate) fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
            Field::ConfirmPassword => &mut self.confirm_password,
            Field::PhoneNumber => &mut self.phone_number,
            Field::Nickname => &mut self.nickname,
            Field::Gender => &mut self.gender,
            Field::Birthdate => &mut self.birthdate,
        };
        *slot = value;
    }
}

/// Field error messages; the empty string means "no error".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorMap(BTreeMap<ErrorKey, String>);

impl Default for ErrorMap {
    fn default() -> Self {
        Self(
            ErrorKey::ALL
                .into_iter()
                .map(|key| (key, String::new()))
                .collect(),
        )
    }
}

impl ErrorMap {
    pub fn get(&self, key: impl Into<ErrorKey>) -> &str {
        self.0.get(&key.into()).map(String::as_str).unwrap_or_default()
    }

    pub fn is_clear(&self) -> bool {
        self.0.values().all(String::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ErrorKey, &str)> {
        self.0.iter().map(|(key, message)| (*key, message.as_str()))
    }

    pub(crate) fn set(&mut self, key: impl Into<ErrorKey>, message: impl Into<String>) {
        self.0.insert(key.into(), message.into());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub message: String,
    pub style: FeedbackStyle,
}

impl Feedback {
    pub fn new(message: impl Into<String>, style: FeedbackStyle) -> Self {
        Self {
            message: message.into(),
            style,
        }
    }
}

/// Advisory text for the password pair, independent of [`ErrorMap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeedbackMap(BTreeMap<Field, Feedback>);

impl Default for FeedbackMap {
    fn default() -> Self {
        Self(
            [Field::Password, Field::ConfirmPassword]
                .into_iter()
                .map(|field| (field, Feedback::default()))
                .collect(),
        )
    }
}

impl FeedbackMap {
    pub fn get(&self, field: Field) -> Option<&Feedback> {
        self.0.get(&field)
    }

    pub(crate) fn set(&mut self, field: Field, feedback: Feedback) {
        self.0.insert(field, feedback);
    }
}

/// Read-only copy of the controller state handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub values: FormValues,
    pub errors: ErrorMap,
    pub feedback: FeedbackMap,
    pub is_email_valid: bool,
    pub checking_email: bool,
    pub agreed: bool,
    pub verification: VerificationSession,
    pub phase: VerificationPhase,
    pub can_submit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_map_starts_with_every_key_clear() {
        let errors = ErrorMap::default();
        assert_eq!(errors.iter().count(), ErrorKey::ALL.len());
        assert!(errors.is_clear());
        assert_eq!(errors.get(Field::Email), "");
        assert_eq!(errors.get(ErrorKey::VerificationCode), "");
    }

    #[test]
    fn setting_an_error_blocks_clear_state() {
        let mut errors = ErrorMap::default();
        errors.set(Field::Nickname, "bad");
        assert!(!errors.is_clear());
        errors.set(Field::Nickname, "");
        assert!(errors.is_clear());
    }

    #[test]
    fn values_round_trip_through_field_accessors() {
        let mut values = FormValues::default();
        for field in Field::ALL {
            values.set(field, field.as_str().to_uppercase());
        }
        for field in Field::ALL {
            assert_eq!(values.get(field), field.as_str().to_uppercase());
        }
    }

    #[test]
    fn snapshot_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(FeedbackMap::default()).expect("serialize");
        assert!(json.get("confirmPassword").is_some());
        assert_eq!(json["password"]["style"], "plain");
    }
}
