use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One named slot of the signup form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Email,
    Password,
    ConfirmPassword,
    PhoneNumber,
    Nickname,
    Gender,
    Birthdate,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Email,
        Field::Password,
        Field::ConfirmPassword,
        Field::PhoneNumber,
        Field::Nickname,
        Field::Gender,
        Field::Birthdate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Password => "password",
            Field::ConfirmPassword => "confirmPassword",
            Field::PhoneNumber => "phoneNumber",
            Field::Nickname => "nickname",
            Field::Gender => "gender",
            Field::Birthdate => "birthdate",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown signup field '{}'", self.0)
    }
}

impl std::error::Error for UnknownField {}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(raw))
            .ok_or_else(|| UnknownField(raw.to_string()))
    }
}

/// Keys of the error map: every form field plus the verification-code input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKey {
    Email,
    Password,
    ConfirmPassword,
    PhoneNumber,
    Nickname,
    Gender,
    Birthdate,
    VerificationCode,
}

impl ErrorKey {
    pub const ALL: [ErrorKey; 8] = [
        ErrorKey::Email,
        ErrorKey::Password,
        ErrorKey::ConfirmPassword,
        ErrorKey::PhoneNumber,
        ErrorKey::Nickname,
        ErrorKey::Gender,
        ErrorKey::Birthdate,
        ErrorKey::VerificationCode,
    ];
}

impl From<Field> for ErrorKey {
    fn from(field: Field) -> Self {
        match field {
            Field::Email => ErrorKey::Email,
            Field::Password => ErrorKey::Password,
            Field::ConfirmPassword => ErrorKey::ConfirmPassword,
            Field::PhoneNumber => ErrorKey::PhoneNumber,
            Field::Nickname => ErrorKey::Nickname,
            Field::Gender => ErrorKey::Gender,
            Field::Birthdate => ErrorKey::Birthdate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    Email,
    Username,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniquenessResult {
    Available,
    Taken,
    UnknownError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    pub fn label(self) -> &'static str {
        match self {
            PasswordStrength::Weak => "weak",
            PasswordStrength::Medium => "medium",
            PasswordStrength::Strong => "strong",
        }
    }
}

impl fmt::Display for PasswordStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display tag attached to advisory feedback; the renderer maps it to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStyle {
    #[default]
    Plain,
    Danger,
    Caution,
    Success,
}

impl From<PasswordStrength> for FeedbackStyle {
    fn from(strength: PasswordStrength) -> Self {
        match strength {
            PasswordStrength::Weak => FeedbackStyle::Danger,
            PasswordStrength::Medium => FeedbackStyle::Caution,
            PasswordStrength::Strong => FeedbackStyle::Success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_field_names_case_insensitively() {
        assert_eq!("confirmPassword".parse::<Field>(), Ok(Field::ConfirmPassword));
        assert_eq!("EMAIL".parse::<Field>(), Ok(Field::Email));
        assert!("username".parse::<Field>().is_err());
    }

    #[test]
    fn field_index_matches_declaration_order() {
        for (position, field) in Field::ALL.into_iter().enumerate() {
            assert_eq!(field.index(), position);
        }
    }

    #[test]
    fn error_keys_serialize_as_camel_case_map_keys() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(ErrorKey::VerificationCode, "x".to_string());
        let json = serde_json::to_string(&map).expect("serialize");
        assert_eq!(json, r#"{"verificationCode":"x"}"#);
    }
}
