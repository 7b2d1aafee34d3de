//! User-facing strings written into the error and feedback maps.

use shared::domain::{IdentifierKind, PasswordStrength, UniquenessResult};

pub const EMAIL_INVALID: &str = "Please enter a valid email address.";
pub const EMAIL_TAKEN: &str = "This email is already in use.";
pub const EMAIL_CHECK_FAILED: &str = "Could not verify the email address. Please try again.";

pub const USERNAME_INVALID: &str = "Use 4~20 characters: English letters, digits and '_' only.";
pub const USERNAME_TAKEN: &str = "This username is already in use.";
pub const USERNAME_AVAILABLE: &str = "This username is available.";
pub const USERNAME_CHECK_FAILED: &str = "Could not verify the username. Please try again.";

pub const NICKNAME_LENGTH: &str = "Use 2~16 characters: Korean, English letters or digits only.";
pub const NICKNAME_UNUSABLE: &str = "This nickname cannot be used.";

pub const PASSWORD_SHAPE: &str =
    "Use 8~16 characters combining upper and lower case letters, digits and a symbol (!@#$%^&*).";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match.";
pub const PASSWORD_MATCH: &str = "Passwords match.";

pub const BIRTHDATE_INVALID: &str = "Enter a valid birthdate as YYYYMMDD.";

pub const CODE_MISMATCH: &str = "The verification code does not match.";
pub const CODE_NOT_REQUESTED: &str = "Request a verification code first.";
pub const CODE_SEND_FAILED: &str = "Failed to send the verification code.";

pub fn password_strength(strength: PasswordStrength) -> String {
    format!("Password strength: {strength}")
}

/// Error text for a uniqueness outcome; empty when the identifier is free.
pub fn uniqueness_error(kind: IdentifierKind, result: UniquenessResult) -> &'static str {
    match (kind, result) {
        (_, UniquenessResult::Available) => "",
        (IdentifierKind::Email, UniquenessResult::Taken) => EMAIL_TAKEN,
        (IdentifierKind::Email, UniquenessResult::UnknownError) => EMAIL_CHECK_FAILED,
        (IdentifierKind::Username, UniquenessResult::Taken) => USERNAME_TAKEN,
        (IdentifierKind::Username, UniquenessResult::UnknownError) => USERNAME_CHECK_FAILED,
    }
}
