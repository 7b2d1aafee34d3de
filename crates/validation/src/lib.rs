//! Shape rules for signup fields. Every function here is total over all
//! strings and free of side effects.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

mod strength;

pub use strength::{evaluate_password_strength, get_password_strength, MAX_SCORE};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]{4,20}$").expect("valid username regex")
});

/// Symbols the password shape rule requires at least one of.
pub const PASSWORD_SYMBOLS: &[char] = &['!', '@', '#', '$', '%', '^', '&', '*'];
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 16;

const EARLIEST_BIRTH_YEAR: i32 = 1900;

pub const DEFAULT_RESERVED_NICKNAMES: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "operator",
    "manager",
    "null",
    "undefined",
    "관리자",
    "운영자",
    "운영진",
];

pub fn validate_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn validate_username(value: &str) -> bool {
    USERNAME_RE.is_match(value)
}

/// Length 8..=16 with at least one upper, lower, digit and symbol.
pub fn validate_password_shape(value: &str) -> bool {
    let len = value.chars().count();
    (PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len)
        && !value.contains('\n')
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SYMBOLS.contains(&c))
}

/// Hangul syllables, Hangul compatibility jamo, ASCII letters and digits.
pub fn is_nickname_char(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{3131}'..='\u{314E}' | '\u{314F}'..='\u{3163}')
        || c.is_ascii_alphanumeric()
}

pub fn validate_nickname(value: &str) -> bool {
    validate_nickname_with(value, DEFAULT_RESERVED_NICKNAMES)
}

/// Character-class check plus a case-insensitive reserved-word lookup.
pub fn validate_nickname_with<S: AsRef<str>>(value: &str, reserved: &[S]) -> bool {
    if !value.chars().all(is_nickname_char) {
        return false;
    }
    let lowered = value.to_lowercase();
    !reserved
        .iter()
        .any(|word| word.as_ref().to_lowercase() == lowered)
}

pub fn normalize_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

pub fn normalize_nickname(raw: &str) -> String {
    raw.chars().filter(|c| is_nickname_char(*c)).collect()
}

/// `YYYYMMDD`, a real calendar date, no earlier than 1900 and not after `today`.
pub fn validate_birthdate(value: &str, today: NaiveDate) -> bool {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match NaiveDate::parse_from_str(value, "%Y%m%d") {
        Ok(date) => date <= today && date.year() >= EARLIEST_BIRTH_YEAR,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_requires_local_domain_and_tld() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("first.last+tag@mail.co.kr"));
        assert!(!validate_email("user@example"));
        assert!(!validate_email("userexample.com"));
        assert!(!validate_email("user @example.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn nickname_accepts_hangul_letters_and_digits() {
        assert!(validate_nickname("abc"));
        assert!(validate_nickname("재잘재잘7"));
        assert!(validate_nickname("ㄱㅏ"));
        assert!(!validate_nickname("a!b"));
        assert!(!validate_nickname("with space"));
    }

    #[test]
    fn nickname_rejects_reserved_words_case_insensitively() {
        assert!(!validate_nickname("admin"));
        assert!(!validate_nickname("Admin"));
        assert!(!validate_nickname("관리자"));
        assert!(validate_nickname_with("admin", &["root"]));
        assert!(!validate_nickname_with("ROOT", &["root".to_string()]));
    }

    #[test]
    fn normalizers_strip_disallowed_characters() {
        assert_eq!(normalize_digits("010-1234 5678"), "01012345678");
        assert_eq!(normalize_nickname("a!b 재잘"), "ab재잘");
    }

    #[test]
    fn username_shape_boundaries() {
        assert!(validate_username("ab_12"));
        assert!(validate_username("abcd"));
        assert!(validate_username(&"a".repeat(20)));
        assert!(!validate_username("ab"));
        assert!(!validate_username("abc"));
        assert!(!validate_username(&"a".repeat(21)));
        assert!(!validate_username("ab-12"));
    }

    #[test]
    fn password_shape_needs_every_class_and_bounded_length() {
        assert!(validate_password_shape("Abcdef1!"));
        assert!(validate_password_shape("Abcdefgh12345!@#"));
        assert!(!validate_password_shape("Abcde1!"));
        assert!(!validate_password_shape("Abcdefgh12345!@#x"));
        assert!(!validate_password_shape("abcdef1!"));
        assert!(!validate_password_shape("ABCDEF1!"));
        assert!(!validate_password_shape("Abcdefg!"));
        assert!(!validate_password_shape("Abcdefg1"));
        assert!(!validate_password_shape("Abcdef1?"));
    }

    #[test]
    fn birthdate_must_be_a_past_calendar_date() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).expect("date");
        assert!(validate_birthdate("19990131", today));
        assert!(validate_birthdate("20240601", today));
        assert!(!validate_birthdate("20240602", today));
        assert!(!validate_birthdate("19990231", today));
        assert!(!validate_birthdate("1999013", today));
        assert!(!validate_birthdate("18991231", today));
    }
}
