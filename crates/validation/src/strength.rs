use shared::domain::PasswordStrength;

pub const MAX_SCORE: u8 = 6;

/// One point each for: length >= 8, length >= 12, an uppercase letter, a
/// lowercase letter, a digit, and an ASCII punctuation symbol.
pub fn evaluate_password_strength(password: &str) -> u8 {
    let len = password.chars().count();
    let criteria = [
        len >= 8,
        len >= 12,
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| c.is_ascii_punctuation()),
    ];
    criteria.into_iter().filter(|met| *met).count() as u8
}

pub fn get_password_strength(score: u8) -> PasswordStrength {
    match score {
        0..=2 => PasswordStrength::Weak,
        3..=4 => PasswordStrength::Medium,
        _ => PasswordStrength::Strong,
    }
}
