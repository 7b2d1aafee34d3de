//! Per-field rule table: how raw input is normalized, which rules run on
//! edit and on blur, which other fields must be re-checked, and whether the
//! value is an identifier that needs a remote uniqueness check.

use shared::domain::{FeedbackStyle, Field, IdentifierKind};
use validation::{
    evaluate_password_strength, get_password_strength, normalize_digits, normalize_nickname,
    validate_birthdate, validate_email, validate_nickname_with, validate_password_shape,
};

use crate::{config::FormRules, messages, state::Feedback, state::FormValues};

/// Result of one rule evaluation. `error` is empty when the rule passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Verdict {
    pub error: String,
    pub feedback: Option<Feedback>,
}

impl Verdict {
    fn pass() -> Self {
        Self {
            error: String::new(),
            feedback: None,
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            error: message.to_string(),
            feedback: None,
        }
    }

    fn with_feedback(mut self, feedback: Feedback) -> Self {
        self.feedback = Some(feedback);
        self
    }
}

pub(crate) type Rule = fn(&FormValues, &FormRules) -> Verdict;

pub(crate) struct FieldRule {
    pub field: Field,
    pub normalize: fn(&str) -> String,
    pub on_change: Option<Rule>,
    pub on_blur: Option<Rule>,
    pub dependents: &'static [Field],
    pub uniqueness: Option<IdentifierKind>,
    pub required: bool,
}

static FIELD_RULES: [FieldRule; 7] = [
    FieldRule {
        field: Field::Email,
        normalize: keep,
        on_change: None,
        on_blur: Some(email_rule),
        dependents: &[],
        uniqueness: Some(IdentifierKind::Email),
        required: true,
    },
    FieldRule {
        field: Field::Password,
        normalize: keep,
        on_change: Some(password_rule),
        on_blur: None,
        dependents: &[Field::ConfirmPassword],
        uniqueness: None,
        required: true,
    },
    FieldRule {
        field: Field::ConfirmPassword,
        normalize: keep,
        on_change: Some(confirm_password_rule),
        on_blur: None,
        dependents: &[],
        uniqueness: None,
        required: true,
    },
    FieldRule {
        field: Field::PhoneNumber,
        normalize: normalize_digits,
        on_change: None,
        on_blur: None,
        dependents: &[],
        uniqueness: None,
        required: false,
    },
    FieldRule {
        field: Field::Nickname,
        normalize: normalize_nickname,
        on_change: Some(nickname_rule),
        on_blur: Some(nickname_rule),
        dependents: &[],
        uniqueness: None,
        required: true,
    },
    FieldRule {
        field: Field::Gender,
        normalize: keep,
        on_change: None,
        on_blur: None,
        dependents: &[],
        uniqueness: None,
        required: true,
    },
    FieldRule {
        field: Field::Birthdate,
        normalize: normalize_digits,
        on_change: Some(birthdate_rule),
        on_blur: None,
        dependents: &[],
        uniqueness: None,
        required: false,
    },
];

pub(crate) fn rule_for(field: Field) -> &'static FieldRule {
    &FIELD_RULES[field.index()]
}

pub(crate) fn rules() -> &'static [FieldRule] {
    &FIELD_RULES
}

fn keep(raw: &str) -> String {
    raw.to_string()
}

fn email_rule(values: &FormValues, _rules: &FormRules) -> Verdict {
    if validate_email(&values.email) {
        Verdict::pass()
    } else {
        Verdict::fail(messages::EMAIL_INVALID)
    }
}

fn password_rule(values: &FormValues, rules: &FormRules) -> Verdict {
    if values.password.is_empty() {
        return Verdict::pass().with_feedback(Feedback::new("", FeedbackStyle::Plain));
    }
    let strength = get_password_strength(evaluate_password_strength(&values.password));
    let feedback = Feedback::new(messages::password_strength(strength), strength.into());
    let verdict = if rules.enforce_password_shape && !validate_password_shape(&values.password) {
        Verdict::fail(messages::PASSWORD_SHAPE)
    } else {
        Verdict::pass()
    };
    verdict.with_feedback(feedback)
}

// Always reads the current password so a password edit re-checks against the new value.
fn confirm_password_rule(values: &FormValues, _rules: &FormRules) -> Verdict {
    if values.confirm_password == values.password {
        Verdict::pass().with_feedback(Feedback::new(
            messages::PASSWORD_MATCH,
            FeedbackStyle::Success,
        ))
    } else {
        Verdict::fail(messages::PASSWORD_MISMATCH)
            .with_feedback(Feedback::new("", FeedbackStyle::Danger))
    }
}

fn nickname_rule(values: &FormValues, rules: &FormRules) -> Verdict {
    let len = values.nickname.chars().count();
    if !rules.nickname_len.contains(&len) {
        Verdict::fail(messages::NICKNAME_LENGTH)
    } else if !validate_nickname_with(&values.nickname, &rules.reserved_nicknames) {
        Verdict::fail(messages::NICKNAME_UNUSABLE)
    } else {
        Verdict::pass()
    }
}

fn birthdate_rule(values: &FormValues, rules: &FormRules) -> Verdict {
    if values.birthdate.is_empty() || validate_birthdate(&values.birthdate, rules.today()) {
        Verdict::pass()
    } else {
        Verdict::fail(messages::BIRTHDATE_INVALID)
    }
}
