use std::{
    collections::HashMap,
    fs,
    ops::RangeInclusive,
    path::Path,
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, Context};
use chrono::{Local, NaiveDate};
use url::Url;
use validation::DEFAULT_RESERVED_NICKNAMES;

use crate::transport::{HttpTransport, MissingTransport, SignupTransport};

pub const DEFAULT_SETTINGS_FILE: &str = "signup.toml";
pub const VERIFICATION_SECONDS: u32 = 180;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: Option<String>,
    pub request_timeout_secs: u64,
    pub verification_seconds: u32,
    pub require_verification: bool,
    pub enforce_password_shape: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: None,
            request_timeout_secs: 10,
            verification_seconds: VERIFICATION_SECONDS,
            require_verification: true,
            enforce_password_shape: true,
        }
    }
}

impl Settings {
    pub fn form_rules(&self) -> FormRules {
        FormRules {
            verification_seconds: self.verification_seconds,
            require_verification: self.require_verification,
            enforce_password_shape: self.enforce_password_shape,
            ..FormRules::default()
        }
    }

    /// Builds the HTTP transport, or a [`MissingTransport`] when no backend is configured.
    pub fn transport(&self) -> anyhow::Result<Arc<dyn SignupTransport>> {
        match &self.backend_url {
            Some(url) => {
                let transport =
                    HttpTransport::new(url, Duration::from_secs(self.request_timeout_secs))
                        .with_context(|| format!("failed to build http transport for '{url}'"))?;
                Ok(Arc::new(transport))
            }
            None => Ok(Arc::new(MissingTransport)),
        }
    }
}

/// Immutable rule set handed to the controller at construction.
#[derive(Debug, Clone)]
pub struct FormRules {
    pub verification_seconds: u32,
    pub tick_period: Duration,
    pub require_verification: bool,
    pub enforce_password_shape: bool,
    pub nickname_len: RangeInclusive<usize>,
    pub reserved_nicknames: Vec<String>,
    /// Pins "today" for the birthdate rule; the local date is used when unset.
    pub reference_date: Option<NaiveDate>,
}

impl Default for FormRules {
    fn default() -> Self {
        Self {
            verification_seconds: VERIFICATION_SECONDS,
            tick_period: Duration::from_secs(1),
            require_verification: true,
            enforce_password_shape: true,
            nickname_len: 2..=16,
            reserved_nicknames: DEFAULT_RESERVED_NICKNAMES
                .iter()
                .map(|word| (*word).to_string())
                .collect(),
            reference_date: None,
        }
    }
}

impl FormRules {
    pub fn today(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

/// Defaults, then `path` (or `signup.toml` in the working directory), then
/// environment overrides.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    if let Ok(raw) = fs::read_to_string(path) {
        let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        apply_overrides(&mut settings, |key| file_cfg.get(key).map(toml_value_to_string))?;
    }

    apply_overrides(&mut settings, |key| {
        std::env::var(format!("APP__{}", key.to_ascii_uppercase())).ok()
    })?;
    if let Ok(v) = std::env::var("SIGNUP_BACKEND_URL") {
        settings.backend_url = Some(v);
    }

    if let Some(url) = &settings.backend_url {
        settings.backend_url = Some(normalize_backend_url(url)?);
    }

    Ok(settings)
}

fn apply_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("backend_url") {
        settings.backend_url = Some(v);
    }
    if let Some(v) = lookup("request_timeout_secs") {
        settings.request_timeout_secs = v
            .trim()
            .parse()
            .with_context(|| format!("invalid request_timeout_secs '{v}'"))?;
    }
    if let Some(v) = lookup("verification_seconds") {
        settings.verification_seconds = v
            .trim()
            .parse()
            .with_context(|| format!("invalid verification_seconds '{v}'"))?;
    }
    if let Some(v) = lookup("require_verification") {
        settings.require_verification = parse_flag(&v)?;
    }
    if let Some(v) = lookup("enforce_password_shape") {
        settings.enforce_password_shape = parse_flag(&v)?;
    }
    Ok(())
}

fn toml_value_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("invalid boolean flag '{other}'")),
    }
}

/// Validates an http(s) backend URL and strips any trailing slash.
pub fn normalize_backend_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    let url = Url::parse(raw).with_context(|| format!("invalid backend url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("backend url must start with http:// or https://"));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
