use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API URL '{value}': {reason}")]
    InvalidApiUrl { value: String, reason: String },
}

/// Reads `API_URL` (or `APP__API_URL`, which takes precedence) once.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let mut raw = None;

    if let Ok(v) = std::env::var("API_URL") {
        raw = Some(v);
    }
    if let Ok(v) = std::env::var("APP__API_URL") {
        raw = Some(v);
    }

    Settings::from_api_url(raw.as_deref())
}

impl Settings {
    pub fn from_api_url(raw: Option<&str>) -> Result<Self, ConfigError> {
        let api_url = normalize_api_url(raw.unwrap_or_default());
        validate_api_url(&api_url)?;
        Ok(Self { api_url })
    }
}

fn normalize_api_url(raw_api_url: &str) -> String {
    let raw_api_url = raw_api_url.trim();

    if raw_api_url.is_empty() {
        return Settings::default().api_url;
    }

    raw_api_url.trim_end_matches('/').to_string()
}

fn validate_api_url(api_url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidApiUrl {
        value: api_url.to_string(),
        reason,
    };

    let parsed = Url::parse(api_url).map_err(|err| invalid(err.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".into()));
    }

    Ok(())
}
