use std::env;
use std::time::Duration;

use crate::error::ScheduleError;

pub const DEFAULT_OAUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_API_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "GigaChat-2";
pub const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Runtime configuration for the GigaChat client, sourced from environment
/// variables once at startup. Missing credentials are not an error here; they
/// surface as an authentication failure when a token is first requested.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: String,
    pub oauth_url: String,
    pub api_url: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ScheduleError> {
        let timeout_secs = parse_f64_env("GIGACHAT_TIMEOUT", DEFAULT_TIMEOUT_SECS)?;
        if !timeout_secs.is_finite() || timeout_secs <= 0.0 {
            return Err(ScheduleError::Config(format!(
                "GIGACHAT_TIMEOUT must be a positive number of seconds, got {timeout_secs}"
            )));
        }

        Ok(Self {
            client_id: non_empty_env("GIGACHAT_CLIENT_ID"),
            client_secret: non_empty_env("GIGACHAT_CLIENT_SECRET"),
            scope: env::var("GIGACHAT_SCOPE").unwrap_or_else(|_| DEFAULT_SCOPE.to_string()),
            oauth_url: env::var("GIGACHAT_OAUTH_URL")
                .unwrap_or_else(|_| DEFAULT_OAUTH_URL.to_string()),
            api_url: env::var("GIGACHAT_API_URL")
                .map(|value| value.trim().to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            model: env::var("GIGACHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            system_prompt: non_empty_env("GIGACHAT_SYSTEM_PROMPT"),
            verify_tls: parse_bool_env("GIGACHAT_VERIFY_TLS", false),
            timeout: Duration::from_secs_f64(timeout_secs),
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            scope: DEFAULT_SCOPE.to_string(),
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            verify_tls: false,
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool_env(var: &str, default: bool) -> bool {
    match env::var(var) {
        Ok(value) => matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

fn parse_f64_env(var: &str, default: f64) -> Result<f64, ScheduleError> {
    match env::var(var) {
        Ok(value) => value.trim().parse::<f64>().map_err(|err| {
            ScheduleError::Config(format!("invalid value for {var}: {err}"))
        }),
        Err(_) => Ok(default),
    }
}
