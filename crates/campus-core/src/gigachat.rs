use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::ScheduleError;

/// Extraction instruction sent as the system message with every row. Can be
/// overridden through `GIGACHAT_SYSTEM_PROMPT`.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Ты — парсер учебного расписания. \
Вход: ОДНА строка в формате: \
[Sheet: <название листа>] [Header: <список колонок через запятую>] row: <col>=<value> | <col2>=<value2> | ... \
Колонки и значения могут быть на русском или английском, с любыми названиями. \
Нужно вернуть ОДИН JSON-объект со СТРОГИМИ ключами: \
subject, start_time, end_time, teacher, room, weekday, date, group, subgroup, week_type, note. \
Правила: \
Если время дано диапазоном (например \"9:00-10:30\", \"9.00 до 10.30\") — заполни start_time и end_time. \
Если указано одно время — положи его в start_time, end_time оставь пустым. \
Если есть и день недели, и дата — заполни оба поля. \
Все значения — строки (можно пустые). \
Если чего-то нет в строке — оставь пустую строку. \
НЕ добавляй новых ключей. \
Отвечай ТОЛЬКО валидным JSON-объектом без текста вокруг и без ```.";

/// Seam between the pipeline and the remote model, so tests can script
/// replies without a network.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Obtains an access token; failure here aborts the whole pipeline.
    async fn acquire_token(&self) -> Result<String, ScheduleError>;

    /// Sends one encoded row prompt and returns the raw reply envelope.
    async fn complete(&self, token: &str, prompt: &str) -> Result<Value, ScheduleError>;
}

/// Production client for the GigaChat OAuth + chat-completion endpoints.
pub struct GigaChatClient {
    http: reqwest::Client,
    settings: Settings,
}

impl GigaChatClient {
    pub fn new(settings: Settings) -> Result<Self, ScheduleError> {
        // The production endpoints sit behind a national CA, so certificate
        // verification is opt-in.
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()?;
        Ok(Self { http, settings })
    }

    fn system_prompt(&self) -> &str {
        self.settings
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[async_trait]
impl ChatProvider for GigaChatClient {
    async fn acquire_token(&self) -> Result<String, ScheduleError> {
        let (Some(client_id), Some(client_secret)) = (
            self.settings.client_id.as_deref(),
            self.settings.client_secret.as_deref(),
        ) else {
            return Err(ScheduleError::Auth(
                "missing GIGACHAT_CLIENT_ID / GIGACHAT_CLIENT_SECRET".to_string(),
            ));
        };

        let credentials = BASE64.encode(format!("{client_id}:{client_secret}"));
        let request_id = Uuid::new_v4().to_string();
        debug!(rquid = %request_id, url = %self.settings.oauth_url, "requesting access token");

        let response = self
            .http
            .post(&self.settings.oauth_url)
            .header("Authorization", format!("Basic {credentials}"))
            .header("RqUID", request_id)
            .header("Accept", "application/json")
            .form(&[("scope", self.settings.scope.as_str())])
            .send()
            .await?
            .error_for_status()
            .map_err(|err| ScheduleError::Auth(format!("token request failed: {err}")))?;

        let body: Value = response.json().await?;
        match body.get("access_token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(ScheduleError::Auth(format!(
                "no access_token in response: {body}"
            ))),
        }
    }

    async fn complete(&self, token: &str, prompt: &str) -> Result<Value, ScheduleError> {
        let body = CompletionRequest {
            model: &self.settings.model,
            messages: vec![
                Message {
                    role: "system",
                    content: self.system_prompt(),
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .http
            .post(&self.settings.api_url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let client = GigaChatClient::new(Settings::default()).expect("client");
        let err = client.acquire_token().await.unwrap_err();
        assert_eq!(err.kind(), "AuthError");
        assert!(err.to_string().contains("GIGACHAT_CLIENT_ID"));
    }

    #[test]
    fn completion_request_serializes_the_two_message_shape() {
        let request = CompletionRequest {
            model: "GigaChat-2",
            messages: vec![
                Message {
                    role: "system",
                    content: "инструкция",
                },
                Message {
                    role: "user",
                    content: "row: Предмет=Физика",
                },
            ],
            temperature: 0.0,
        };
        let value = serde_json::to_value(&request).expect("serializable");
        assert_eq!(value["model"], "GigaChat-2");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "row: Предмет=Физика");
        assert_eq!(value["temperature"], 0.0);
    }

    #[test]
    fn settings_override_replaces_the_default_instruction() {
        let mut settings = Settings::default();
        settings.system_prompt = Some("короткая инструкция".to_string());
        let client = GigaChatClient::new(settings).expect("client");
        assert_eq!(client.system_prompt(), "короткая инструкция");
    }
}
