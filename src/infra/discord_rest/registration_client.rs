use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::core::commands::payload::ApplicationCommandPayload;
use crate::core::commands::{CommandRegistrationApi, CommandRoute, RegistrationError};

const DISCORD_API: &str = "https://discord.com/api/v10";

/// Talks to Discord's bulk-overwrite command endpoints. One PUT per call,
/// no retries.
pub struct DiscordRegistrationClient {
    client: Client,
    base_url: String,
}

/// Error body Discord sends with 4xx responses.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
    code: Option<i64>,
    errors: Option<serde_json::Value>,
}

impl DiscordRegistrationClient {
    pub fn new() -> Result<Self, RegistrationError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "User-Agent",
            HeaderValue::from_static("DiscordBot (https://github.com/clint-bot, 0.3)"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| RegistrationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DISCORD_API.to_string(),
        })
    }

    /// Points the client at another API root (a local mock server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self, route: &CommandRoute) -> String {
        format!("{}{}", self.base_url, route.path())
    }

    /// Turns a non-success response body into something an operator can act
    /// on. Falls back to the raw body when it isn't Discord's JSON shape.
    fn describe_rejection(status: StatusCode, body: &str) -> String {
        match serde_json::from_str::<ApiError>(body) {
            Ok(ApiError {
                message: Some(message),
                code,
                errors,
            }) => {
                let mut text = match code {
                    Some(code) => format!("{} (code {})", message, code),
                    None => message,
                };
                if let Some(errors) = errors {
                    text.push_str(&format!(": {}", errors));
                }
                text
            }
            _ if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string(),
            _ => body.trim().to_string(),
        }
    }
}

#[async_trait]
impl CommandRegistrationApi for DiscordRegistrationClient {
    async fn put_commands(
        &self,
        route: &CommandRoute,
        token: &str,
        payload: &[ApplicationCommandPayload],
    ) -> Result<usize, RegistrationError> {
        let authorization = HeaderValue::from_str(&format!("Bot {}", token))
            .map_err(|e| RegistrationError::Credential(e.to_string()))?;

        let resp = self
            .client
            .put(self.endpoint(route))
            .header(AUTHORIZATION, authorization)
            .json(payload)
            .send()
            .await
            .map_err(|e| RegistrationError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RegistrationError::Rejected {
                status: status.as_u16(),
                message: Self::describe_rejection(status, &body),
            });
        }

        let commands: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| RegistrationError::Transport(e.to_string()))?;
        Ok(commands.len())
    }
}
