//! Resend HTTP API provider.

use super::{EmailProvider, Sender};
use crate::error::{MailerError, MailerResult};
use crate::models::{redact_email, OutgoingMessage, SentEmail};
use async_trait::async_trait;
use core_config::{env_optional, env_or_default, ConfigError, FromEnv};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Resend API configuration.
#[derive(Clone)]
pub struct ResendConfig {
    /// API key; without one the provider reports itself not ready.
    pub api_key: Option<String>,
    /// API base URL (defaults to production).
    pub api_url: String,
    pub timeout: Duration,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// First characters of the key, for logs.
    pub fn key_hint(&self) -> Option<String> {
        self.api_key
            .as_ref()
            .map(|key| format!("{}...", key.chars().take(6).collect::<String>()))
    }
}

impl Default for ResendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_RESEND_API_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl fmt::Debug for ResendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResendConfig")
            .field("api_key", &self.key_hint())
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FromEnv for ResendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_optional("RESEND_API_KEY"),
            api_url: env_or_default("RESEND_API_URL", DEFAULT_RESEND_API_URL),
            timeout: REQUEST_TIMEOUT,
        })
    }
}

/// Resend email provider. The HTTP client is built once and reused.
pub struct ResendProvider {
    config: ResendConfig,
    sender: Sender,
    client: Client,
}

impl ResendProvider {
    pub fn new(config: ResendConfig, sender: Sender) -> MailerResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        if let Some(hint) = config.key_hint() {
            debug!(api_key = %hint, "Initialized Resend client");
        }
        Ok(Self {
            config,
            sender,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.config.api_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResendErrorBody {
    name: Option<String>,
    message: Option<String>,
}

#[async_trait]
impl EmailProvider for ResendProvider {
    async fn send(&self, message: &OutgoingMessage) -> MailerResult<SentEmail> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            MailerError::ConfigurationMissing("RESEND_API_KEY is not set".to_string())
        })?;

        let request = ResendRequest {
            from: self.sender.mailbox(),
            to: [message.to()],
            subject: message.subject(),
            html: message.html(),
            text: message.text(),
        };

        debug!(
            to = %redact_email(message.to()),
            subject = %message.subject(),
            "Sending email via Resend"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            // A 2xx is a send even when the body is unreadable.
            let message_id = match response.text().await {
                Ok(body) => match serde_json::from_str::<ResendResponse>(&body) {
                    Ok(parsed) => parsed.id,
                    Err(e) => {
                        warn!(status = %status, error = %e, "Unreadable Resend response body");
                        None
                    }
                },
                Err(e) => {
                    warn!(status = %status, error = %e, "Failed to read Resend response body");
                    None
                }
            };
            info!(
                to = %redact_email(message.to()),
                message_id = ?message_id,
                "Email sent successfully via Resend"
            );
            return Ok(SentEmail {
                provider: self.name(),
                message_id,
            });
        }

        let error_body = response.text().await.unwrap_or_default();
        let error_message = match serde_json::from_str::<ResendErrorBody>(&error_body) {
            Ok(ResendErrorBody {
                name: Some(name),
                message: Some(message),
            }) => format!("{}: {}", name, message),
            Ok(ResendErrorBody {
                message: Some(message),
                ..
            }) => message,
            _ => error_body,
        };

        error!(
            to = %redact_email(message.to()),
            status = %status,
            error = %error_message,
            "Resend rejected the email"
        );

        Err(MailerError::ProviderRejected {
            provider: self.name(),
            status: status.as_u16(),
            message: error_message,
        })
    }

    fn name(&self) -> &'static str {
        "Resend"
    }

    fn is_ready(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Resend has no handshake; a configured key is as good as it gets
    /// without spending a send.
    async fn verify_connection(&self) -> MailerResult<bool> {
        if self.is_ready() {
            info!("Resend API key configured, connection ready");
            Ok(true)
        } else {
            Err(MailerError::ConfigurationMissing(
                "RESEND_API_KEY is not set".to_string(),
            ))
        }
    }
}
