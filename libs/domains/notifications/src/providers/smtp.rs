//! SMTP email provider implementation using lettre.
//!
//! Without credentials the provider swaps in a placeholder transport that
//! accepts and discards every message, so development setups never fail
//! to start.

use super::{EmailProvider, Sender};
use crate::error::{MailerError, MailerResult};
use crate::models::{redact_email, OutgoingMessage, SentEmail};
use async_trait::async_trait;
use core_config::{env_flag, env_optional, env_or_default, env_parse, ConfigError, FromEnv};
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::{smtp::authentication::Credentials, stub::AsyncStubTransport},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_SMTP_HOST: &str = "smtp.ethereal.email";
pub const DEFAULT_SMTP_PORT: u16 = 587;
const SMTP_TIMEOUT: Duration = Duration::from_secs(20);

/// SMTP configuration.
#[derive(Clone)]
pub struct SmtpConfig {
    /// SMTP server host.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Implicit TLS (usually port 465). STARTTLS otherwise.
    pub secure: bool,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Both user and password are set.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    fn is_local(&self) -> bool {
        matches!(self.host.as_str(), "localhost" | "127.0.0.1" | "::1")
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SMTP_HOST.to_string(),
            port: DEFAULT_SMTP_PORT,
            secure: false,
            username: None,
            password: None,
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl FromEnv for SmtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or_default("SMTP_HOST", DEFAULT_SMTP_HOST),
            port: env_parse("SMTP_PORT", DEFAULT_SMTP_PORT)?,
            secure: env_flag("SMTP_SECURE", false),
            username: env_optional("SMTP_USER"),
            password: env_optional("SMTP_PASS"),
        })
    }
}

enum Transport {
    Relay(AsyncSmtpTransport<Tokio1Executor>),
    Placeholder(AsyncStubTransport),
}

/// SMTP email provider. Always ready: it is the last resort of the chain.
pub struct SmtpProvider {
    transport: Transport,
    config: SmtpConfig,
    sender: Sender,
}

impl SmtpProvider {
    /// Create a new SMTP provider. The transport is built once here.
    pub fn new(config: SmtpConfig, sender: Sender) -> MailerResult<Self> {
        let transport = Self::build_transport(&config)?;
        Ok(Self {
            transport,
            config,
            sender,
        })
    }

    /// Whether sends are discarded by the placeholder transport.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.transport, Transport::Placeholder(_))
    }

    fn build_transport(config: &SmtpConfig) -> MailerResult<Transport> {
        let (Some(username), Some(password)) = (&config.username, &config.password) else {
            warn!(
                host = %config.host,
                "SMTP credentials not configured, using placeholder transport; emails will not be delivered"
            );
            return Ok(Transport::Placeholder(AsyncStubTransport::new_ok()));
        };

        let builder = if config.is_local() {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        } else if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(username.clone(), password.clone()))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        debug!(
            host = %config.host,
            port = config.port,
            secure = config.secure,
            "SMTP transport configured"
        );

        Ok(Transport::Relay(transport))
    }

    /// Build a `multipart/alternative` lettre message with a generated Message-ID.
    fn build_message(&self, message: &OutgoingMessage) -> MailerResult<(Message, String)> {
        let from: Mailbox = self.sender.mailbox().parse()?;
        let to: Mailbox = message.to().parse()?;
        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.sender.domain());

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject())
            .message_id(Some(message_id.clone()))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text().to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html().to_string()),
                    ),
            )?;

        Ok((email, message_id))
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, message: &OutgoingMessage) -> MailerResult<SentEmail> {
        let (email, message_id) = self.build_message(message)?;

        debug!(
            to = %redact_email(message.to()),
            subject = %message.subject(),
            host = %self.config.host,
            port = self.config.port,
            "Sending email via SMTP"
        );

        let message_id = match &self.transport {
            Transport::Relay(transport) => {
                transport.send(email).await.map_err(|e| {
                    error!(
                        to = %redact_email(message.to()),
                        error = %e,
                        "Failed to send email via SMTP"
                    );
                    MailerError::from(e)
                })?;
                message_id
            }
            Transport::Placeholder(transport) => {
                transport
                    .send(email)
                    .await
                    .map_err(|e| MailerError::NetworkFailure(e.to_string()))?;
                warn!(
                    to = %redact_email(message.to()),
                    "SMTP placeholder transport discarded the email"
                );
                format!("placeholder-{}", Uuid::new_v4())
            }
        };

        info!(
            to = %redact_email(message.to()),
            message_id = %message_id,
            "Email sent successfully via SMTP"
        );

        Ok(SentEmail {
            provider: self.name(),
            message_id: Some(message_id),
        })
    }

    fn name(&self) -> &'static str {
        "SMTP"
    }

    async fn verify_connection(&self) -> MailerResult<bool> {
        match &self.transport {
            Transport::Relay(transport) => {
                let connected = transport.test_connection().await?;
                info!(host = %self.config.host, connected, "SMTP connection verified");
                Ok(connected)
            }
            Transport::Placeholder(_) => {
                warn!("SMTP placeholder transport in use, nothing to verify");
                Ok(false)
            }
        }
    }
}
