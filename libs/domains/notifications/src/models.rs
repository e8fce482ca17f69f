//! Value objects passed between the use-cases, templates and providers.

use crate::error::{MailerError, MailerResult};
use crate::templates::strip_html;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static EMAIL_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Check that `email` looks like an address (`local@domain.tld`).
pub fn validate_email_address(email: &str) -> MailerResult<()> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(MailerError::InvalidEmail("recipient is empty".to_string()));
    }
    if !EMAIL_ADDRESS.is_match(trimmed) {
        return Err(MailerError::InvalidEmail(redact_email(trimmed)));
    }
    Ok(())
}

/// Mask the local part of an address for logging: `jane@example.com` -> `j***@example.com`.
pub fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}

/// The five kinds of email the mailer knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    VerifyEmail,
    Welcome,
    PasswordReset,
    LoginNotification,
    EmailChangeVerification,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 5] = [
        TemplateKind::VerifyEmail,
        TemplateKind::Welcome,
        TemplateKind::PasswordReset,
        TemplateKind::LoginNotification,
        TemplateKind::EmailChangeVerification,
    ];

    /// Handlebars template name.
    pub fn template_name(&self) -> &'static str {
        match self {
            TemplateKind::VerifyEmail => "verify_email",
            TemplateKind::Welcome => "welcome",
            TemplateKind::PasswordReset => "password_reset",
            TemplateKind::LoginNotification => "login_notification",
            TemplateKind::EmailChangeVerification => "email_change_verification",
        }
    }

    /// Fixed subject line.
    pub fn subject(&self) -> &'static str {
        match self {
            TemplateKind::VerifyEmail => "Verify your email address",
            TemplateKind::Welcome => "Welcome! Your account is ready",
            TemplateKind::PasswordReset => "Reset your password",
            TemplateKind::LoginNotification => "New login to your account",
            TemplateKind::EmailChangeVerification => "Verify your new email address",
        }
    }

    /// Heading shown in the branded header.
    pub fn title(&self) -> &'static str {
        match self {
            TemplateKind::VerifyEmail => "📧 Verify Your Email",
            TemplateKind::Welcome => "🎉 Welcome Aboard!",
            TemplateKind::PasswordReset => "🔑 Reset Your Password",
            TemplateKind::LoginNotification => "🔐 New Login Detected",
            TemplateKind::EmailChangeVerification => "Verify Email Change",
        }
    }

    /// Path a bare token is appended to, for kinds that carry an action link.
    pub fn link_path(&self) -> Option<&'static str> {
        match self {
            TemplateKind::VerifyEmail => Some("/api/auth/verify-email"),
            TemplateKind::PasswordReset => Some("/reset-password"),
            TemplateKind::EmailChangeVerification => Some("/api/auth/verify-email-change"),
            TemplateKind::Welcome | TemplateKind::LoginNotification => None,
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemplateKind::VerifyEmail => "verify-email",
            TemplateKind::Welcome => "welcome",
            TemplateKind::PasswordReset => "password-reset",
            TemplateKind::LoginNotification => "login-notification",
            TemplateKind::EmailChangeVerification => "email-change-verification",
        };
        write!(f, "{}", name)
    }
}

/// Caller-facing input for a raw send.
#[derive(Debug, Clone, Default)]
pub struct EmailOptions {
    pub to: String,
    pub subject: String,
    pub html: String,
    /// Plain-text body; derived from `html` when absent.
    pub text: Option<String>,
}

impl EmailOptions {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// A validated message, ready for a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    to: String,
    subject: String,
    html: String,
    text: String,
}

impl OutgoingMessage {
    pub fn new(options: EmailOptions) -> MailerResult<Self> {
        validate_email_address(&options.to)?;
        if options.subject.trim().is_empty() {
            return Err(MailerError::TemplateInputInvalid(
                "subject must not be empty".to_string(),
            ));
        }

        let text = match options.text {
            Some(text) if !text.trim().is_empty() => text,
            _ => strip_html(&options.html),
        };

        Ok(Self {
            to: options.to.trim().to_string(),
            subject: options.subject,
            html: options.html,
            text,
        })
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Outcome of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    /// Name of the provider that accepted the message.
    pub provider: &'static str,
    /// Provider-specific message ID for tracking.
    pub message_id: Option<String>,
}

/// Details about the login that triggered a notification.
#[derive(Debug, Clone, Default)]
pub struct LoginContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Caller's own idea of the location, used when geo lookup finds nothing.
    pub location: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub user_image: Option<String>,
}

impl LoginContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_user_image(mut self, url: impl Into<String>) -> Self {
        self.user_image = Some(url.into());
        self
    }
}

/// Approximate location of an IP address. Every field is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoResult {
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.country.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }

    /// "City, Country", or whichever half is known.
    pub fn formatted_location(&self) -> Option<String> {
        match (self.city.as_deref(), self.country.as_deref()) {
            (Some(city), Some(country)) => Some(format!("{}, {}", city, country)),
            (Some(only), None) | (None, Some(only)) => Some(only.to_string()),
            (None, None) => None,
        }
    }

    /// Both coordinates, when known.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}
