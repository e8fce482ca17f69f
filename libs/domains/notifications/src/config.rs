//! Process-wide mailer configuration.

use crate::geo::GeoConfig;
use crate::providers::{ResendConfig, Sender, SmtpConfig};
use core_config::{env_first, env_or_default, ConfigError, FromEnv};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_FROM_EMAIL: &str = "noreply@tomoacademy.site";
pub const DEFAULT_FROM_NAME: &str = "TOMO";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Which provider the deployment asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Smtp,
    Resend,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smtp" => Ok(ProviderKind::Smtp),
            "resend" | "api" | "api-based" => Ok(ProviderKind::Resend),
            other => Err(format!(
                "unknown email provider '{}', expected 'smtp' or 'resend'",
                other
            )),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Smtp => write!(f, "smtp"),
            ProviderKind::Resend => write!(f, "resend"),
        }
    }
}

/// Everything the mailer reads from the environment, loaded once at startup.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub provider: ProviderKind,
    pub from_email: String,
    pub from_name: String,
    /// Public base URL used for links (no trailing slash).
    pub base_url: String,
    pub resend: ResendConfig,
    pub smtp: SmtpConfig,
    pub geo: GeoConfig,
    /// Google Static Maps key for the login map; the map is keyless otherwise.
    pub maps_api_key: Option<String>,
}

impl MailerConfig {
    /// Configuration with defaults everywhere: SMTP provider, placeholder transport.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Smtp,
            from_email: DEFAULT_FROM_EMAIL.to_string(),
            from_name: DEFAULT_FROM_NAME.to_string(),
            base_url: normalize_base_url(&base_url.into()),
            resend: ResendConfig::default(),
            smtp: SmtpConfig::default(),
            geo: GeoConfig::default(),
            maps_api_key: None,
        }
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_resend(mut self, resend: ResendConfig) -> Self {
        self.resend = resend;
        self
    }

    pub fn with_smtp(mut self, smtp: SmtpConfig) -> Self {
        self.smtp = smtp;
        self
    }

    pub fn with_geo(mut self, geo: GeoConfig) -> Self {
        self.geo = geo;
        self
    }

    pub fn with_sender(mut self, from_email: impl Into<String>, from_name: impl Into<String>) -> Self {
        self.from_email = from_email.into();
        self.from_name = from_name.into();
        self
    }

    /// Sender identity shared by every provider.
    pub fn sender(&self) -> Sender {
        Sender::new(&self.from_email, &self.from_name)
    }

    /// Report of the effective settings plus common misconfigurations.
    ///
    /// Secrets are only ever reported as `SET` / `NOT SET`.
    pub fn diagnose(&self) -> ConfigReport {
        let mut settings = BTreeMap::new();
        settings.insert("EMAIL_PROVIDER", self.provider.to_string());
        settings.insert("RESEND_API_KEY", presence(self.resend.api_key.is_some()));
        settings.insert("EMAIL_FROM", self.from_email.clone());
        settings.insert("EMAIL_FROM_NAME", self.from_name.clone());
        settings.insert("APP_BASE_URL", self.base_url.clone());
        settings.insert("SMTP_HOST", self.smtp.host.clone());
        settings.insert("SMTP_PORT", self.smtp.port.to_string());
        settings.insert("SMTP_SECURE", self.smtp.secure.to_string());
        settings.insert("SMTP_USER", presence(self.smtp.username.is_some()));
        settings.insert("SMTP_PASS", presence(self.smtp.password.is_some()));
        settings.insert("GEO_LOOKUP_URL", self.geo.endpoint.clone());
        settings.insert("GOOGLE_MAPS_API_KEY", presence(self.maps_api_key.is_some()));

        let mut report = ConfigReport {
            provider: self.provider,
            settings,
            issues: Vec::new(),
            recommendations: Vec::new(),
        };

        if self.provider == ProviderKind::Resend && self.resend.api_key.is_none() {
            report.push(
                "EMAIL_PROVIDER is resend but RESEND_API_KEY is not set; sends fall back to SMTP",
                "Set RESEND_API_KEY",
            );
        }

        let smtp_active = self.provider == ProviderKind::Smtp || self.resend.api_key.is_none();
        if smtp_active && !self.smtp.has_credentials() {
            report.push(
                "SMTP is the active provider but SMTP credentials are not configured; messages are discarded",
                "Either set EMAIL_PROVIDER=resend with RESEND_API_KEY, or set SMTP_USER and SMTP_PASS",
            );
        }

        if self.base_url == DEFAULT_BASE_URL {
            report.push(
                "Base URL is not set; email links point at localhost",
                "Set APP_BASE_URL to the public URL of the application",
            );
        }

        if self.from_email == DEFAULT_FROM_EMAIL {
            report.push(
                "EMAIL_FROM not set; using the default sender address",
                "Set EMAIL_FROM to a verified sender address",
            );
        }

        report
    }
}

impl FromEnv for MailerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let provider = match core_config::env_optional("EMAIL_PROVIDER") {
            Some(raw) => raw.parse().map_err(|details| ConfigError::ParseError {
                key: "EMAIL_PROVIDER".to_string(),
                details,
            })?,
            None => ProviderKind::Smtp,
        };

        let base_url = env_first(&["APP_BASE_URL", "BETTER_AUTH_URL", "NEXT_PUBLIC_BASE_URL"])
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            provider,
            from_email: env_or_default("EMAIL_FROM", DEFAULT_FROM_EMAIL),
            from_name: env_or_default("EMAIL_FROM_NAME", DEFAULT_FROM_NAME),
            base_url: normalize_base_url(&base_url),
            resend: ResendConfig::from_env()?,
            smtp: SmtpConfig::from_env()?,
            geo: GeoConfig::from_env()?,
            maps_api_key: core_config::env_optional("GOOGLE_MAPS_API_KEY"),
        })
    }
}

/// Result of [`MailerConfig::diagnose`].
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    pub provider: ProviderKind,
    pub settings: BTreeMap<&'static str, String>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl ConfigReport {
    fn push(&mut self, issue: &str, recommendation: &str) {
        self.issues.push(issue.to_string());
        self.recommendations.push(recommendation.to_string());
    }

    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

fn presence(set: bool) -> String {
    let label = if set { "SET" } else { "NOT SET" };
    label.to_string()
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
