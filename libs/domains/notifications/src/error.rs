//! Error types for the mailer.

use thiserror::Error;

/// Result type for mailer operations.
pub type MailerResult<T> = Result<T, MailerError>;

/// Why a send (or a connection test) did not succeed.
#[derive(Debug, Error)]
pub enum MailerError {
    /// A provider is missing the settings it needs (API key, credentials).
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// The provider answered, but refused the message.
    #[error("{provider} rejected the message ({status}): {message}")]
    ProviderRejected {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// Timeout, refused connection, TLS failure and the like.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Malformed token or URL handed to a template.
    #[error("Invalid template input: {0}")]
    TemplateInputInvalid(String),

    /// Recipient address is empty or not an address.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Handlebars registration or rendering failed.
    #[error("Template rendering error: {0}")]
    TemplateError(String),
}

impl MailerError {
    /// Stable short code, used in logs and CLI summaries.
    pub fn reason(&self) -> &'static str {
        match self {
            MailerError::ConfigurationMissing(_) => "configuration_missing",
            MailerError::ProviderRejected { .. } => "provider_rejected",
            MailerError::NetworkFailure(_) => "network_failure",
            MailerError::TemplateInputInvalid(_) => "template_input_invalid",
            MailerError::InvalidEmail(_) => "invalid_email",
            MailerError::TemplateError(_) => "template_error",
        }
    }
}

impl From<reqwest::Error> for MailerError {
    fn from(err: reqwest::Error) -> Self {
        MailerError::NetworkFailure(err.to_string())
    }
}

impl From<handlebars::RenderError> for MailerError {
    fn from(err: handlebars::RenderError) -> Self {
        MailerError::TemplateError(err.to_string())
    }
}

impl From<handlebars::TemplateError> for MailerError {
    fn from(err: handlebars::TemplateError) -> Self {
        MailerError::TemplateError(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for MailerError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        if err.is_permanent() || err.is_transient() {
            let status = err
                .status()
                .and_then(|code| code.to_string().parse().ok())
                .unwrap_or_default();
            MailerError::ProviderRejected {
                provider: "SMTP",
                status,
                message: err.to_string(),
            }
        } else {
            MailerError::NetworkFailure(err.to_string())
        }
    }
}

impl From<lettre::error::Error> for MailerError {
    fn from(err: lettre::error::Error) -> Self {
        MailerError::TemplateInputInvalid(format!("Failed to build message: {}", err))
    }
}

impl From<lettre::address::AddressError> for MailerError {
    fn from(err: lettre::address::AddressError) -> Self {
        MailerError::InvalidEmail(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_distinct() {
        let errors = [
            MailerError::ConfigurationMissing("key".into()),
            MailerError::ProviderRejected {
                provider: "Resend",
                status: 422,
                message: "bad".into(),
            },
            MailerError::NetworkFailure("timeout".into()),
            MailerError::TemplateInputInvalid("token".into()),
            MailerError::InvalidEmail("nope".into()),
            MailerError::TemplateError("render".into()),
        ];
        let mut reasons: Vec<_> = errors.iter().map(MailerError::reason).collect();
        reasons.sort_unstable();
        reasons.dedup();
        assert_eq!(reasons.len(), errors.len());
    }

    #[test]
    fn test_provider_rejected_display() {
        let err = MailerError::ProviderRejected {
            provider: "Resend",
            status: 403,
            message: "domain not verified".into(),
        };
        assert_eq!(
            err.to_string(),
            "Resend rejected the message (403): domain not verified"
        );
    }
}
