//! Email provider implementations.
//!
//! Every transport implements [`EmailProvider`]. The [`ProviderChain`]
//! holds them in priority order and picks the first one that is ready.

mod chain;
mod recording;
mod resend;
mod smtp;

pub use chain::ProviderChain;
pub use recording::RecordingProvider;
pub use resend::{ResendConfig, ResendProvider};
pub use smtp::{SmtpConfig, SmtpProvider};

use crate::error::MailerResult;
use crate::models::{OutgoingMessage, SentEmail};
use async_trait::async_trait;

/// The `From` identity used by every provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub email: String,
    pub name: String,
}

impl Sender {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }

    /// `Name <address>`, or the bare address when no name is set.
    pub fn mailbox(&self) -> String {
        if self.name.trim().is_empty() {
            self.email.clone()
        } else {
            format!("{} <{}>", self.name, self.email)
        }
    }

    /// Domain part of the address, used for generated Message-IDs.
    pub fn domain(&self) -> &str {
        self.email
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or("localhost")
    }
}

/// Trait for email sending providers.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Deliver one message. A single attempt; no retries.
    async fn send(&self, message: &OutgoingMessage) -> MailerResult<SentEmail>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;

    /// Whether the provider has what it needs to attempt a send.
    ///
    /// Providers that are not ready are skipped by the [`ProviderChain`].
    fn is_ready(&self) -> bool {
        true
    }

    /// Health check: `Ok(true)` when the provider can accept mail.
    async fn verify_connection(&self) -> MailerResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_mailbox() {
        assert_eq!(
            Sender::new("noreply@example.com", "TOMO").mailbox(),
            "TOMO <noreply@example.com>"
        );
        assert_eq!(
            Sender::new("noreply@example.com", "").mailbox(),
            "noreply@example.com"
        );
    }

    #[test]
    fn test_sender_domain() {
        assert_eq!(Sender::new("noreply@example.com", "").domain(), "example.com");
        assert_eq!(Sender::new("broken", "").domain(), "localhost");
    }
}
