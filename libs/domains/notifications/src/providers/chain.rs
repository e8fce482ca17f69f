//! Priority-ordered provider selection.

use super::{EmailProvider, ResendProvider, SmtpProvider};
use crate::config::{MailerConfig, ProviderKind};
use crate::error::{MailerError, MailerResult};
use std::sync::Arc;
use tracing::debug;

/// Providers in priority order. The first ready one handles a send.
///
/// Built from config the chain is `[Resend, SMTP]` or `[SMTP]`. SMTP is
/// always ready, so it catches everything Resend cannot take.
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn EmailProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider with lower priority than the ones already added.
    pub fn with_provider(mut self, provider: Arc<dyn EmailProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn from_config(config: &MailerConfig) -> MailerResult<Self> {
        let sender = config.sender();
        let mut chain = Self::new();

        if config.provider == ProviderKind::Resend {
            let resend = ResendProvider::new(config.resend.clone(), sender.clone())?;
            chain = chain.with_provider(Arc::new(resend));
        }

        let smtp = SmtpProvider::new(config.smtp.clone(), sender)?;
        Ok(chain.with_provider(Arc::new(smtp)))
    }

    /// The provider the next send goes to.
    pub fn select(&self) -> MailerResult<Arc<dyn EmailProvider>> {
        for provider in &self.providers {
            if provider.is_ready() {
                return Ok(Arc::clone(provider));
            }
            debug!(provider = provider.name(), "Provider not ready, trying next");
        }
        Err(MailerError::ConfigurationMissing(
            "no email provider is ready".to_string(),
        ))
    }

    /// Provider names in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
