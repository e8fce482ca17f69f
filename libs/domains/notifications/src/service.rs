//! The mailer facade.
//!
//! [`MailerService`] owns the provider chain, the template engine and the
//! geo locator. Build it once at startup and share it behind an `Arc`.

use crate::config::MailerConfig;
use crate::error::MailerResult;
use crate::geo::{GeoLocator, IpApiLocator, NoopLocator};
use crate::models::{redact_email, EmailOptions, OutgoingMessage, SentEmail};
use crate::providers::ProviderChain;
use crate::templates::{TemplateEngine, TemplateParams};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Transactional mailer: one validated message, one provider, one attempt.
#[derive(Clone)]
pub struct MailerService {
    pub(crate) config: MailerConfig,
    pub(crate) chain: ProviderChain,
    pub(crate) templates: TemplateEngine,
    pub(crate) geo: Arc<dyn GeoLocator>,
}

impl MailerService {
    pub fn new(
        config: MailerConfig,
        chain: ProviderChain,
        templates: TemplateEngine,
        geo: Arc<dyn GeoLocator>,
    ) -> Self {
        Self {
            config,
            chain,
            templates,
            geo,
        }
    }

    /// Build the providers, templates and geo locator described by `config`.
    pub fn from_config(config: MailerConfig) -> MailerResult<Self> {
        let chain = ProviderChain::from_config(&config)?;
        let templates = TemplateEngine::new()?;
        let geo: Arc<dyn GeoLocator> = if config.geo.enabled {
            Arc::new(IpApiLocator::new(&config.geo)?)
        } else {
            Arc::new(NoopLocator)
        };

        info!(
            provider = %config.provider,
            chain = ?chain.names(),
            active = active_name(&chain),
            "Mailer initialized"
        );

        Ok(Self::new(config, chain, templates, geo))
    }

    pub fn config(&self) -> &MailerConfig {
        &self.config
    }

    /// Name of the provider the next send would use.
    pub fn active_provider(&self) -> Option<&'static str> {
        self.chain.select().ok().map(|p| p.name())
    }

    /// Validate, pick the active provider, send once.
    pub async fn try_send_email(&self, options: EmailOptions) -> MailerResult<SentEmail> {
        let message = OutgoingMessage::new(options)?;
        self.deliver(&message).await
    }

    /// [`MailerService::try_send_email`], reduced to success or failure.
    pub async fn send_email(&self, options: EmailOptions) -> bool {
        let to = options.to.clone();
        let result = self.try_send_email(options).await;
        self.succeeded("custom", &to, result)
    }

    /// Check that the active provider can accept mail.
    pub async fn try_test_email_connection(&self) -> MailerResult<bool> {
        let provider = self.chain.select()?;
        info!(provider = provider.name(), "Testing email connection");
        provider.verify_connection().await
    }

    pub async fn test_email_connection(&self) -> bool {
        match self.try_test_email_connection().await {
            Ok(true) => true,
            Ok(false) => {
                warn!(
                    provider = active_name(&self.chain),
                    "Email connection test did not confirm delivery"
                );
                false
            }
            Err(e) => {
                error!(
                    provider = active_name(&self.chain),
                    reason = e.reason(),
                    error = %e,
                    "Email connection test failed"
                );
                false
            }
        }
    }

    pub(crate) fn template_params(&self) -> TemplateParams {
        TemplateParams::new(&self.config.base_url, &self.config.from_name)
    }

    pub(crate) async fn deliver(&self, message: &OutgoingMessage) -> MailerResult<SentEmail> {
        let provider = self.chain.select()?;

        info!(
            provider = provider.name(),
            to = %redact_email(message.to()),
            subject = %message.subject(),
            "Sending email"
        );

        let sent = provider.send(message).await?;

        info!(
            provider = sent.provider,
            to = %redact_email(message.to()),
            message_id = ?sent.message_id,
            "Email delivered"
        );

        Ok(sent)
    }

    /// Log the outcome of a `try_*` call and collapse it to a flag.
    pub(crate) fn succeeded(&self, kind: &str, to: &str, result: MailerResult<SentEmail>) -> bool {
        match result {
            Ok(_) => true,
            Err(e) => {
                error!(
                    kind,
                    provider = active_name(&self.chain),
                    to = %redact_email(to),
                    reason = e.reason(),
                    error = %e,
                    "Failed to send email"
                );
                false
            }
        }
    }
}

fn active_name(chain: &ProviderChain) -> &'static str {
    chain.select().map(|p| p.name()).unwrap_or("none")
}
