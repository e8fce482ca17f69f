//! Use-cases: one method pair per email kind.
//!
//! Every use-case runs validate, resolve (link or geo), render, deliver.
//! Rendering finishes before anything is handed to a provider, so a
//! failure never leaves a half-built message behind.

use crate::error::MailerResult;
use crate::geo::{client_ip, is_routable};
use crate::models::{validate_email_address, EmailOptions, GeoResult, LoginContext, OutgoingMessage, SentEmail, TemplateKind};
use crate::service::MailerService;
use crate::templates::{resolve_action_url, LoginDetails, TemplateParams};
use tracing::{debug, info};

impl MailerService {
    pub async fn try_send_verification_email(
        &self,
        email: &str,
        token_or_url: &str,
        user_name: Option<&str>,
        user_image: Option<&str>,
    ) -> MailerResult<SentEmail> {
        validate_email_address(email)?;
        let url = resolve_action_url(&self.config.base_url, TemplateKind::VerifyEmail, token_or_url)?;
        let params = self
            .template_params()
            .with_user(user_name, user_image)
            .with_action_url(url);
        self.render_and_deliver(email, TemplateKind::VerifyEmail, &params).await
    }

    /// Email verification link for a new account.
    pub async fn send_verification_email(
        &self,
        email: &str,
        token_or_url: &str,
        user_name: Option<&str>,
        user_image: Option<&str>,
    ) -> bool {
        let result = self
            .try_send_verification_email(email, token_or_url, user_name, user_image)
            .await;
        self.succeeded("verify-email", email, result)
    }

    pub async fn try_send_welcome_email(
        &self,
        email: &str,
        user_name: Option<&str>,
        user_image: Option<&str>,
    ) -> MailerResult<SentEmail> {
        validate_email_address(email)?;
        let params = self.template_params().with_user(user_name, user_image);
        self.render_and_deliver(email, TemplateKind::Welcome, &params).await
    }

    /// Sent once the address is verified. Links to the dashboard.
    pub async fn send_welcome_email(&self, email: &str, user_name: Option<&str>, user_image: Option<&str>) -> bool {
        let result = self.try_send_welcome_email(email, user_name, user_image).await;
        self.succeeded("welcome", email, result)
    }

    pub async fn try_send_password_reset_email(
        &self,
        email: &str,
        token_or_url: &str,
        user_name: Option<&str>,
        user_image: Option<&str>,
    ) -> MailerResult<SentEmail> {
        validate_email_address(email)?;
        let url = resolve_action_url(&self.config.base_url, TemplateKind::PasswordReset, token_or_url)?;
        let params = self
            .template_params()
            .with_user(user_name, user_image)
            .with_action_url(url);
        self.render_and_deliver(email, TemplateKind::PasswordReset, &params).await
    }

    pub async fn send_password_reset_email(
        &self,
        email: &str,
        token_or_url: &str,
        user_name: Option<&str>,
        user_image: Option<&str>,
    ) -> bool {
        let result = self
            .try_send_password_reset_email(email, token_or_url, user_name, user_image)
            .await;
        self.succeeded("password-reset", email, result)
    }

    /// New-login alert. The geo lookup is best-effort and never blocks the send.
    pub async fn try_send_login_notification_email(
        &self,
        email: &str,
        user_name: Option<&str>,
        context: &LoginContext,
    ) -> MailerResult<SentEmail> {
        validate_email_address(email)?;
        let geo = self.locate(context.ip_address.as_deref()).await;
        let login = LoginDetails::from_context(context, &geo, self.config.maps_api_key.as_deref());
        let params = self
            .template_params()
            .with_user(user_name, context.user_image.as_deref())
            .with_login(login);
        self.render_and_deliver(email, TemplateKind::LoginNotification, &params).await
    }

    pub async fn send_login_notification_email(
        &self,
        email: &str,
        user_name: Option<&str>,
        context: &LoginContext,
    ) -> bool {
        let result = self
            .try_send_login_notification_email(email, user_name, context)
            .await;
        self.succeeded("login-notification", email, result)
    }

    pub async fn try_send_email_change_verification(
        &self,
        new_email: &str,
        token_or_url: &str,
        user_name: Option<&str>,
    ) -> MailerResult<SentEmail> {
        validate_email_address(new_email)?;
        let url = resolve_action_url(
            &self.config.base_url,
            TemplateKind::EmailChangeVerification,
            token_or_url,
        )?;
        let params = self
            .template_params()
            .with_user(user_name, None)
            .with_action_url(url);
        self.render_and_deliver(new_email, TemplateKind::EmailChangeVerification, &params)
            .await
    }

    /// Confirmation link sent to the new address of an email change.
    pub async fn send_email_change_verification(
        &self,
        new_email: &str,
        token_or_url: &str,
        user_name: Option<&str>,
    ) -> bool {
        let result = self
            .try_send_email_change_verification(new_email, token_or_url, user_name)
            .await;
        self.succeeded("email-change-verification", new_email, result)
    }

    async fn locate(&self, ip_address: Option<&str>) -> GeoResult {
        let Some(raw) = ip_address else {
            return GeoResult::default();
        };
        if !is_routable(raw) {
            debug!(ip = %raw, "Skipping geo lookup for non-routable address");
            return GeoResult::default();
        }
        match client_ip(raw) {
            Some(ip) => self.geo.lookup(&ip.to_string()).await,
            None => GeoResult::default(),
        }
    }

    async fn render_and_deliver(
        &self,
        to: &str,
        kind: TemplateKind,
        params: &TemplateParams,
    ) -> MailerResult<SentEmail> {
        let rendered = self.templates.render(kind, params)?;
        let message = OutgoingMessage::new(
            EmailOptions::new(to, rendered.subject, rendered.html).with_text(rendered.text),
        )?;

        info!(kind = %kind, "Rendered email");
        self.deliver(&message).await
    }
}

#[cfg(test)]
mod tests {
    use crate::config::MailerConfig;
    use crate::error::MailerError;
    use crate::geo::{MockGeoLocator, NoopLocator};
    use crate::models::{GeoResult, LoginContext};
    use crate::providers::{ProviderChain, RecordingProvider};
    use crate::service::MailerService;
    use crate::templates::TemplateEngine;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    const BASE_URL: &str = "https://chat.example.com";

    fn service(provider: &RecordingProvider, geo: Arc<dyn crate::geo::GeoLocator>) -> MailerService {
        MailerService::new(
            MailerConfig::new(BASE_URL),
            ProviderChain::new().with_provider(Arc::new(provider.clone())),
            TemplateEngine::new().unwrap(),
            geo,
        )
    }

    fn mountain_view() -> GeoResult {
        GeoResult {
            city: Some("Mountain View".to_string()),
            country: Some("United States".to_string()),
            latitude: Some(37.386),
            longitude: Some(-122.0838),
        }
    }

    #[tokio::test]
    async fn test_verification_email_with_token() {
        let provider = RecordingProvider::new("Recorder");
        let mailer = service(&provider, Arc::new(NoopLocator));

        assert!(
            mailer
                .send_verification_email("jane@example.com", "abc123", Some("Jane"), None)
                .await
        );

        let sent = provider.sent_messages().await;
        assert_eq!(sent[0].subject(), "Verify your email address");
        assert!(sent[0]
            .text()
            .contains("https://chat.example.com/api/auth/verify-email?token=abc123"));
        assert!(sent[0].text().contains("Welcome, Jane!"));
    }

    #[tokio::test]
    async fn test_verification_email_with_full_url() {
        let provider = RecordingProvider::new("Recorder");
        let mailer = service(&provider, Arc::new(NoopLocator));
        let url = "https://auth.example.com/verify?token=xyz&callbackURL=/";

        mailer
            .try_send_verification_email("jane@example.com", url, None, None)
            .await
            .unwrap();

        let sent = provider.sent_messages().await;
        assert!(sent[0]
            .html()
            .contains("https://auth.example.com/verify?token&#x3D;xyz&amp;callbackURL&#x3D;/"));
        assert!(sent[0].text().contains(url));
    }

    #[tokio::test]
    async fn test_bad_token_fails_before_delivery() {
        let provider = RecordingProvider::new("Recorder");
        let mailer = service(&provider, Arc::new(NoopLocator));

        let result = mailer
            .try_send_password_reset_email("jane@example.com", "abc 123/../", None, None)
            .await;
        assert!(matches!(result, Err(MailerError::TemplateInputInvalid(_))));
        assert_eq!(provider.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_welcome_and_reset() {
        let provider = RecordingProvider::new("Recorder");
        let mailer = service(&provider, Arc::new(NoopLocator));

        assert!(mailer.send_welcome_email("jane@example.com", None, None).await);
        assert!(
            mailer
                .send_password_reset_email("jane@example.com", "tok_1", Some("Jane"), None)
                .await
        );

        let sent = provider.sent_messages().await;
        assert!(sent[0].html().contains("https://chat.example.com/dashboard"));
        assert!(sent[0].text().contains("Hi!"));
        assert!(sent[1]
            .text()
            .contains("https://chat.example.com/reset-password?token=tok_1"));
    }

    #[tokio::test]
    async fn test_email_change_goes_to_new_address() {
        let provider = RecordingProvider::new("Recorder");
        let mailer = service(&provider, Arc::new(NoopLocator));

        assert!(
            mailer
                .send_email_change_verification("new@example.com", "tok_2", Some("Jane"))
                .await
        );
        assert!(provider.was_sent_to("new@example.com").await);
        let sent = provider.sent_messages().await;
        assert!(sent[0]
            .text()
            .contains("/api/auth/verify-email-change?token=tok_2"));
    }

    #[tokio::test]
    async fn test_login_notification_uses_geo_location_and_map() {
        let provider = RecordingProvider::new("Recorder");
        let mut geo = MockGeoLocator::new();
        geo.expect_lookup()
            .withf(|ip: &str| ip == "8.8.8.8")
            .times(1)
            .returning(|_| mountain_view());
        let mailer = service(&provider, Arc::new(geo));

        let context = LoginContext::new()
            .with_ip_address("8.8.8.8, 10.0.0.1")
            .with_user_agent("Mozilla/5.0")
            .with_location("Somewhere else")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap());

        assert!(
            mailer
                .send_login_notification_email("jane@example.com", Some("Jane"), &context)
                .await
        );

        let sent = provider.sent_messages().await;
        let html = sent[0].html();
        assert!(html.contains("Mountain View, United States"));
        assert!(!html.contains("Somewhere else"));
        assert!(html.contains("maps.googleapis.com"));
        assert!(html.contains("March 5, 2024 at 14:07 UTC"));
    }

    #[tokio::test]
    async fn test_login_notification_survives_geo_failure() {
        let provider = RecordingProvider::new("Recorder");
        let mut geo = MockGeoLocator::new();
        geo.expect_lookup().returning(|_| GeoResult::default());
        let mailer = service(&provider, Arc::new(geo));

        let context = LoginContext::new().with_ip_address("203.0.113.9");
        assert!(
            mailer
                .send_login_notification_email("jane@example.com", None, &context)
                .await
        );

        let sent = provider.sent_messages().await;
        assert!(!sent[0].html().contains("location-map\""));
        assert!(!sent[0].html().contains("maps.googleapis.com"));
    }

    #[tokio::test]
    async fn test_login_notification_skips_lookup_for_private_ip() {
        let provider = RecordingProvider::new("Recorder");
        let mut geo = MockGeoLocator::new();
        geo.expect_lookup().never();
        let mailer = service(&provider, Arc::new(geo));

        for ip in ["127.0.0.1", "192.168.0.10", "Unknown"] {
            let context = LoginContext::new().with_ip_address(ip);
            assert!(
                mailer
                    .send_login_notification_email("jane@example.com", None, &context)
                    .await
            );
        }
        assert_eq!(provider.sent_count().await, 3);
    }

    #[tokio::test]
    async fn test_user_markup_is_escaped() {
        let provider = RecordingProvider::new("Recorder");
        let mailer = service(&provider, Arc::new(NoopLocator));

        mailer
            .try_send_welcome_email("jane@example.com", Some("<script>alert(1)</script>"), None)
            .await
            .unwrap();

        let sent = provider.sent_messages().await;
        assert!(!sent[0].html().contains("<script>"));
        assert!(sent[0].html().contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn test_identical_sends_are_independent() {
        let provider = RecordingProvider::new("Recorder");
        let mailer = service(&provider, Arc::new(NoopLocator));

        let first = mailer
            .try_send_welcome_email("jane@example.com", Some("Jane"), None)
            .await
            .unwrap();
        let second = mailer
            .try_send_welcome_email("jane@example.com", Some("Jane"), None)
            .await
            .unwrap();

        assert_ne!(first.message_id, second.message_id);
        assert_eq!(provider.sent_count().await, 2);
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected_for_every_kind() {
        let provider = RecordingProvider::new("Recorder");
        let mailer = service(&provider, Arc::new(NoopLocator));

        assert!(!mailer.send_verification_email("nope", "abc", None, None).await);
        assert!(!mailer.send_welcome_email("nope", None, None).await);
        assert!(!mailer.send_password_reset_email("nope", "abc", None, None).await);
        assert!(
            !mailer
                .send_login_notification_email("nope", None, &LoginContext::new())
                .await
        );
        assert!(!mailer.send_email_change_verification("nope", "abc", None).await);
        assert_eq!(provider.sent_count().await, 0);
    }
}
