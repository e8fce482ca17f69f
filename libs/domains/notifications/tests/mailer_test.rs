//! Integration tests for the mailer, against local stand-ins for the
//! Resend API and the geo lookup service.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use domain_notifications::{
    EmailOptions, GeoConfig, LoginContext, MailerConfig, MailerService, ProviderKind, ResendConfig,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Requests received by the fake Resend API.
#[derive(Clone, Default)]
struct Outbox {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

impl Outbox {
    fn bodies(&self) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn accept_email(State(outbox): State<Outbox>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let mut requests = outbox.requests.lock().unwrap();
    requests.push((auth, body));
    Json(json!({ "id": format!("resend-{}", requests.len()) }))
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn resend_server() -> (String, Outbox) {
    let outbox = Outbox::default();
    let router = Router::new()
        .route("/emails", post(accept_email))
        .with_state(outbox.clone());
    let addr = spawn(router).await;
    (format!("http://{}", addr), outbox)
}

async fn geo_server(healthy: bool) -> String {
    let router = Router::new().route(
        "/json/{ip}",
        get(move |Path(ip): Path<String>| async move {
            if !healthy {
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(Value::Null));
            }
            (
                StatusCode::OK,
                Json(json!({
                    "status": "success",
                    "query": ip,
                    "country": "Germany",
                    "city": "Berlin",
                    "lat": 52.52,
                    "lon": 13.405
                })),
            )
        }),
    );
    let addr = spawn(router).await;
    format!("http://{}/json", addr)
}

fn resend_config(api_url: &str, geo_endpoint: &str) -> MailerConfig {
    MailerConfig::new("https://chat.example.com")
        .with_provider(ProviderKind::Resend)
        .with_resend(ResendConfig::new("re_integration").with_api_url(api_url))
        .with_geo(GeoConfig::new(geo_endpoint))
        .with_sender("hello@example.com", "TOMO")
}

mod resend_tests {
    use super::*;

    #[tokio::test]
    async fn test_every_use_case_succeeds() {
        let (api_url, outbox) = resend_server().await;
        let geo = geo_server(true).await;
        let mailer = MailerService::from_config(resend_config(&api_url, &geo)).unwrap();
        let login = LoginContext::new()
            .with_ip_address("8.8.8.8")
            .with_user_agent("Mozilla/5.0");

        assert!(mailer.send_verification_email("jane@example.com", "abc123", Some("Jane"), None).await);
        assert!(mailer.send_welcome_email("jane@example.com", Some("Jane"), None).await);
        assert!(mailer.send_password_reset_email("jane@example.com", "abc123", None, None).await);
        assert!(mailer.send_login_notification_email("jane@example.com", Some("Jane"), &login).await);
        assert!(mailer.send_email_change_verification("new@example.com", "abc123", None).await);
        assert!(
            mailer
                .send_email(EmailOptions::new("jane@example.com", "Custom", "<p>Hi</p>"))
                .await
        );

        let subjects: Vec<String> = outbox
            .bodies()
            .iter()
            .map(|b| b["subject"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            subjects,
            vec![
                "Verify your email address",
                "Welcome! Your account is ready",
                "Reset your password",
                "New login to your account",
                "Verify your new email address",
                "Custom",
            ]
        );

        let requests = outbox.requests.lock().unwrap();
        assert!(requests
            .iter()
            .all(|(auth, _)| auth.as_deref() == Some("Bearer re_integration")));
        assert_eq!(requests[0].1["from"], "TOMO <hello@example.com>");
        assert_eq!(requests[4].1["to"], json!(["new@example.com"]));
    }

    #[tokio::test]
    async fn test_login_notification_includes_geo_location() {
        let (api_url, outbox) = resend_server().await;
        let geo = geo_server(true).await;
        let mailer = MailerService::from_config(resend_config(&api_url, &geo)).unwrap();
        let login = LoginContext::new().with_ip_address("8.8.8.8");

        let sent = mailer
            .try_send_login_notification_email("jane@example.com", None, &login)
            .await
            .unwrap();
        assert_eq!(sent.provider, "Resend");

        let body = &outbox.bodies()[0];
        let html = body["html"].as_str().unwrap();
        assert!(html.contains("Berlin, Germany"));
        assert!(html.contains("<div class=\"location-map\">"));
        assert!(body["text"].as_str().unwrap().contains("Berlin, Germany"));
    }

    #[tokio::test]
    async fn test_geo_failure_still_sends_without_map() {
        let (api_url, outbox) = resend_server().await;
        let geo = geo_server(false).await;
        let mailer = MailerService::from_config(resend_config(&api_url, &geo)).unwrap();
        let login = LoginContext::new()
            .with_ip_address("8.8.8.8")
            .with_location("Reported City");

        assert!(mailer.send_login_notification_email("jane@example.com", None, &login).await);

        let html = outbox.bodies()[0]["html"].as_str().unwrap().to_string();
        assert!(html.contains("Reported City"));
        assert!(!html.contains("<div class=\"location-map\">"));
    }

    #[tokio::test]
    async fn test_identical_sends_are_independent() {
        let (api_url, outbox) = resend_server().await;
        let mailer =
            MailerService::from_config(resend_config(&api_url, "http://127.0.0.1:9/json")).unwrap();

        let first = mailer
            .try_send_welcome_email("jane@example.com", Some("Jane"), None)
            .await
            .unwrap();
        let second = mailer
            .try_send_welcome_email("jane@example.com", Some("Jane"), None)
            .await
            .unwrap();

        assert_eq!(outbox.len(), 2);
        assert_eq!(first.message_id.as_deref(), Some("resend-1"));
        assert_eq!(second.message_id.as_deref(), Some("resend-2"));
    }

    #[tokio::test]
    async fn test_rejection_is_reported_as_failure() {
        let router = Router::new().route(
            "/emails",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "statusCode": 422,
                        "name": "validation_error",
                        "message": "Invalid `to` field"
                    })),
                )
            }),
        );
        let api_url = format!("http://{}", spawn(router).await);
        let mailer =
            MailerService::from_config(resend_config(&api_url, "http://127.0.0.1:9/json")).unwrap();

        let err = mailer
            .try_send_welcome_email("jane@example.com", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "provider_rejected");
        assert!(!mailer.send_welcome_email("jane@example.com", None, None).await);
    }

    #[tokio::test]
    async fn test_connection_test_with_key_needs_no_network() {
        let mailer = MailerService::from_config(resend_config(
            "http://127.0.0.1:9",
            "http://127.0.0.1:9/json",
        ))
        .unwrap();
        assert!(mailer.test_email_connection().await);
    }
}

mod fallback_tests {
    use super::*;
    use domain_notifications::{
        NoopLocator, ProviderChain, RecordingProvider, ResendProvider, Sender, TemplateEngine,
    };

    #[tokio::test]
    async fn test_resend_without_key_falls_back_to_smtp() {
        let (api_url, outbox) = resend_server().await;
        let smtp_spy = RecordingProvider::new("SMTP");
        let resend = ResendProvider::new(
            ResendConfig::default().with_api_url(api_url),
            Sender::new("hello@example.com", "TOMO"),
        )
        .unwrap();
        let chain = ProviderChain::new()
            .with_provider(Arc::new(resend))
            .with_provider(Arc::new(smtp_spy.clone()));
        let mailer = MailerService::new(
            MailerConfig::new("https://chat.example.com").with_provider(ProviderKind::Resend),
            chain,
            TemplateEngine::new().unwrap(),
            Arc::new(NoopLocator),
        );
        let login = LoginContext::new().with_ip_address("8.8.8.8");

        assert!(mailer.send_verification_email("jane@example.com", "abc123", Some("Jane"), None).await);
        assert!(mailer.send_welcome_email("jane@example.com", Some("Jane"), None).await);
        assert!(mailer.send_password_reset_email("jane@example.com", "abc123", None, None).await);
        assert!(mailer.send_login_notification_email("jane@example.com", None, &login).await);
        assert!(mailer.send_email_change_verification("new@example.com", "abc123", None).await);

        assert_eq!(smtp_spy.sent_count().await, 5);
        assert!(smtp_spy.was_sent_to("new@example.com").await);
        assert_eq!(outbox.len(), 0);
        assert_eq!(mailer.active_provider(), Some("SMTP"));
    }

    #[tokio::test]
    async fn test_default_config_uses_placeholder_smtp() {
        let mailer = MailerService::from_config(
            MailerConfig::new("https://chat.example.com").with_geo(GeoConfig::disabled()),
        )
        .unwrap();

        let sent = mailer
            .try_send_welcome_email("jane@example.com", None, None)
            .await
            .unwrap();
        assert_eq!(sent.provider, "SMTP");
        assert!(sent.message_id.unwrap().starts_with("placeholder-"));
        assert!(!mailer.test_email_connection().await);
    }
}
