//! TOMO Mailer CLI
//!
//! Operator tooling for the transactional mailer:
//!
//! - `config`: effective settings and detected problems, as JSON
//! - `check`: connection test against the active provider
//! - `send`: connection test plus one test email per selected kind
//!
//! Configuration comes from the same environment variables the
//! application uses, so a green `check` here means the app can send too.

use clap::{Parser, Subcommand, ValueEnum};
use core_config::tracing::init_tracing;
use core_config::{Environment, FromEnv};
use domain_notifications::{ConfigReport, LoginContext, MailerConfig, MailerResult, MailerService, SentEmail, TemplateKind};
use eyre::{Result, WrapErr};
use std::fmt;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "tomo-mailer")]
#[command(about = "Diagnose and exercise the TOMO transactional mailer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the effective mail configuration and any problems found
    Config,

    /// Verify that the active provider can accept mail
    Check,

    /// Send test emails
    Send {
        /// Recipient of the test emails
        #[arg(long, env = "TEST_EMAIL")]
        to: String,

        /// Which email kinds to send
        #[arg(long, value_enum, default_value_t = KindArg::All)]
        kind: KindArg,

        /// Name used for personalization
        #[arg(long, default_value = "Test User")]
        user_name: String,

        /// Pause between sends, in milliseconds
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
    },
}

/// `--kind` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    All,
    Verification,
    Welcome,
    Reset,
    EmailChange,
    Login,
}

impl KindArg {
    pub fn kinds(self) -> Vec<TemplateKind> {
        match self {
            KindArg::All => TemplateKind::ALL.to_vec(),
            KindArg::Verification => vec![TemplateKind::VerifyEmail],
            KindArg::Welcome => vec![TemplateKind::Welcome],
            KindArg::Reset => vec![TemplateKind::PasswordReset],
            KindArg::EmailChange => vec![TemplateKind::EmailChangeVerification],
            KindArg::Login => vec![TemplateKind::LoginNotification],
        }
    }
}

/// One line of the final summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn from_send(kind: TemplateKind, result: MailerResult<SentEmail>) -> Self {
        match result {
            Ok(sent) => Self {
                name: kind.to_string(),
                passed: true,
                detail: format!(
                    "{} ({})",
                    sent.provider,
                    sent.message_id.as_deref().unwrap_or("no message id")
                ),
            },
            Err(e) => Self {
                name: kind.to_string(),
                passed: false,
                detail: format!("{}: {}", e.reason(), e),
            },
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "PASSED" } else { "FAILED" };
        write!(f, "{:<28} {:<7} {}", self.name, status, self.detail)
    }
}

/// Render the summary block; the flag is true only if everything passed.
pub fn summarize(results: &[CheckResult]) -> (String, bool) {
    let passed = results.iter().filter(|r| r.passed).count();
    let all_passed = passed == results.len();

    let mut out = String::from("Summary\n");
    for result in results {
        out.push_str(&format!("  {}\n", result));
    }
    out.push_str(&format!(
        "{} of {} passed: {}",
        passed,
        results.len(),
        if all_passed { "PASSED" } else { "FAILED" }
    ));

    (out, all_passed)
}

/// Pretty JSON for `config`; the flag is false when issues were found.
pub fn render_report(report: &ConfigReport) -> Result<(String, bool)> {
    let json = serde_json::to_string_pretty(report).wrap_err("Failed to serialize config report")?;
    Ok((json, report.is_healthy()))
}

/// Run a CLI command. Returns whether the command succeeded.
pub async fn run(cli: Cli) -> Result<bool> {
    let environment = Environment::from_env();
    init_tracing(&environment);

    let config = MailerConfig::from_env().wrap_err("Failed to load mailer configuration")?;

    match cli.command {
        Commands::Config => {
            let (json, healthy) = render_report(&config.diagnose())?;
            println!("{}", json);
            Ok(healthy)
        }
        Commands::Check => {
            let mailer = MailerService::from_config(config).wrap_err("Failed to initialize mailer")?;
            let connected = mailer.test_email_connection().await;
            println!(
                "Connection test via {}: {}",
                mailer.active_provider().unwrap_or("none"),
                if connected { "PASSED" } else { "FAILED" }
            );
            Ok(connected)
        }
        Commands::Send {
            to,
            kind,
            user_name,
            delay_ms,
        } => {
            let mailer = MailerService::from_config(config).wrap_err("Failed to initialize mailer")?;
            let results = send_test_emails(
                &mailer,
                &to,
                &kind.kinds(),
                &user_name,
                Duration::from_millis(delay_ms),
            )
            .await;

            let (summary, all_passed) = summarize(&results);
            println!("{}", summary);
            Ok(all_passed)
        }
    }
}

/// Connection test, then one send per kind, spaced by `delay`.
pub async fn send_test_emails(
    mailer: &MailerService,
    to: &str,
    kinds: &[TemplateKind],
    user_name: &str,
    delay: Duration,
) -> Vec<CheckResult> {
    let mut results = Vec::with_capacity(kinds.len() + 1);

    let connected = mailer.test_email_connection().await;
    results.push(CheckResult {
        name: "connection".to_string(),
        passed: connected,
        detail: mailer.active_provider().unwrap_or("none").to_string(),
    });

    for (i, &kind) in kinds.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        info!(kind = %kind, "Sending test email");
        let result = send_one(mailer, kind, to, user_name).await;
        results.push(CheckResult::from_send(kind, result));
    }

    results
}

async fn send_one(
    mailer: &MailerService,
    kind: TemplateKind,
    to: &str,
    user_name: &str,
) -> MailerResult<SentEmail> {
    let token = format!("test-{}", Uuid::new_v4().simple());
    let name = Some(user_name);

    match kind {
        TemplateKind::VerifyEmail => mailer.try_send_verification_email(to, &token, name, None).await,
        TemplateKind::Welcome => mailer.try_send_welcome_email(to, name, None).await,
        TemplateKind::PasswordReset => mailer.try_send_password_reset_email(to, &token, name, None).await,
        TemplateKind::EmailChangeVerification => {
            mailer.try_send_email_change_verification(to, &token, name).await
        }
        TemplateKind::LoginNotification => {
            let context = LoginContext::new()
                .with_ip_address("8.8.8.8")
                .with_user_agent("tomo-mailer test client");
            mailer.try_send_login_notification_email(to, name, &context).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_notifications::{
        NoopLocator, ProviderChain, ProviderKind, RecordingProvider, ResendConfig, TemplateEngine,
    };
    use std::sync::Arc;

    fn mailer(provider: &RecordingProvider) -> MailerService {
        MailerService::new(
            MailerConfig::new("https://chat.example.com"),
            ProviderChain::new().with_provider(Arc::new(provider.clone())),
            TemplateEngine::new().unwrap(),
            Arc::new(NoopLocator),
        )
    }

    #[test]
    fn test_parse_send_defaults() {
        let cli = Cli::try_parse_from(["tomo-mailer", "send", "--to", "ops@example.com"]).unwrap();
        match cli.command {
            Commands::Send {
                to,
                kind,
                user_name,
                delay_ms,
            } => {
                assert_eq!(to, "ops@example.com");
                assert_eq!(kind, KindArg::All);
                assert_eq!(user_name, "Test User");
                assert_eq!(delay_ms, 1000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_kind_values() {
        let cli = Cli::try_parse_from([
            "tomo-mailer",
            "send",
            "--to",
            "ops@example.com",
            "--kind",
            "email-change",
            "--delay-ms",
            "0",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Send {
                kind: KindArg::EmailChange,
                delay_ms: 0,
                ..
            }
        ));

        assert!(Cli::try_parse_from(["tomo-mailer", "send", "--to", "a@b.co", "--kind", "digest"]).is_err());
    }

    #[test]
    fn test_kind_expansion() {
        assert_eq!(KindArg::All.kinds().len(), 5);
        assert_eq!(KindArg::Login.kinds(), vec![TemplateKind::LoginNotification]);
        assert_eq!(KindArg::Reset.kinds(), vec![TemplateKind::PasswordReset]);
    }

    #[test]
    fn test_summarize() {
        let results = vec![
            CheckResult {
                name: "connection".into(),
                passed: true,
                detail: "Recorder".into(),
            },
            CheckResult {
                name: "welcome".into(),
                passed: false,
                detail: "provider_rejected".into(),
            },
        ];
        let (text, all_passed) = summarize(&results);
        assert!(!all_passed);
        assert!(text.contains("1 of 2 passed: FAILED"));

        let (_, all_passed) = summarize(&results[..1]);
        assert!(all_passed);
    }

    #[test]
    fn test_render_report() {
        let (json, healthy) = render_report(&MailerConfig::new("http://localhost:3000").diagnose()).unwrap();
        assert!(!healthy);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["provider"], "smtp");
        assert_eq!(value["settings"]["SMTP_PASS"], "NOT SET");
        assert!(!value["issues"].as_array().unwrap().is_empty());

        let configured = MailerConfig::new("https://chat.example.com")
            .with_provider(ProviderKind::Resend)
            .with_resend(ResendConfig::new("re_key"))
            .with_sender("hello@example.com", "TOMO");
        let (_, healthy) = render_report(&configured.diagnose()).unwrap();
        assert!(healthy);
    }

    #[tokio::test]
    async fn test_send_test_emails_all_kinds() {
        let provider = RecordingProvider::new("Recorder");
        let results = send_test_emails(
            &mailer(&provider),
            "ops@example.com",
            &KindArg::All.kinds(),
            "Ops",
            Duration::ZERO,
        )
        .await;

        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|r| r.passed), "{:?}", results);
        assert_eq!(provider.sent_count().await, 5);
    }

    #[tokio::test]
    async fn test_send_test_emails_reports_failures() {
        let provider = RecordingProvider::failing("Recorder", "quota exceeded");
        let results = send_test_emails(
            &mailer(&provider),
            "ops@example.com",
            &KindArg::Welcome.kinds(),
            "Ops",
            Duration::ZERO,
        )
        .await;

        assert!(!results[0].passed);
        assert!(!results[1].passed);
        assert!(results[1].detail.starts_with("provider_rejected"));
    }
}
