//! Notifications Domain
//!
//! Transactional email for TOMO: account verification, welcome, password
//! reset, login alerts and email-change confirmation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Use-cases     │  ← send_verification_email, send_login_notification_email, ...
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐     ┌─────────────┐
//! │  MailerService  │ ──▶ │ GeoLocator  │  ← login notifications only
//! └────────┬────────┘     └─────────────┘
//!          │
//! ┌────────▼────────┐
//! │ TemplateEngine  │  ← handlebars, escaped
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │  ProviderChain  │  ← first ready provider: Resend, then SMTP
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use core_config::FromEnv;
//! use domain_notifications::{MailerConfig, MailerService};
//!
//! let mailer = MailerService::from_config(MailerConfig::from_env()?)?;
//!
//! if !mailer.send_welcome_email("jane@example.com", Some("Jane"), None).await {
//!     // already logged; the caller decides whether that matters
//! }
//! ```

pub mod config;
pub mod error;
pub mod geo;
mod mailer;
pub mod models;
pub mod providers;
pub mod service;
pub mod templates;

// Re-export commonly used types
pub use config::{ConfigReport, MailerConfig, ProviderKind};
pub use error::{MailerError, MailerResult};
pub use geo::{GeoConfig, GeoLocator, IpApiLocator, NoopLocator};
pub use models::{
    EmailOptions, GeoResult, LoginContext, OutgoingMessage, SentEmail, TemplateKind,
};
pub use providers::{
    EmailProvider, ProviderChain, RecordingProvider, ResendConfig, ResendProvider, Sender,
    SmtpConfig, SmtpProvider,
};
pub use service::MailerService;
pub use templates::{strip_html, TemplateEngine};
