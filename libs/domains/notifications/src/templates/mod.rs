//! Email template rendering engine.
//!
//! Handlebars with HTML escaping left on: user names, locations, user
//! agents and image URLs can never inject markup. The plain-text body is
//! derived from the rendered HTML with [`strip_html`].

mod html;
mod text;

pub use text::strip_html;

use crate::error::{MailerError, MailerResult};
use crate::models::{GeoResult, LoginContext, TemplateKind};
use chrono::{Datelike, Utc};
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Longest user agent shown in the login details table.
const MAX_DEVICE_CHARS: usize = 60;

/// Rendered email content.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Per-email values for a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateParams {
    /// Public base URL, no trailing slash.
    pub base_url: String,
    /// Shown in the header alt text and footer.
    pub brand_name: String,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
    /// Fully resolved link for verify / reset / email-change kinds.
    pub action_url: Option<String>,
    /// Only used by [`TemplateKind::LoginNotification`].
    pub login: Option<LoginDetails>,
}

impl TemplateParams {
    pub fn new(base_url: impl Into<String>, brand_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            brand_name: brand_name.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_name: Option<&str>, user_image: Option<&str>) -> Self {
        self.user_name = non_blank(user_name);
        self.user_image = non_blank(user_image);
        self
    }

    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    pub fn with_login(mut self, login: LoginDetails) -> Self {
        self.login = Some(login);
        self
    }
}

/// Display-ready login metadata.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoginDetails {
    pub timestamp: String,
    pub ip_address: Option<String>,
    pub location: Option<String>,
    pub device: Option<String>,
    pub map: Option<MapSection>,
}

/// Static map image of the login location.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapSection {
    pub location: String,
    pub image_url: String,
}

impl LoginDetails {
    /// Combine what the caller knows with what geo lookup found.
    ///
    /// A looked-up location wins over the caller's. The map is only built
    /// when coordinates and a location are all known.
    pub fn from_context(context: &LoginContext, geo: &GeoResult, maps_api_key: Option<&str>) -> Self {
        let timestamp = context.timestamp.unwrap_or_else(Utc::now);
        let location = geo
            .formatted_location()
            .or_else(|| non_blank(context.location.as_deref()));

        let map = match (geo.coordinates(), location.as_ref()) {
            (Some((lat, lon)), Some(location)) => Some(MapSection {
                location: location.clone(),
                image_url: static_map_url(lat, lon, maps_api_key),
            }),
            _ => None,
        };

        Self {
            timestamp: timestamp.format("%B %-d, %Y at %H:%M UTC").to_string(),
            ip_address: non_blank(context.ip_address.as_deref()),
            location,
            device: non_blank(context.user_agent.as_deref()).map(|ua| truncate_device(&ua)),
            map,
        }
    }
}

/// Google Static Maps URL centred on the coordinates, with a red marker.
pub fn static_map_url(latitude: f64, longitude: f64, api_key: Option<&str>) -> String {
    format!(
        "https://maps.googleapis.com/maps/api/staticmap?center={lat},{lon}&zoom=12&size=500x300&markers=color:red%7C{lat},{lon}&key={key}",
        lat = latitude,
        lon = longitude,
        key = api_key.unwrap_or_default(),
    )
}

/// Resolve the action link for `kind`.
///
/// Input with an `http://` or `https://` scheme is used as-is (it must
/// parse as a URL). Anything else is treated as a bare token and appended to the
/// kind's fixed path: `{base_url}{path}?token={token}`.
pub fn resolve_action_url(base_url: &str, kind: TemplateKind, token_or_url: &str) -> MailerResult<String> {
    let path = kind.link_path().ok_or_else(|| {
        MailerError::TemplateInputInvalid(format!("{} emails carry no action link", kind))
    })?;

    let input = token_or_url.trim();
    if input.is_empty() {
        return Err(MailerError::TemplateInputInvalid(format!(
            "{} link requires a token or URL",
            kind
        )));
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        reqwest::Url::parse(input).map_err(|e| {
            MailerError::TemplateInputInvalid(format!("invalid {} URL: {}", kind, e))
        })?;
        return Ok(input.to_string());
    }

    if !input
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
    {
        return Err(MailerError::TemplateInputInvalid(format!(
            "{} token contains characters that are not URL-safe",
            kind
        )));
    }

    Ok(format!("{}{}?token={}", base_url.trim_end_matches('/'), path, input))
}

/// Template engine for rendering email templates.
#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Arc<Handlebars<'static>>,
}

impl TemplateEngine {
    /// Create a new template engine with all templates registered.
    pub fn new() -> MailerResult<Self> {
        let mut handlebars = Handlebars::new();

        handlebars.register_partial("head", html::HEAD_PARTIAL)?;
        handlebars.register_partial("foot", html::FOOT_PARTIAL)?;
        handlebars.register_partial("action", html::ACTION_PARTIAL)?;

        for kind in TemplateKind::ALL {
            handlebars.register_template_string(kind.template_name(), source(kind))?;
        }

        Ok(Self {
            handlebars: Arc::new(handlebars),
        })
    }

    /// Render `kind` with `params`.
    ///
    /// Link-bearing kinds require `params.action_url`; the login
    /// notification requires `params.login`.
    pub fn render(&self, kind: TemplateKind, params: &TemplateParams) -> MailerResult<RenderedEmail> {
        debug!(kind = %kind, has_user_name = params.user_name.is_some(), "Rendering email");

        if kind.link_path().is_some() && params.action_url.is_none() {
            return Err(MailerError::TemplateInputInvalid(format!(
                "{} email requires an action URL",
                kind
            )));
        }
        if kind == TemplateKind::LoginNotification && params.login.is_none() {
            return Err(MailerError::TemplateInputInvalid(
                "login notification requires login details".to_string(),
            ));
        }

        let base = params.base_url.trim_end_matches('/');
        let context = RenderContext {
            subject: kind.subject(),
            title: kind.title(),
            styles: html::STYLES,
            brand_name: &params.brand_name,
            logo_url: format!("{}/aj-logo.jpg", base),
            dashboard_url: format!("{}/dashboard", base),
            support_url: format!("{}/support", base),
            security_url: format!("{}/settings/security", base),
            year: Utc::now().year(),
            show_profile: params.user_name.is_some() || params.user_image.is_some(),
            user_name: params.user_name.as_deref(),
            user_image: params.user_image.as_deref(),
            action_url: params.action_url.as_deref(),
            action_label: action_label(kind),
            login: params.login.as_ref(),
        };

        let html = self.handlebars.render(kind.template_name(), &context)?;
        let text = strip_html(&html);

        Ok(RenderedEmail {
            subject: kind.subject().to_string(),
            html,
            text,
        })
    }
}

#[derive(Serialize)]
struct RenderContext<'a> {
    subject: &'static str,
    title: &'static str,
    styles: &'static str,
    brand_name: &'a str,
    logo_url: String,
    dashboard_url: String,
    support_url: String,
    security_url: String,
    year: i32,
    show_profile: bool,
    user_name: Option<&'a str>,
    user_image: Option<&'a str>,
    action_url: Option<&'a str>,
    action_label: &'static str,
    login: Option<&'a LoginDetails>,
}

fn source(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::VerifyEmail => html::VERIFY_EMAIL,
        TemplateKind::Welcome => html::WELCOME,
        TemplateKind::PasswordReset => html::PASSWORD_RESET,
        TemplateKind::LoginNotification => html::LOGIN_NOTIFICATION,
        TemplateKind::EmailChangeVerification => html::EMAIL_CHANGE_VERIFICATION,
    }
}

fn action_label(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::VerifyEmail => "Verify Email Address",
        TemplateKind::PasswordReset => "Reset Password",
        TemplateKind::EmailChangeVerification => "Verify New Email",
        TemplateKind::Welcome | TemplateKind::LoginNotification => "",
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn truncate_device(user_agent: &str) -> String {
    if user_agent.chars().count() <= MAX_DEVICE_CHARS {
        return user_agent.to_string();
    }
    let truncated: String = user_agent.chars().take(MAX_DEVICE_CHARS).collect();
    format!("{}...", truncated)
}
