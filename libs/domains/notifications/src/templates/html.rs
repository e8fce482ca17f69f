//! Handlebars sources for the branded HTML emails.
//!
//! Every user-controlled value goes through `{{ }}` (escaped). Triple-stash
//! is reserved for the static stylesheet.

pub(super) const STYLES: &str = r#"
  body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif; line-height: 1.6; color: #2d3748; background-color: #f7f7f8; margin: 0; padding: 0; }
  .container { max-width: 600px; margin: 40px auto; background-color: #ffffff; border-radius: 12px; overflow: hidden; box-shadow: 0 4px 16px rgba(0,0,0,0.08); border: 1px solid #e5e5e5; }
  .header { background: linear-gradient(180deg, #ffffff 0%, #f9fafb 100%); padding: 40px 30px; text-align: center; border-bottom: 1px solid #e5e5e5; }
  .header .logo { margin-bottom: 24px; }
  .header .logo img { width: 72px; height: 72px; border-radius: 50%; background: #f7f7f8; padding: 4px; border: 2px solid #e5e5e5; }
  .header h1 { margin: 0; font-size: 26px; font-weight: 600; color: #1a1a1a; letter-spacing: -0.5px; }
  .user-profile { text-align: center; margin: 24px 0; }
  .user-profile img { width: 80px; height: 80px; border-radius: 50%; border: 3px solid #e5e5e5; object-fit: cover; }
  .user-profile .user-name { margin-top: 12px; font-size: 18px; font-weight: 600; color: #1a1a1a; }
  .location-map { margin: 24px 0; text-align: center; }
  .location-map img { width: 100%; max-width: 500px; border-radius: 8px; border: 1px solid #e5e5e5; }
  .content { padding: 40px 32px; }
  .content h2 { color: #1a1a1a; font-size: 22px; margin: 0 0 20px 0; font-weight: 600; letter-spacing: -0.3px; }
  .content p { color: #6b7280; font-size: 15px; margin: 0 0 20px 0; line-height: 1.7; }
  .button { display: inline-block; padding: 14px 28px; background: #10a37f; color: #ffffff !important; text-decoration: none; border-radius: 6px; font-weight: 600; font-size: 15px; margin: 24px 0; }
  .footer { padding: 32px; text-align: center; background-color: #fafafa; border-top: 1px solid #e5e5e5; }
  .footer p { margin: 5px 0; color: #9ca3af; font-size: 13px; }
  .footer a { color: #10a37f; text-decoration: none; font-weight: 500; }
  .divider { height: 1px; background: #e5e5e5; margin: 32px 0; }
  .info-box { background-color: #f0fdf4; border-left: 3px solid #10a37f; padding: 16px 20px; margin: 24px 0; border-radius: 6px; }
  .info-box p { margin: 0; color: #059669; font-size: 14px; line-height: 1.6; }
  .fallback-link { word-break: break-all; font-size: 14px; color: #667eea; }
  .muted { font-size: 14px; color: #999999; }
  .details td { padding: 8px 0; font-size: 14px; }
  .details td.label { color: #666666; width: 120px; }
  .details td.value { color: #333333; }
"#;

/// Opens the document, the container and the branded header.
pub(super) const HEAD_PARTIAL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{{subject}}</title>
  <style>{{{styles}}}</style>
</head>
<body>
  <div class="container">
    <div class="header">
      <div class="logo">
        <img src="{{logo_url}}" alt="{{brand_name}} Logo" />
      </div>
      <h1>{{title}}</h1>
    </div>
    <div class="content">
      {{#if show_profile}}
      <div class="user-profile">
        {{#if user_image}}<img src="{{user_image}}" alt="{{#if user_name}}{{user_name}}{{else}}User{{/if}}" />{{/if}}
        {{#if user_name}}<div class="user-name">{{user_name}}</div>{{/if}}
      </div>
      {{/if}}
"#;

/// Closes the content block, renders the footer, closes the document.
pub(super) const FOOT_PARTIAL: &str = r#"
    </div>
    <div class="footer">
      <p>Questions? <a href="{{support_url}}">Contact Support</a></p>
      <p>Sent with ❤️ from {{brand_name}}</p>
      <p>&copy; {{year}} {{brand_name}}. All rights reserved.</p>
    </div>
  </div>
</body>
</html>
"#;

/// Button plus the copy-paste fallback for the action link.
pub(super) const ACTION_PARTIAL: &str = r#"
      <div style="text-align: center;">
        <a href="{{action_url}}" class="button">{{action_label}}</a>
      </div>
      <div class="divider"></div>
      <div class="info-box">
        <p><strong>Alternative:</strong> If the button doesn't work, copy and paste this link into your browser:</p>
      </div>
      <p class="fallback-link">{{action_url}}</p>
      <div class="divider"></div>
"#;

pub(super) const VERIFY_EMAIL: &str = r#"{{> head}}
      <h2>Welcome{{#if user_name}}, {{user_name}}{{/if}}! 👋</h2>
      <p>Thanks for signing up! We're excited to have you on board.</p>
      <p>To complete your registration and start using your account, please verify your email address by clicking the button below:</p>
      {{> action}}
      <p class="muted">This verification link will expire in 24 hours. If you didn't create an account, you can safely ignore this email.</p>
{{> foot}}"#;

pub(super) const WELCOME: &str = r#"{{> head}}
      <h2>Hi{{#if user_name}}, {{user_name}}{{/if}}!</h2>
      <p>Your email has been verified successfully. You're all set to start using your account!</p>
      <p>Here are some quick tips to get you started:</p>
      <ul style="color: #666666; line-height: 1.8;">
        <li>Complete your profile to personalize your experience</li>
        <li>Explore our features and tools</li>
        <li>Check out our documentation and guides</li>
        <li>Join our community and connect with other users</li>
      </ul>
      <div style="text-align: center;">
        <a href="{{dashboard_url}}" class="button">Go to Dashboard</a>
      </div>
      <div class="divider"></div>
      <p>If you have any questions or need assistance, feel free to reach out to our support team.</p>
{{> foot}}"#;

pub(super) const PASSWORD_RESET: &str = r#"{{> head}}
      <h2>Hi{{#if user_name}}, {{user_name}}{{/if}}!</h2>
      <p>We received a request to reset the password for your account. If you didn't make this request, you can safely ignore this email.</p>
      <p>To reset your password, click the button below:</p>
      {{> action}}
      <p class="muted">This password reset link will expire in 1 hour for security reasons. If you didn't request a password reset, please ignore this email or contact support if you have concerns.</p>
{{> foot}}"#;

pub(super) const LOGIN_NOTIFICATION: &str = r#"{{> head}}
      <h2>Hi{{#if user_name}}, {{user_name}}{{/if}}!</h2>
      <p>We detected a new login to your account. If this was you, you can safely ignore this email.</p>
      <div class="info-box">
        <p><strong>Login Details:</strong></p>
      </div>
      <table class="details" style="width: 100%; margin: 20px 0;">
        <tr>
          <td class="label"><strong>Time:</strong></td>
          <td class="value">{{login.timestamp}}</td>
        </tr>
        {{#if login.ip_address}}
        <tr>
          <td class="label"><strong>IP Address:</strong></td>
          <td class="value">{{login.ip_address}}</td>
        </tr>
        {{/if}}
        {{#if login.location}}
        <tr>
          <td class="label"><strong>Location:</strong></td>
          <td class="value">{{login.location}}</td>
        </tr>
        {{/if}}
        {{#if login.device}}
        <tr>
          <td class="label"><strong>Device:</strong></td>
          <td class="value">{{login.device}}</td>
        </tr>
        {{/if}}
      </table>
      {{#if login.map}}
      <div class="location-map">
        <p style="color: #666666; margin-bottom: 10px;"><strong>📍 Login Location:</strong> {{login.map.location}}</p>
        <img src="{{login.map.image_url}}" alt="Login location map: {{login.map.location}}" />
      </div>
      {{/if}}
      <div class="divider"></div>
      <p style="color: #d93025;"><strong>Was this not you?</strong></p>
      <p>If you didn't log in, please secure your account immediately by changing your password.</p>
      <div style="text-align: center;">
        <a href="{{security_url}}" class="button">Secure My Account</a>
      </div>
{{> foot}}"#;

pub(super) const EMAIL_CHANGE_VERIFICATION: &str = r#"{{> head}}
      <h2>Hi{{#if user_name}}, {{user_name}}{{/if}}!</h2>
      <p>You recently requested to change your email address. To confirm this change, please verify your new email address by clicking the button below:</p>
      {{> action}}
      <p class="muted">This verification link will expire in 24 hours. If you didn't request an email change, please contact support immediately.</p>
{{> foot}}"#;
