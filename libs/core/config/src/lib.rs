//! Shared configuration helpers.
//!
//! Every service in the workspace reads its settings from environment
//! variables through the [`FromEnv`] trait and the `env_*` helpers below.

pub mod tracing;

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Application environment, selects log format and verbosity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        match env_optional("APP_ENV") {
            Some(value) if value.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Value of `key`, or `default` when unset or empty.
pub fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

/// Value of `key` with surrounding whitespace trimmed.
///
/// Empty values count as unset: deployment tooling tends to export
/// `SMTP_USER=` rather than leaving the variable out.
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// First variable in `keys` that is set.
pub fn env_first(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| env_optional(key))
}

/// Boolean flag: `true`/`1`/`yes`/`on` (any case) are true, anything else false.
pub fn env_flag(key: &str, default: bool) -> bool {
    match env_optional(key) {
        Some(value) => matches!(
            value.to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        None => default,
    }
}

/// Parse `key` into `T`, falling back to `default` when unset.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env_optional(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("MAILER_TEST_VAR", Some("value"), || {
            assert_eq!(env_or_default("MAILER_TEST_VAR", "default"), "value");
        });
        temp_env::with_var_unset("MAILER_TEST_VAR", || {
            assert_eq!(env_or_default("MAILER_TEST_VAR", "default"), "default");
        });
    }

    #[test]
    fn test_empty_value_counts_as_unset() {
        temp_env::with_var("MAILER_EMPTY_VAR", Some("   "), || {
            assert_eq!(env_optional("MAILER_EMPTY_VAR"), None);
            assert_eq!(env_or_default("MAILER_EMPTY_VAR", "fallback"), "fallback");
        });
    }

    #[test]
    fn test_env_first_prefers_earlier_keys() {
        temp_env::with_vars(
            [
                ("FIRST_URL", None::<&str>),
                ("SECOND_URL", Some("https://second.example.com")),
                ("THIRD_URL", Some("https://third.example.com")),
            ],
            || {
                assert_eq!(
                    env_first(&["FIRST_URL", "SECOND_URL", "THIRD_URL"]).as_deref(),
                    Some("https://second.example.com")
                );
            },
        );
    }

    #[test]
    fn test_env_flag() {
        temp_env::with_var("FLAG_VAR", Some("TRUE"), || {
            assert!(env_flag("FLAG_VAR", false));
        });
        temp_env::with_var("FLAG_VAR", Some("no"), || {
            assert!(!env_flag("FLAG_VAR", true));
        });
        temp_env::with_var_unset("FLAG_VAR", || {
            assert!(env_flag("FLAG_VAR", true));
        });
    }

    #[test]
    fn test_env_parse() {
        temp_env::with_var("PORT_VAR", Some("2525"), || {
            assert_eq!(env_parse::<u16>("PORT_VAR", 587).unwrap(), 2525);
        });
        temp_env::with_var_unset("PORT_VAR", || {
            assert_eq!(env_parse::<u16>("PORT_VAR", 587).unwrap(), 587);
        });
        temp_env::with_var("PORT_VAR", Some("99999"), || {
            let err = env_parse::<u16>("PORT_VAR", 587).unwrap_err();
            assert!(err.to_string().contains("PORT_VAR"));
        });
    }
}
