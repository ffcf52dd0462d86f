//! Runtime configuration read from the environment.

use std::time::Duration;

use crate::errors::AppError;

/// Variable holding the provider API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Variable selecting the model id.
pub const MODEL_VAR: &str = "OPENAI_MODEL";
/// Variable with the per-command model timeout in seconds.
pub const TIMEOUT_VAR: &str = "TRIAGE_TIMEOUT_SECS";
/// Variable with the default retry budget.
pub const MAX_RETRIES_VAR: &str = "TRIAGE_MAX_RETRIES";

/// Model used when `OPENAI_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Settings shared by every command that talks to a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Model id passed to the provider.
    pub model: String,

    /// Wall-clock limit for one extraction, retries included.
    ///
    /// Default: 60 seconds
    pub timeout: Duration,

    /// Re-attempts after the first one.
    ///
    /// Default: 3
    pub max_retries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// `AppError::MissingApiKey` when no key is set, `AppError::InvalidSetting`
    /// when a numeric variable does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if present(API_KEY_VAR).is_none() {
            return Err(AppError::MissingApiKey);
        }

        let mut config = Self::default();
        if let Some(model) = present(MODEL_VAR) {
            config.model = model.trim().to_string();
        }
        if let Some(raw) = present(TIMEOUT_VAR) {
            config.timeout = Duration::from_secs(parse_setting(TIMEOUT_VAR, &raw)?);
        }
        if let Some(raw) = present(MAX_RETRIES_VAR) {
            config.max_retries = parse_setting(MAX_RETRIES_VAR, &raw)?;
        }
        Ok(config)
    }

    /// Applies command-line overrides on top of the environment.
    #[must_use]
    pub fn with_overrides(
        mut self,
        model: Option<String>,
        timeout_secs: Option<u64>,
        max_retries: Option<usize>,
    ) -> Self {
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(secs) = timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = max_retries {
            self.max_retries = retries;
        }
        self
    }
}

fn parse_setting<T>(name: &'static str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| AppError::InvalidSetting {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| env.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[(API_KEY_VAR, "sk-test")])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_missing_or_blank_key() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, AppError::MissingApiKey));

        let err = AppConfig::from_lookup(lookup(&[(API_KEY_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, AppError::MissingApiKey));
    }

    #[test]
    fn test_env_values() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "sk-test"),
            (MODEL_VAR, "gpt-4o"),
            (TIMEOUT_VAR, "15"),
            (MAX_RETRIES_VAR, "0"),
        ]))
        .unwrap();

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_invalid_number() {
        let err = AppConfig::from_lookup(lookup(&[(API_KEY_VAR, "sk-test"), (MAX_RETRIES_VAR, "-1")]))
            .unwrap_err();
        assert!(err.to_string().contains(MAX_RETRIES_VAR));
    }

    #[test]
    fn test_flags_override_env() {
        let config = AppConfig::default().with_overrides(Some("gpt-4.1".into()), Some(5), None);
        assert_eq!(config.model, "gpt-4.1");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 3);
    }
}
