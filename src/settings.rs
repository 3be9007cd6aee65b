//! Runtime settings from environment variables.

use crate::error::ConfigError;
use crate::sequence::RetryPolicy;
use crate::sql::validate_identifier;
use std::str::FromStr;
use std::time::Duration;

/// How the list engine obtains `total_record`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CountStrategy {
    /// COUNT query, then page query. Two round-trips; concurrent writes between them may skew the summary.
    #[default]
    Separate,
    /// `COUNT(*) OVER ()` alongside the page rows; separate count only when the page is empty.
    Window,
}

impl FromStr for CountStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "separate" => Ok(CountStrategy::Separate),
            "window" => Ok(CountStrategy::Window),
            _ => Err(ConfigError::Load(format!(
                "invalid count strategy: {} (expected separate or window)",
                s
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListSettings {
    pub default_limit: u32,
    pub max_limit: u32,
    pub count_strategy: CountStrategy,
}

impl Default for ListSettings {
    fn default() -> Self {
        ListSettings {
            default_limit: 10,
            max_limit: 100,
            count_strategy: CountStrategy::Separate,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Schema holding `_sys_sequences`.
    pub schema: String,
    pub list: ListSettings,
    pub retry: RetryPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            schema: "campus".into(),
            list: ListSettings::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = Settings::default();
        let schema = lookup("CAMPUS_SCHEMA").unwrap_or(d.schema);
        validate_identifier(&schema)?;

        let default_limit = parse_or(&lookup, "LIST_DEFAULT_LIMIT", d.list.default_limit)?;
        let max_limit = parse_or(&lookup, "LIST_MAX_LIMIT", d.list.max_limit)?;
        if default_limit == 0 || max_limit == 0 {
            return Err(ConfigError::Load("list limits must be at least 1".into()));
        }
        if default_limit > max_limit {
            return Err(ConfigError::Load(format!(
                "LIST_DEFAULT_LIMIT ({}) exceeds LIST_MAX_LIMIT ({})",
                default_limit, max_limit
            )));
        }
        let count_strategy = match lookup("LIST_COUNT_STRATEGY") {
            Some(s) => s.parse()?,
            None => d.list.count_strategy,
        };

        let max_attempts = parse_or(&lookup, "SEQUENCE_MAX_ATTEMPTS", d.retry.max_attempts)?;
        if max_attempts == 0 {
            return Err(ConfigError::Load("SEQUENCE_MAX_ATTEMPTS must be at least 1".into()));
        }
        let base_ms = parse_or(&lookup, "SEQUENCE_BACKOFF_MS", d.retry.base_delay.as_millis() as u64)?;
        let max_ms = parse_or(&lookup, "SEQUENCE_MAX_BACKOFF_MS", d.retry.max_delay.as_millis() as u64)?;

        Ok(Settings {
            schema,
            list: ListSettings {
                default_limit,
                max_limit,
                count_strategy,
            },
            retry: RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(base_ms),
                max_delay: Duration::from_millis(max_ms.max(base_ms)),
            },
        })
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Load(format!("{}: invalid value '{}'", key, v))),
    }
}
