//! Global subscriber setup.
//!
//! `RUST_LOG` picks the filter, `LOG_FORMAT=json` switches to JSON lines and
//! `ENVIRONMENT` is stamped on the startup record.

use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const FALLBACK_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than `json` (any case) is pretty.
    fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub service_name: String,
    pub environment: String,
    pub format: LogFormat,
    /// Raw `RUST_LOG` directives
    pub level: String,
}

impl TracingConfig {
    /// Settings for `service_name` read from the process environment.
    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self::from_lookup(service_name, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(service_name: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            service_name: service_name.into(),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()),
            format: LogFormat::from_setting(lookup("LOG_FORMAT").as_deref()),
            level: lookup("RUST_LOG").unwrap_or_else(|| FALLBACK_LEVEL.to_string()),
        }
    }

    /// Filter for `level`, or plain `info` when the directives do not parse.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL))
    }
}

/// Install the global subscriber.
///
/// Only the sink is process-wide; components receive their own `Span`
/// through their constructors and log under it.
pub fn init_tracing(config: TracingConfig) {
    let registry = tracing_subscriber::registry().with(config.filter());

    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).init(),
    }

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        format = ?config.format,
        "Tracing initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> TracingConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TracingConfig::from_lookup("subscription-service", |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_pretty_info_in_dev() {
        let config = config_with(&[]);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.level, "info");
        assert_eq!(config.environment, "dev");
    }

    #[test]
    fn log_format_selects_json() {
        assert_eq!(config_with(&[("LOG_FORMAT", "json")]).format, LogFormat::Json);
        assert_eq!(config_with(&[("LOG_FORMAT", "JSON")]).format, LogFormat::Json);
        assert_eq!(config_with(&[("LOG_FORMAT", "yaml")]).format, LogFormat::Pretty);
    }

    #[test]
    fn valid_directives_are_kept() {
        let config = config_with(&[("RUST_LOG", "subtrack_database=debug,warn")]);
        assert_eq!(
            config.filter().to_string(),
            EnvFilter::new("subtrack_database=debug,warn").to_string()
        );
    }

    #[test]
    fn unparsable_directives_fall_back_to_info() {
        let config = config_with(&[("RUST_LOG", "subtrack=loudest")]);
        assert!(EnvFilter::try_new(&config.level).is_err());
        assert_eq!(
            config.filter().to_string(),
            EnvFilter::new(FALLBACK_LEVEL).to_string()
        );
    }
}
