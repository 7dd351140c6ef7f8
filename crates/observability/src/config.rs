//! Logging configuration read from the environment.
//!
//! - `RUST_LOG`: filter directives (default `info`)
//! - `BILLING_LOG_FORMAT`: `json` (default), `pretty` or `compact`

use tracing_subscriber::EnvFilter;

pub const FILTER_VAR: &str = "RUST_LOG";
pub const FORMAT_VAR: &str = "BILLING_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub filter: String,
    pub format: LogFormat,
    /// One entry per unusable value replaced by a default. Logged once the
    /// subscriber is up.
    pub fallback_reasons: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::default(),
            fallback_reasons: Vec::new(),
        }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(filter) = lookup(FILTER_VAR).filter(|f| !f.trim().is_empty()) {
            match EnvFilter::try_new(&filter) {
                Ok(_) => config.filter = filter,
                Err(err) => config.fallback_reasons.push(format!(
                    "{FILTER_VAR}={filter:?} is not a valid filter ({err}); using {DEFAULT_FILTER}"
                )),
            }
        }

        if let Some(raw) = lookup(FORMAT_VAR) {
            match LogFormat::parse(&raw) {
                Some(format) => config.format = format,
                None => config
                    .fallback_reasons
                    .push(format!("{FORMAT_VAR}={raw:?} is not recognized; using json")),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_to_info_json() {
        let config = ObservabilityConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ObservabilityConfig::default());
        assert_eq!(config.filter, "info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn reads_filter_and_format() {
        let config = ObservabilityConfig::from_lookup(lookup_from(&[
            (FILTER_VAR, "billing_invoicing=debug"),
            (FORMAT_VAR, " Pretty "),
        ]));
        assert_eq!(config.filter, "billing_invoicing=debug");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.fallback_reasons.is_empty());
    }

    #[test]
    fn unknown_format_falls_back_to_json() {
        let config = ObservabilityConfig::from_lookup(lookup_from(&[(FORMAT_VAR, "xml")]));
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.fallback_reasons.len(), 1);
        assert!(config.fallback_reasons[0].contains("xml"));
    }

    #[test]
    fn invalid_filter_falls_back_to_info_with_reason() {
        let config =
            ObservabilityConfig::from_lookup(lookup_from(&[(FILTER_VAR, "billing_invoicing=loud")]));
        assert_eq!(config.filter, "info");
        assert_eq!(config.fallback_reasons.len(), 1);
        assert!(config.fallback_reasons[0].starts_with("RUST_LOG=\"billing_invoicing=loud\""));
    }

    #[test]
    fn filter_and_format_fallbacks_are_both_kept() {
        let config = ObservabilityConfig::from_lookup(lookup_from(&[
            (FILTER_VAR, "billing_invoicing=loud"),
            (FORMAT_VAR, "xml"),
        ]));
        assert_eq!((config.filter.as_str(), config.format), ("info", LogFormat::Json));
        assert_eq!(config.fallback_reasons.len(), 2);
    }

    #[test]
    fn blank_filter_keeps_default() {
        let config = ObservabilityConfig::from_lookup(lookup_from(&[(FILTER_VAR, "  ")]));
        assert_eq!(config.filter, "info");
        assert!(config.fallback_reasons.is_empty());
    }
}
