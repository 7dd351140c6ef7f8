//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber described by `config`.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(config: &ObservabilityConfig) {
    let mut fallback_reasons = config.fallback_reasons.clone();
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|err| {
        fallback_reasons.push(format!(
            "log filter {:?} is not valid ({err}); using info",
            config.filter
        ));
        EnvFilter::new("info")
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Pretty => builder.pretty().try_init().is_ok(),
        LogFormat::Compact => builder.compact().try_init().is_ok(),
    };

    if installed {
        for reason in &fallback_reasons {
            ::tracing::warn!("{reason}");
        }
    }
}
