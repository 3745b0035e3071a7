use crate::config::Config;
use common::TelemetryGuard;

/// Install the global subscriber, exporting to OTLP when an endpoint is
/// configured. Keep the returned guard alive for the lifetime of the process.
pub fn setup_logging(config: &Config) -> anyhow::Result<Option<TelemetryGuard>> {
    match &config.otel_endpoint {
        Some(endpoint) => TelemetryGuard::init(
            "gateway",
            endpoint,
            config.log_level,
            config.environment,
        )
        .map(Some),
        None => {
            common::setup_logging(config.log_level, config.environment);
            Ok(None)
        }
    }
}
