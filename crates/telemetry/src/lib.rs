//! Logging and tracing bootstrap.

use anyhow::anyhow;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quotes_kernel::settings::{LogFormat, TelemetrySettings};

/// Install the global tracing subscriber. Events go to stderr so stdout
/// stays free for command output.
///
/// `RUST_LOG` takes precedence over `telemetry.filter`. Calling this twice
/// returns an error instead of panicking.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = build_filter(settings);

    let result = match settings.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .try_init(),
    };

    result.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::debug!(
        target: "quotes-telemetry",
        format = ?settings.log_format,
        "telemetry initialized"
    );
    Ok(())
}

fn build_filter(settings: &TelemetrySettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_falls_back() {
        let settings = TelemetrySettings {
            filter: "[[not a filter".to_string(),
            log_format: LogFormat::Pretty,
        };
        // Must not panic regardless of RUST_LOG in the test environment.
        let _ = build_filter(&settings);
    }

    #[test]
    fn second_init_is_an_error_not_a_panic() {
        let settings = TelemetrySettings::default();
        let _ = init(&settings);
        assert!(init(&settings).is_err());
    }
}
