//! Tracing subscriber setup. Logs always go to stderr so stdout stays clean
//! for the dataset.

use std::str::FromStr;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn";

/// Install the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn setup_logging(log_level: &str, json_format: bool) {
    let directives = filter_directives(log_level);
    let filter = EnvFilter::from_str(&directives).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_current_span(false);
        subscriber.with(json_layer).try_init().is_ok()
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact();
        subscriber.with(fmt_layer).try_init().is_ok()
    };

    if installed {
        tracing::debug!(
            filter = %directives,
            format = if json_format { "json" } else { "compact" },
            "logging initialized"
        );
    }
}

/// A bare level (e.g. `debug`) gets quiet defaults for HTTP internals;
/// explicit directive strings (with `,` or `=`) are used as-is.
fn filter_directives(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.is_empty() {
        return format!("warn,{QUIET_DEPENDENCIES}");
    }
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!("{normalized},{QUIET_DEPENDENCIES}")
    }
}
