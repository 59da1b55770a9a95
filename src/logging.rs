//! Tracing subscriber setup shared by the binaries.
use std::env;
use std::io::IsTerminal;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Resolve the log level from `FORECAST_LOG_LEVEL`, defaulting to `info`
fn level_from(value: Option<&str>) -> &'static str {
    match value {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ => "info",
    }
}

/// Decide whether output should be colored from a `FORCE_COLOR` value
fn color_from(value: Option<&str>, is_terminal: bool) -> bool {
    match value {
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") => false,
        _ => is_terminal,
    }
}

/// Initialize the global tracing subscriber for structured logging.
///
/// - Log level from `RUST_LOG` if set, otherwise `FORECAST_LOG_LEVEL`
///   (`trace`, `debug`, `info`, `warn`, `error`; default `info`)
/// - Color output forced with `FORCE_COLOR=1|true|yes`, disabled with
///   `FORCE_COLOR=0|false|no`, auto-detected from the TTY otherwise
/// - Span events from `FORECAST_SPAN_EVENTS`: `full`, `enter_exit`, or
///   close events only
///
/// Logs go to stderr so stdout only carries the final report.
/// Call once at startup; later calls are ignored.
pub fn init_tracing() {
    // ---
    let span_events = match env::var("FORECAST_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = color_from(env::var("FORCE_COLOR").ok().as_deref(), std::io::stderr().is_terminal());

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level_from(env::var("FORECAST_LOG_LEVEL").ok().as_deref()))
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .try_init();
}
