//! Logging and observability infrastructure for promptlift
//!
//! Structured logging via `tracing`, plus helpers that give every enhancement
//! call the same span and terminal-event shape.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Credential shapes that must never reach a log line or a result message.
static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"sk-ant-[A-Za-z0-9_\-]{8,}",
        r"sk-or-[A-Za-z0-9_\-]{8,}",
        r"sk-[A-Za-z0-9_\-]{20,}",
        r"(?i)bearer\s+[A-Za-z0-9_\-\.=]{8,}",
        r"(?i)(x-api-key|api[_-]?key)\s*[:=]\s*[^\s,;]+",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Initialize tracing subscriber for structured logging
///
/// Compact human-readable output by default; verbose mode adds targets and
/// span close events (which carry span durations). `RUST_LOG` always wins.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("promptlift=debug,info")
            } else {
                EnvFilter::try_new("promptlift=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Install a JSON-lines subscriber, for callers that ship logs to a collector.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_json_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("promptlift=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_current_span(true))
        .try_init()?;

    Ok(())
}

/// Span wrapping one enhancement call.
#[must_use]
pub fn enhance_span(prompt_chars: usize, project: Option<&str>, timeout_ms: u128) -> tracing::Span {
    span!(
        Level::INFO,
        "enhance",
        prompt_chars = prompt_chars,
        project = project.unwrap_or("-"),
        timeout_ms = %timeout_ms,
    )
}

/// Log the start of an enhancement call
pub fn log_enhance_start(context_injected: bool, rendered_chars: usize) {
    info!(
        context_injected = context_injected,
        rendered_chars = rendered_chars,
        "Starting enhancement"
    );
}

/// Log a terminal outcome that is not a failure (completed or cancelled)
pub fn log_enhance_complete(outcome: &str, duration_ms: u128) {
    info!(
        outcome = %outcome,
        duration_ms = %duration_ms,
        "Enhancement finished"
    );
}

/// Log a failed enhancement (timeout or external failure)
///
/// Error text is redacted before it is emitted.
pub fn log_enhance_failed(outcome: &str, error: &str, duration_ms: u128) {
    let sanitized = redact_secrets(error);
    error!(
        outcome = %outcome,
        duration_ms = %duration_ms,
        error = %sanitized,
        "Enhancement failed"
    );
}

/// Replace anything shaped like an API credential with `[REDACTED]`.
#[must_use]
pub fn redact_secrets(message: &str) -> String {
    let mut redacted = message.to_string();
    for pattern in SECRET_PATTERNS.iter() {
        redacted = pattern.replace_all(&redacted, "[REDACTED]").into_owned();
    }
    redacted
}
