//! Telemetry & Observability
//!
//! Structured logging for CLI operations.
//! Features:
//! - API request spans with timing and outcome
//! - Configurable log levels via RUST_LOG, or `--verbose`
//! - Secret redaction and control-character escaping before anything is logged
//!
//! Logs always go to stderr so stdout only carries command output.

use regex::Regex;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sanitize a string for safe log output by escaping control characters.
/// Prevents log injection where a server response embeds newlines to forge log entries.
pub fn sanitize_for_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x1b' => out.push_str("\\e"),
            '\x00' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            _ => out.push(c),
        }
    }
    out
}

/// Compiled regex patterns for secret redaction.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        vec![
            // Authorization header values: "apikey <token>"
            Regex::new(r"(?i)apikey\s+\S+").expect("invalid apikey regex"),
            // Bearer tokens
            Regex::new(r"(?i)Bearer\s+[A-Za-z0-9_\-\.]{8,}").expect("invalid bearer regex"),
            // Platform user tokens
            Regex::new(r"sgu_[A-Za-z0-9_\-]{4,}").expect("invalid token regex"),
            // Presigned upload URL signatures
            Regex::new(r"(?i)(X-Amz-Signature|X-Amz-Credential|Signature)=[^&\s]+")
                .expect("invalid signature regex"),
        ]
    })
}

/// Redact sensitive data patterns from a string before logging.
///
/// Matches `apikey` authorization values, bearer tokens, `sgu_` tokens and
/// presigned URL signatures, replacing them with `[REDACTED]`.
pub fn redact_secrets(input: &str) -> String {
    let mut result = input.to_string();
    for pattern in secret_patterns() {
        result = pattern.replace_all(&result, "[REDACTED]").to_string();
    }
    result
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` always wins. Without it, `verbose` enables `info` level for
/// this crate; otherwise nothing is installed to keep CLI output clean.
pub fn init_tracing(verbose: bool) {
    if let Ok(filter) = std::env::var("RUST_LOG") {
        init_tracing_with_filter(&filter);
    } else if verbose {
        init_tracing_with_filter("sg_cli=info");
    }
}

/// Initialize with custom filter string
pub fn init_tracing_with_filter(filter: &str) {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(false)
            .with_line_number(false)
            .with_level(true)
            .compact()
            .with_writer(std::io::stderr);

        let filter_layer = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    });
}

/// Run one API operation inside a span that records its duration and outcome.
pub async fn track_request<F, Fut, T, E>(operation: &str, f: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let span = info_span!(
        "api.request",
        operation = operation,
        duration_ms = tracing::field::Empty,
        success = tracing::field::Empty,
    );

    let result = f().instrument(span.clone()).await;
    let duration = start.elapsed().as_millis() as u64;
    span.record("duration_ms", duration);
    span.in_scope(|| match &result {
        Ok(_) => {
            span.record("success", true);
            info!(duration_ms = duration, "{} completed", operation);
        }
        Err(e) => {
            let safe_err = redact_secrets(&sanitize_for_log(&e.to_string()));
            span.record("success", false);
            error!(
                duration_ms = duration,
                error = safe_err.as_str(),
                "{} failed",
                operation
            );
        }
    });
    result
}

/// Route debug-level logs to the test harness's captured output.
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
