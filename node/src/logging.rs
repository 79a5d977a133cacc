//! # Node Logging
//!
//! One `tracing` subscriber for the whole process. Ledger events (challenge
//! issued, submission accepted, chain restored with findings) come from the
//! `notary_protocol` target; request spans come from `tower_http`.
//!
//! Output goes to stderr. `keygen` and `sign` print keys and signatures on
//! stdout and callers pipe them into other tools.
//!
//! `RUST_LOG` wins over [`DEFAULT_DIRECTIVES`] when it parses. A `RUST_LOG`
//! that does not parse is reported once and then ignored.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unusable.
pub const DEFAULT_DIRECTIVES: &str = "notary_node=info,notary_protocol=info,tower_http=debug";

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Colored, with file and line. For an operator watching a terminal.
    Pretty,
    /// One JSON object per line, for shipping to a collector.
    Json,
}

impl LogFormat {
    /// `"json"` in any case selects [`LogFormat::Json`]; anything else is
    /// [`LogFormat::Pretty`].
    pub fn from_str_lossy(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Build the filter from an optional `RUST_LOG` value.
///
/// Returns the filter plus the rejected value when `rust_log` was set but
/// could not be parsed.
pub fn build_filter(rust_log: Option<&str>, default_directives: &str) -> (EnvFilter, Option<String>) {
    match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => match EnvFilter::try_new(spec) {
            Ok(filter) => (filter, None),
            Err(_) => (EnvFilter::new(default_directives), Some(spec.to_string())),
        },
        None => (EnvFilter::new(default_directives), None),
    }
}

/// Install the global subscriber. Must be called once, before the ledger is
/// opened, so restore findings are not lost.
pub fn init_logging(default_directives: &str, format: LogFormat) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let (filter, rejected) = build_filter(rust_log.as_deref(), default_directives);

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true))
            .init(),
    }

    if let Some(value) = rejected {
        tracing::warn!(rust_log = %value, fallback = default_directives, "RUST_LOG not understood");
    }
    tracing::debug!(?format, "logging ready");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(filter: &EnvFilter) -> String {
        filter.to_string().to_lowercase()
    }

    #[test]
    fn format_parsing_is_lossy() {
        assert_eq!(LogFormat::from_str_lossy("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_lossy("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_lossy("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str_lossy("yaml"), LogFormat::Pretty);
    }

    #[test]
    fn rust_log_overrides_defaults() {
        let (filter, rejected) = build_filter(Some("notary_protocol=trace"), DEFAULT_DIRECTIVES);
        assert!(rejected.is_none());
        let text = rendered(&filter);
        assert!(text.contains("notary_protocol=trace"));
        assert!(!text.contains("tower_http"));
    }

    #[test]
    fn unset_or_blank_rust_log_uses_defaults() {
        for value in [None, Some(""), Some("   ")] {
            let (filter, rejected) = build_filter(value, DEFAULT_DIRECTIVES);
            assert!(rejected.is_none());
            assert!(rendered(&filter).contains("notary_node=info"));
        }
    }

    #[test]
    fn unparsable_rust_log_falls_back() {
        let (filter, rejected) = build_filter(Some("notary_node=loudest"), DEFAULT_DIRECTIVES);
        assert_eq!(rejected.as_deref(), Some("notary_node=loudest"));
        assert!(rendered(&filter).contains("notary_protocol=info"));
    }
}
