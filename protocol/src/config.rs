//! # Protocol Configuration & Constants
//!
//! Every magic number in the notary lives here. The genesis payload and the
//! digest layout are effectively frozen once a ledger has been written to
//! disk: change them and every stored block stops validating.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Crate-independent protocol version, reported by the node's `/status`.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Chain Parameters
// ---------------------------------------------------------------------------

/// Payload sealed into the genesis block at height 0.
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

/// Domain tag appended to every ownership challenge. Binds a signature to
/// this registry so it can't be replayed against some other service that
/// happens to sign `address:timestamp` strings.
pub const OWNERSHIP_DOMAIN_TAG: &str = "starRegistry";

/// How long a signed ownership challenge stays valid. Five minutes, measured
/// in seconds against the timestamp embedded in the challenge.
pub const DEFAULT_VALIDATION_WINDOW: Duration = Duration::from_secs(300);

/// Challenges stamped this far in the future are still accepted. Covers the
/// second-boundary race between issuing and checking on the same host.
pub const DEFAULT_MAX_CLOCK_SKEW: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default HTTP API port.
pub const DEFAULT_RPC_PORT: u16 = 8000;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 8001;

// ---------------------------------------------------------------------------
// ChainConfig
// ---------------------------------------------------------------------------

/// Runtime knobs for submission checks.
///
/// The defaults match the constants above. The node maps its CLI flags onto
/// this struct; tests shrink the window to exercise expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Maximum age of a signed challenge.
    pub validation_window: Duration,
    /// Maximum amount a challenge timestamp may lead the local clock.
    pub max_clock_skew: Duration,
    /// Tag expected as the third field of every challenge.
    pub domain_tag: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            validation_window: DEFAULT_VALIDATION_WINDOW,
            max_clock_skew: DEFAULT_MAX_CLOCK_SKEW,
            domain_tag: OWNERSHIP_DOMAIN_TAG.to_string(),
        }
    }
}

impl ChainConfig {
    /// Override the validation window, keeping everything else.
    pub fn with_validation_window(mut self, window: Duration) -> Self {
        self.validation_window = window;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_constants() {
        let config = ChainConfig::default();
        assert_eq!(config.validation_window, DEFAULT_VALIDATION_WINDOW);
        assert_eq!(config.max_clock_skew, DEFAULT_MAX_CLOCK_SKEW);
        assert_eq!(config.domain_tag, OWNERSHIP_DOMAIN_TAG);
    }

    #[test]
    fn validation_window_is_five_minutes() {
        // Seconds, not minutes. The window must actually be able to expire.
        assert_eq!(DEFAULT_VALIDATION_WINDOW.as_secs(), 300);
        assert!(DEFAULT_MAX_CLOCK_SKEW < DEFAULT_VALIDATION_WINDOW);
    }

    #[test]
    fn domain_tag_has_no_separator() {
        // The challenge format is colon-delimited; a colon in the tag would
        // make it unparseable.
        assert!(!OWNERSHIP_DOMAIN_TAG.contains(':'));
    }

    #[test]
    fn with_validation_window_overrides_only_window() {
        let config = ChainConfig::default().with_validation_window(Duration::from_secs(1));
        assert_eq!(config.validation_window, Duration::from_secs(1));
        assert_eq!(config.domain_tag, OWNERSHIP_DOMAIN_TAG);
    }
}
