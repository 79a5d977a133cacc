//! Ownership-proof challenges.
//!
//! A challenge is the string `"<address>:<unixSeconds>:<domainTag>"`. The
//! client signs it with the key behind `address` and hands it back with its
//! submission. Issuing one records nothing; freshness is checked purely from
//! the embedded timestamp.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::LedgerError;

/// A parsed ownership challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipChallenge {
    pub address: String,
    pub timestamp: u64,
    pub domain_tag: String,
}

impl OwnershipChallenge {
    pub fn new(address: impl Into<String>, timestamp: u64, domain_tag: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            timestamp,
            domain_tag: domain_tag.into(),
        }
    }

    /// Seconds between the challenge timestamp and `now`. Negative when the
    /// challenge claims to come from the future. Saturates at the `i64`
    /// bounds.
    pub fn elapsed(&self, now: u64) -> i64 {
        let diff = i128::from(now) - i128::from(self.timestamp);
        diff.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }
}

impl fmt::Display for OwnershipChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.address, self.timestamp, self.domain_tag)
    }
}

impl FromStr for OwnershipChallenge {
    type Err = LedgerError;

    /// Splits on the last two colons, so an address containing `:` still
    /// round-trips.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let (Some(domain_tag), Some(timestamp), Some(address)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(LedgerError::MalformedChallenge(format!(
                "expected address:timestamp:tag, got {s:?}"
            )));
        };

        if address.is_empty() {
            return Err(LedgerError::MalformedChallenge("empty address".into()));
        }

        let timestamp = timestamp.parse::<u64>().map_err(|_| {
            LedgerError::MalformedChallenge(format!("timestamp {timestamp:?} is not a number"))
        })?;

        Ok(Self::new(address, timestamp, domain_tag))
    }
}

/// What a client gets back when it asks for a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub wallet_address: String,
    pub request_time_stamp: u64,
    pub message: String,
    /// Seconds the signed message stays acceptable.
    pub validation_window: u64,
}
