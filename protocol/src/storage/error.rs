//! Error types for ledger writes.
//!
//! Only writes fail. Lookups return `Option`, and integrity problems come
//! back from `validate_chain` as data.

use thiserror::Error;

use super::db::DbError;

/// Why a submission (or a store-backed ledger operation) was refused.
///
/// Every variant leaves the chain exactly as it was.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The signature did not verify for the given message and address.
    #[error("invalid signature")]
    Authentication,

    /// The signed message is not an `address:timestamp:tag` challenge.
    #[error("malformed ownership challenge: {0}")]
    MalformedChallenge(String),

    /// The challenge is well formed but was issued for someone or something
    /// else (different address or domain tag).
    #[error("ownership challenge mismatch: {0}")]
    ChallengeMismatch(String),

    /// The challenge is older than the validation window, or stamped too far
    /// in the future.
    #[error("ownership challenge expired: {elapsed}s elapsed, window is {window}s")]
    ChallengeExpired { elapsed: i64, window: u64 },

    /// The backing store refused the write.
    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}

impl LedgerError {
    /// `true` for the signature failure, the one outcome that means "you are
    /// not who you say you are" rather than "your request is malformed".
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }
}
