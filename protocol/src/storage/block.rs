//! # Block Structure
//!
//! A block is one ledger entry: an opaque JSON payload, its position in the
//! chain, the digest of the block before it, a creation timestamp, the
//! wallet it was credited to (if any) and its own digest.
//!
//! ## Block Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  height: u64                                │
//! │  previous_hash: Option<[u8; 32]>  (None @0) │
//! │  timestamp: u64            (Unix seconds)   │
//! │  owner: Option<String>     (wallet address) │
//! │  payload: serde_json::Value                 │
//! ├─────────────────────────────────────────────┤
//! │  hash: [u8; 32]   BLAKE3 of everything above│
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Hash Computation
//!
//! The preimage is length-prefixed so no two distinct field assignments can
//! produce the same byte string:
//!
//! ```text
//! height (u64 LE)
//! || 0x00                          if previous_hash is None
//! || 0x01 || previous_hash         otherwise
//! || timestamp (u64 LE)
//! || 0x00                          if owner is None
//! || 0x01 || len (u64 LE) || owner otherwise
//! || len (u64 LE) || canonical_json(payload)
//! ```
//!
//! The `hash` field itself is never part of the preimage.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GENESIS_PAYLOAD;
use crate::crypto::hash::{blake3_hash_multi, canonical_json};

/// A single ledger entry.
///
/// Construct with [`Block::new`]; the chain stamps `height`,
/// `previous_hash`, `timestamp` and `hash` when it appends the block. Once
/// appended, any change to a field other than `hash` makes
/// [`validate`](Block::validate) return `false`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain. Genesis is 0.
    pub height: u64,
    /// Digest of the block at `height - 1`. `None` for genesis.
    pub previous_hash: Option<[u8; 32]>,
    /// Unix timestamp (seconds) assigned at append time.
    pub timestamp: u64,
    /// Wallet address credited with this block by an authenticated submit.
    pub owner: Option<String>,
    /// The record itself, opaque to the chain.
    pub payload: Value,
    /// BLAKE3 digest over every other field.
    pub hash: [u8; 32],
}

impl Block {
    /// Unsealed block carrying `payload`. Linkage, height, time and digest
    /// are left empty until the chain appends it.
    pub fn new(payload: Value) -> Self {
        Self {
            height: 0,
            previous_hash: None,
            timestamp: 0,
            owner: None,
            payload,
            hash: [0u8; 32],
        }
    }

    /// Unsealed block credited to `owner`.
    pub fn with_owner(payload: Value, owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            ..Self::new(payload)
        }
    }

    /// Unsealed genesis block.
    pub fn genesis() -> Self {
        Self::new(Value::String(GENESIS_PAYLOAD.to_string()))
    }

    /// The payload as stored. Payloads are never transformed on the way in,
    /// so there is nothing to undo on the way out.
    pub fn decode(&self) -> &Value {
        &self.payload
    }

    /// Recompute the digest from the block's current fields.
    pub fn compute_hash(&self) -> [u8; 32] {
        let height = self.height.to_le_bytes();
        let timestamp = self.timestamp.to_le_bytes();

        let (prev_flag, prev_bytes): (&[u8], &[u8]) = match &self.previous_hash {
            Some(prev) => (&[1u8], prev),
            None => (&[0u8], &[]),
        };

        let owner_len;
        let (owner_flag, owner_len_bytes, owner_bytes): (&[u8], &[u8], &[u8]) = match &self.owner
        {
            Some(owner) => {
                owner_len = (owner.len() as u64).to_le_bytes();
                (&[1u8], &owner_len, owner.as_bytes())
            }
            None => (&[0u8], &[], &[]),
        };

        let payload = canonical_json(&self.payload);
        let payload_len = (payload.len() as u64).to_le_bytes();

        blake3_hash_multi(&[
            &height,
            prev_flag,
            prev_bytes,
            &timestamp,
            owner_flag,
            owner_len_bytes,
            owner_bytes,
            &payload_len,
            payload.as_bytes(),
        ])
    }

    /// `true` iff the stored digest still matches the block's content.
    ///
    /// Looks only at this block; linkage to neighbours is the chain's job.
    pub fn validate(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// The block digest as hex.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// The previous digest as hex, `None` for genesis.
    pub fn previous_hash_hex(&self) -> Option<String> {
        self.previous_hash.map(hex::encode)
    }
}

/// A block together with its decoded payload. What every lookup returns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedBlock {
    #[serde(flatten)]
    pub block: Block,
    pub decoded_payload: Value,
}

impl From<&Block> for DecodedBlock {
    fn from(block: &Block) -> Self {
        Self {
            decoded_payload: block.decode().clone(),
            block: block.clone(),
        }
    }
}
