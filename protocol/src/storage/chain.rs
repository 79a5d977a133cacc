//! # Chain
//!
//! The ordered block sequence plus the wallet → heights ownership index.
//!
//! ## Invariants
//!
//! - `blocks[h].height == h` for every block appended through [`Chain::append`].
//! - `blocks[h].previous_hash == Some(blocks[h - 1].hash)`, and `None` at 0.
//! - The ownership index equals what [`Chain::rebuild_ownership_index`]
//!   computes from the `owner` fields.
//!
//! `append` is the only way a block gets in. It takes `&mut self`, so a
//! plain `Chain` is single-writer by construction; share it across threads
//! through [`Ledger`](super::ledger::Ledger), which adds the lock.
//!
//! ## Validation
//!
//! [`Chain::validate_chain`] walks the sequence once. A block whose content
//! no longer matches its digest gets a content finding. Its successor then
//! points at a digest that no longer describes the block in front of it, so
//! the successor gets a linkage finding. Each link is compared against the
//! predecessor's *stored* digest, and when that matches, against what the
//! predecessor's content hashes to now. A block that was never touched
//! recomputes to its stored digest, so one tampered block costs exactly
//! those two findings and nothing further down the chain.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::block::{Block, DecodedBlock};
use super::error::LedgerError;
use super::ownership::OwnershipChallenge;
use crate::config::ChainConfig;
use crate::crypto::signatures::SignatureVerifier;

// ---------------------------------------------------------------------------
// Integrity findings
// ---------------------------------------------------------------------------

/// One problem found by [`Chain::validate_chain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// The block's `previous_hash` does not match its predecessor.
    BrokenLink {
        height: u64,
        hash: [u8; 32],
        expected: Option<[u8; 32]>,
        found: Option<[u8; 32]>,
    },
    /// The block's content no longer hashes to its stored digest.
    ContentTampered {
        height: u64,
        hash: [u8; 32],
        recomputed: [u8; 32],
    },
}

impl IntegrityViolation {
    /// Position of the offending block in the sequence.
    pub fn height(&self) -> u64 {
        match self {
            Self::BrokenLink { height, .. } | Self::ContentTampered { height, .. } => *height,
        }
    }

    /// Stored digest of the offending block.
    pub fn hash(&self) -> [u8; 32] {
        match self {
            Self::BrokenLink { hash, .. } | Self::ContentTampered { hash, .. } => *hash,
        }
    }
}

fn fmt_digest(digest: &Option<[u8; 32]>) -> String {
    digest.map(hex::encode).unwrap_or_else(|| "none".to_string())
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BrokenLink {
                height,
                hash,
                expected,
                found,
            } => write!(
                f,
                "block {} ({}) has a broken link: previous hash is {}, expected {}",
                height,
                hex::encode(hash),
                fmt_digest(found),
                fmt_digest(expected),
            ),
            Self::ContentTampered {
                height,
                hash,
                recomputed,
            } => write!(
                f,
                "block {} ({}) has been tampered with: content hashes to {}",
                height,
                hex::encode(hash),
                hex::encode(recomputed),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Current Unix time in whole seconds.
pub(crate) fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// The block sequence and its ownership index.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    blocks: Vec<Block>,
    /// Wallet address → heights, in submission order.
    ownership: HashMap<String, Vec<u64>>,
    config: ChainConfig,
}

impl Chain {
    /// An empty, uninitialized chain (`height() == -1`).
    pub fn new(config: ChainConfig) -> Self {
        Self {
            blocks: Vec::new(),
            ownership: HashMap::new(),
            config,
        }
    }

    /// Restore a chain from a stored sequence, replaying the ownership index
    /// from the blocks' `owner` fields.
    ///
    /// Nothing is checked here. A damaged sequence loads as-is and shows up
    /// in [`validate_chain`](Self::validate_chain).
    pub fn from_blocks(config: ChainConfig, blocks: Vec<Block>) -> Self {
        let mut chain = Self {
            blocks,
            ownership: HashMap::new(),
            config,
        };
        chain.ownership = chain.rebuild_ownership_index();
        chain
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Append the genesis block if the chain is empty. Returns `true` if it
    /// did; calling it again is a no-op.
    pub fn initialize(&mut self) -> bool {
        if self.height() != -1 {
            return false;
        }
        let genesis = self.append(Block::genesis());
        info!(hash = %genesis.hash_hex(), "genesis block created");
        true
    }

    /// Current height, `-1` while uninitialized.
    pub fn height(&self) -> i64 {
        self.blocks.len() as i64 - 1
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The latest block, if any.
    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// The whole sequence, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The ownership index as maintained incrementally.
    pub fn ownership_index(&self) -> &HashMap<String, Vec<u64>> {
        &self.ownership
    }

    // -- Append path --------------------------------------------------------

    /// Stamp linkage, time, height and digest onto `block` as if it were
    /// about to be appended. Mutates nothing.
    pub(crate) fn seal(&self, mut block: Block) -> Block {
        block.previous_hash = self.tip().map(|tip| tip.hash);
        block.timestamp = unix_now();
        block.height = self.blocks.len() as u64;
        block.hash = block.compute_hash();
        block
    }

    /// Push a block produced by [`seal`](Self::seal) against the current tip.
    pub(crate) fn push_sealed(&mut self, block: Block) {
        debug_assert_eq!(block.height, self.blocks.len() as u64);
        debug!(height = block.height, hash = %block.hash_hex(), "block appended");
        self.blocks.push(block);
    }

    /// The single mutation path: seal `block` against the tip and push it.
    ///
    /// Does no authentication and no payload validation. Returns the stamped
    /// block.
    pub fn append(&mut self, block: Block) -> Block {
        let sealed = self.seal(block);
        self.push_sealed(sealed.clone());
        sealed
    }

    /// Credit `height` to `address` in the ownership index.
    pub(crate) fn credit(&mut self, address: &str, height: u64) {
        self.ownership
            .entry(address.to_string())
            .or_default()
            .push(height);
    }

    // -- Ownership ----------------------------------------------------------

    /// The challenge `address` must sign before it can submit.
    pub fn request_ownership_message(&self, address: &str) -> String {
        OwnershipChallenge::new(address, unix_now(), self.config.domain_tag.as_str()).to_string()
    }

    /// Authenticated write: check the signed challenge, then append the
    /// payload credited to `address`.
    ///
    /// On any error the chain is left untouched.
    pub fn submit(
        &mut self,
        verifier: &dyn SignatureVerifier,
        address: &str,
        message: &str,
        signature: &str,
        payload: Value,
    ) -> Result<DecodedBlock, LedgerError> {
        authenticate(&self.config, verifier, address, message, signature, unix_now())?;

        let block = self.append(Block::with_owner(payload, address));
        self.credit(address, block.height);
        Ok(DecodedBlock::from(&block))
    }

    // -- Lookups ------------------------------------------------------------

    /// The block at `height`, or `None` for negative or out-of-range heights.
    pub fn block_by_height(&self, height: i64) -> Option<DecodedBlock> {
        let index = usize::try_from(height).ok()?;
        self.blocks.get(index).map(DecodedBlock::from)
    }

    /// The first block (lowest height) whose digest equals `hash`.
    pub fn block_by_hash(&self, hash: &[u8; 32]) -> Option<DecodedBlock> {
        self.blocks
            .iter()
            .find(|block| &block.hash == hash)
            .map(DecodedBlock::from)
    }

    /// [`block_by_hash`](Self::block_by_hash) for a hex digest. Anything that
    /// isn't 32 bytes of hex simply isn't found.
    pub fn block_by_hash_hex(&self, hash: &str) -> Option<DecodedBlock> {
        let bytes = hex::decode(hash).ok()?;
        let hash: [u8; 32] = bytes.as_slice().try_into().ok()?;
        self.block_by_hash(&hash)
    }

    /// Every block credited to `address`, in submission order. Empty for
    /// unknown addresses.
    pub fn stars_by_wallet_address(&self, address: &str) -> Vec<DecodedBlock> {
        self.ownership
            .get(address)
            .map(|heights| {
                heights
                    .iter()
                    .filter_map(|&h| i64::try_from(h).ok())
                    .filter_map(|h| self.block_by_height(h))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Recompute the ownership index by replaying the sequence.
    pub fn rebuild_ownership_index(&self) -> HashMap<String, Vec<u64>> {
        let mut index: HashMap<String, Vec<u64>> = HashMap::new();
        for (height, block) in self.blocks.iter().enumerate() {
            if let Some(owner) = &block.owner {
                index.entry(owner.clone()).or_default().push(height as u64);
            }
        }
        index
    }

    // -- Validation ---------------------------------------------------------

    /// Walk the chain from genesis and report every integrity problem, in
    /// height order. An empty list means the chain is intact.
    pub fn validate_chain(&self) -> Vec<IntegrityViolation> {
        let mut findings = Vec::new();
        // Stored and recomputed digests of the predecessor. They differ only
        // when the predecessor itself was tampered with.
        let mut expected_previous: Option<[u8; 32]> = None;
        let mut predecessor_content: Option<[u8; 32]> = None;

        for (index, block) in self.blocks.iter().enumerate() {
            let height = index as u64;

            if block.previous_hash != expected_previous {
                findings.push(IntegrityViolation::BrokenLink {
                    height,
                    hash: block.hash,
                    expected: expected_previous,
                    found: block.previous_hash,
                });
            } else if block.previous_hash != predecessor_content {
                // Points at a digest its predecessor's content no longer has.
                findings.push(IntegrityViolation::BrokenLink {
                    height,
                    hash: block.hash,
                    expected: predecessor_content,
                    found: block.previous_hash,
                });
            }

            let recomputed = block.compute_hash();
            if recomputed != block.hash {
                findings.push(IntegrityViolation::ContentTampered {
                    height,
                    hash: block.hash,
                    recomputed,
                });
            }

            expected_previous = Some(block.hash);
            predecessor_content = Some(recomputed);
        }

        for finding in &findings {
            warn!(height = finding.height(), "{}", finding);
        }
        findings
    }
}

/// Check a signed ownership challenge against `address`.
///
/// Order matters: the signature is checked first, so an unauthenticated
/// caller learns nothing about which part of its challenge was wrong.
pub(crate) fn authenticate(
    config: &ChainConfig,
    verifier: &dyn SignatureVerifier,
    address: &str,
    message: &str,
    signature: &str,
    now: u64,
) -> Result<(), LedgerError> {
    let result = check_challenge(config, verifier, address, message, signature, now);
    if let Err(e) = &result {
        warn!(address, error = %e, "submission rejected");
    }
    result
}

fn check_challenge(
    config: &ChainConfig,
    verifier: &dyn SignatureVerifier,
    address: &str,
    message: &str,
    signature: &str,
    now: u64,
) -> Result<(), LedgerError> {
    if !verifier.verify(message, address, signature) {
        return Err(LedgerError::Authentication);
    }

    let challenge: OwnershipChallenge = message.parse()?;

    if challenge.address != address {
        return Err(LedgerError::ChallengeMismatch(format!(
            "challenge was issued to {}",
            challenge.address
        )));
    }
    if challenge.domain_tag != config.domain_tag {
        return Err(LedgerError::ChallengeMismatch(format!(
            "unexpected domain tag {:?}",
            challenge.domain_tag
        )));
    }

    let elapsed = challenge.elapsed(now);
    let window = config.validation_window.as_secs();
    let max_age = i64::try_from(window).unwrap_or(i64::MAX);
    let skew = i64::try_from(config.max_clock_skew.as_secs()).unwrap_or(i64::MAX);
    if elapsed > max_age || elapsed < -skew {
        return Err(LedgerError::ChallengeExpired { elapsed, window });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
