//! # Ledger - Shared Chain Handle
//!
//! A [`Chain`] is single-writer by construction (`&mut self`). The `Ledger`
//! is how a multi-threaded host, such as the HTTP node, shares one.
//!
//! ## Locking
//!
//! ```text
//! submit:  verify signature + challenge     (no lock)
//!          ── write lock ─────────────────────────────
//!          seal against tip → persist → push → credit
//!          ───────────────────────────────────────────
//! reads:   ── read lock ── lookup / validate ─────────
//! ```
//!
//! Signature verification happens before the write lock so a slow verifier
//! never stalls readers. Everything that changes the chain happens inside a
//! single write critical section, so readers see either none of a
//! submission or all of it.
//!
//! When a [`LedgerDb`] is attached the block is written to disk between
//! sealing and pushing. A failed write returns an error and leaves the
//! in-memory chain untouched.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{info, warn};

use super::block::{Block, DecodedBlock};
use super::chain::{authenticate, unix_now, Chain, IntegrityViolation};
use super::db::LedgerDb;
use super::error::LedgerError;
use super::ownership::{ChallengeResponse, OwnershipChallenge};
use crate::config::ChainConfig;
use crate::crypto::signatures::{Ed25519Verifier, SignatureVerifier};

/// Thread-safe, always-initialized handle over a [`Chain`].
///
/// Cheap to clone; clones share the same chain.
#[derive(Clone)]
pub struct Ledger {
    chain: Arc<RwLock<Chain>>,
    verifier: Arc<dyn SignatureVerifier>,
    db: Option<LedgerDb>,
    config: ChainConfig,
}

impl Ledger {
    /// In-memory ledger using Ed25519 verification. Genesis is in place
    /// before this returns.
    pub fn new(config: ChainConfig) -> Self {
        Self::with_verifier(config, Arc::new(Ed25519Verifier))
    }

    /// In-memory ledger with a custom verifier.
    pub fn with_verifier(config: ChainConfig, verifier: Arc<dyn SignatureVerifier>) -> Self {
        let mut chain = Chain::new(config.clone());
        chain.initialize();
        Self {
            chain: Arc::new(RwLock::new(chain)),
            verifier,
            db: None,
            config,
        }
    }

    /// Ledger backed by `db`, using Ed25519 verification.
    ///
    /// An empty store gets a genesis block, persisted immediately. A
    /// populated one is loaded as-is and checked once; findings are logged,
    /// not fatal.
    pub fn open(config: ChainConfig, db: LedgerDb) -> Result<Self, LedgerError> {
        Self::open_with_verifier(config, db, Arc::new(Ed25519Verifier))
    }

    pub fn open_with_verifier(
        config: ChainConfig,
        db: LedgerDb,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Result<Self, LedgerError> {
        let blocks = db.load_chain()?;

        let chain = if blocks.is_empty() {
            let mut chain = Chain::new(config.clone());
            let genesis = chain.seal(Block::genesis());
            db.put_block(&genesis)?;
            chain.push_sealed(genesis);
            info!("empty store, genesis block persisted");
            chain
        } else {
            let chain = Chain::from_blocks(config.clone(), blocks);
            let findings = chain.validate_chain();
            if findings.is_empty() {
                info!(height = chain.height(), "chain restored from store");
            } else {
                warn!(
                    height = chain.height(),
                    findings = findings.len(),
                    "chain restored from store with integrity findings"
                );
            }
            chain
        };

        Ok(Self {
            chain: Arc::new(RwLock::new(chain)),
            verifier,
            db: Some(db),
            config,
        })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// `true` when blocks are mirrored to a store.
    pub fn is_persistent(&self) -> bool {
        self.db.is_some()
    }

    /// Current height. Never `-1` for a `Ledger`.
    pub fn height(&self) -> i64 {
        self.chain.read().height()
    }

    /// Issue an ownership challenge for `address`.
    pub fn request_ownership_message(&self, address: &str) -> String {
        self.chain.read().request_ownership_message(address)
    }

    /// Issue a challenge wrapped in the response shape clients receive.
    pub fn request_validation(&self, address: &str) -> ChallengeResponse {
        let challenge = OwnershipChallenge::new(address, unix_now(), self.config.domain_tag.as_str());
        ChallengeResponse {
            wallet_address: address.to_string(),
            request_time_stamp: challenge.timestamp,
            message: challenge.to_string(),
            validation_window: self.config.validation_window.as_secs(),
        }
    }

    /// Authenticated write. See [`Chain::submit`] for the checks.
    pub fn submit(
        &self,
        address: &str,
        message: &str,
        signature: &str,
        payload: Value,
    ) -> Result<DecodedBlock, LedgerError> {
        authenticate(
            &self.config,
            self.verifier.as_ref(),
            address,
            message,
            signature,
            unix_now(),
        )?;

        let mut chain = self.chain.write();
        let sealed = chain.seal(Block::with_owner(payload, address));
        if let Some(db) = &self.db {
            db.put_block(&sealed)?;
        }
        chain.push_sealed(sealed.clone());
        chain.credit(address, sealed.height);
        drop(chain);

        info!(address, height = sealed.height, hash = %sealed.hash_hex(), "submission accepted");
        Ok(DecodedBlock::from(&sealed))
    }

    pub fn block_by_height(&self, height: i64) -> Option<DecodedBlock> {
        self.chain.read().block_by_height(height)
    }

    pub fn block_by_hash(&self, hash: &[u8; 32]) -> Option<DecodedBlock> {
        self.chain.read().block_by_hash(hash)
    }

    pub fn block_by_hash_hex(&self, hash: &str) -> Option<DecodedBlock> {
        self.chain.read().block_by_hash_hex(hash)
    }

    pub fn stars_by_wallet_address(&self, address: &str) -> Vec<DecodedBlock> {
        self.chain.read().stars_by_wallet_address(address)
    }

    pub fn validate_chain(&self) -> Vec<IntegrityViolation> {
        self.chain.read().validate_chain()
    }

    /// Run `f` against a consistent snapshot of the chain.
    pub fn with_chain<R>(&self, f: impl FnOnce(&Chain) -> R) -> R {
        f(&self.chain.read())
    }
}
