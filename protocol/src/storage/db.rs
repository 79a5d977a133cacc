//! # LedgerDb - Snapshot Storage
//!
//! Optional persistence for the chain, built on sled. The chain itself is
//! an in-memory structure; this store just lets a node pick up where it
//! left off.
//!
//! ## Tree Layout
//!
//! | Tree           | Key                 | Value                    |
//! |----------------|---------------------|--------------------------|
//! | `blocks`       | `height` (8B BE)    | `bincode(StoredBlock)`   |
//! | `block_hashes` | `hash` (32B)        | `height` (8B BE)         |
//! | `metadata`     | key (UTF-8)         | value (bytes)            |
//!
//! Heights are big-endian so sled's lexicographic order is numeric order and
//! a full scan of `blocks` yields the chain genesis-first.
//!
//! ## Payload encoding
//!
//! bincode can't round-trip `serde_json::Value` (it needs
//! `deserialize_any`), so blocks are stored as [`StoredBlock`] with the
//! payload in canonical JSON text. Canonical JSON is exactly what the digest
//! covers, so a reloaded block hashes to the same value it was sealed with.
//! serde_json's `float_roundtrip` feature is required for that to hold for
//! floats: without it, parsing the shortest float text can land one ULP off.
//!
//! ## Atomicity
//!
//! [`LedgerDb::put_block`] writes all three trees in one sled transaction.
//! Either the block, its hash index entry and the latest height all land,
//! or none of them do.

use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult, TransactionError};
use sled::{Db, Transactional, Tree};
use std::path::Path;

use super::block::Block;
use crate::crypto::hash::canonical_json;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Well-known key in the `metadata` tree for the latest block height.
const META_LATEST_HEIGHT: &[u8] = b"latest_block_height";

// ---------------------------------------------------------------------------
// On-disk record
// ---------------------------------------------------------------------------

/// The bincode-friendly shape of a [`Block`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlock {
    pub height: u64,
    pub previous_hash: Option<[u8; 32]>,
    pub timestamp: u64,
    pub owner: Option<String>,
    pub payload_json: String,
    pub hash: [u8; 32],
}

impl From<&Block> for StoredBlock {
    fn from(block: &Block) -> Self {
        Self {
            height: block.height,
            previous_hash: block.previous_hash,
            timestamp: block.timestamp,
            owner: block.owner.clone(),
            payload_json: canonical_json(&block.payload),
            hash: block.hash,
        }
    }
}

impl TryFrom<StoredBlock> for Block {
    type Error = DbError;

    fn try_from(stored: StoredBlock) -> Result<Self, Self::Error> {
        let payload = serde_json::from_str(&stored.payload_json)
            .map_err(|e| DbError::Serialization(e.to_string()))?;
        Ok(Block {
            height: stored.height,
            previous_hash: stored.previous_hash,
            timestamp: stored.timestamp,
            owner: stored.owner,
            payload,
            hash: stored.hash,
        })
    }
}

fn encode_block(block: &Block) -> DbResult<Vec<u8>> {
    bincode::serialize(&StoredBlock::from(block)).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode_block(bytes: &[u8]) -> DbResult<Block> {
    let stored: StoredBlock =
        bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))?;
    Block::try_from(stored)
}

fn decode_height(bytes: &[u8]) -> DbResult<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| DbError::Serialization("height must be 8 bytes".into()))?;
    Ok(u64::from_be_bytes(arr))
}

// ---------------------------------------------------------------------------
// LedgerDb
// ---------------------------------------------------------------------------

/// sled-backed block store.
///
/// Cheap to clone; sled handles are reference counted and thread-safe.
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    blocks: Tree,
    block_hashes: Tree,
    metadata: Tree,
}

impl LedgerDb {
    /// Open or create a store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A throwaway store, removed when dropped. For tests.
    pub fn open_temporary() -> DbResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let blocks = db.open_tree("blocks")?;
        let block_hashes = db.open_tree("block_hashes")?;
        let metadata = db.open_tree("metadata")?;
        Ok(Self {
            db,
            blocks,
            block_hashes,
            metadata,
        })
    }

    /// Persist a block, its hash index entry and the new latest height, then
    /// flush.
    ///
    /// Writing a block at an existing height overwrites it. The chain never
    /// does that; the tamper tests do.
    pub fn put_block(&self, block: &Block) -> DbResult<()> {
        let height_key = block.height.to_be_bytes();
        let encoded = encode_block(block)?;

        (&self.blocks, &self.block_hashes, &self.metadata)
            .transaction(
                |(blocks, hashes, metadata)| -> ConflictableTransactionResult<(), DbError> {
                    blocks.insert(&height_key[..], &encoded[..])?;
                    hashes.insert(&block.hash[..], &height_key[..])?;

                    let latest = match metadata.get(META_LATEST_HEIGHT)? {
                        Some(bytes) => {
                            Some(decode_height(&bytes).map_err(ConflictableTransactionError::Abort)?)
                        }
                        None => None,
                    };
                    if latest.map_or(true, |h| block.height > h) {
                        metadata.insert(META_LATEST_HEIGHT, &height_key[..])?;
                    }
                    Ok(())
                },
            )
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => DbError::Sled(e),
            })?;

        self.db.flush()?;
        Ok(())
    }

    /// Block at `height`, if stored.
    pub fn get_block(&self, height: u64) -> DbResult<Option<Block>> {
        match self.blocks.get(height.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode_block(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Block whose digest was `hash` when it was written.
    pub fn get_block_by_hash(&self, hash: &[u8; 32]) -> DbResult<Option<Block>> {
        match self.block_hashes.get(hash)? {
            Some(height) => self.get_block(decode_height(&height)?),
            None => Ok(None),
        }
    }

    /// Highest height written, `None` for an empty store.
    pub fn get_latest_block_height(&self) -> DbResult<Option<u64>> {
        match self.metadata.get(META_LATEST_HEIGHT)? {
            Some(bytes) => Ok(Some(decode_height(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Number of stored blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Every stored block in height order.
    pub fn load_chain(&self) -> DbResult<Vec<Block>> {
        self.blocks
            .iter()
            .map(|entry| {
                let (_, value) = entry?;
                decode_block(&value)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
