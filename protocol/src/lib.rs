// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Star Notary - Core Library
//!
//! A single-node, append-only ledger where every block is sealed with a
//! BLAKE3 digest and linked to the digest of the block before it. Anyone can
//! claim a record on the ledger, but only after proving they hold the key
//! behind their wallet address: the ledger hands out a short challenge, the
//! client signs it with Ed25519, and the signed challenge is the ticket in.
//!
//! ## Architecture
//!
//! - **crypto** - BLAKE3 hashing, canonical JSON, Ed25519 keys and the
//!   signature verification seam.
//! - **storage** - blocks, the chain and its ownership index, ownership
//!   challenges, the thread-safe `Ledger` handle and the sled snapshot store.
//! - **config** - protocol constants and the `ChainConfig` knobs.
//!
//! ## Design Philosophy
//!
//! 1. The chain reports corruption, it never repairs it.
//! 2. Lookups that miss return `None`. Only rejected writes are errors.
//! 3. One mutation path. Every block, genesis included, goes through `append`.

pub mod config;
pub mod crypto;
pub mod storage;

pub use config::ChainConfig;
pub use storage::{
    Block, Chain, DecodedBlock, IntegrityViolation, Ledger, LedgerDb, LedgerError,
    OwnershipChallenge,
};
