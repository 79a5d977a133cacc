//! # Storage Module
//!
//! The notary chain and everything that keeps it honest.
//!
//! ## Architecture
//!
//! ```text
//! block.rs     - Block structure, genesis block, digest/validate operations
//! chain.rs     - In-memory chain: append, submit, lookups, integrity audit
//! ownership.rs - Ownership challenge format and parsing
//! error.rs     - Write-side error taxonomy
//! ledger.rs    - Thread-safe shared handle with optional write-through
//! db.rs        - sled persistence for restart survival
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! challenge → signed submission → Ledger → Chain → (LedgerDb)
//!                                            ↓
//!                               lookups · ownership index · audit
//! ```
//!
//! ## Design Decisions
//!
//! 1. **BLAKE3 for block digests.** The preimage covers every field except
//!    the digest itself, owner included, so the ownership index can always
//!    be rebuilt from the blocks alone.
//!
//! 2. **Canonical JSON for payloads.** Object keys are sorted at every depth
//!    before hashing, so two semantically equal payloads hash the same.
//!
//! 3. **Bincode on disk.** Compact and deterministic. JSON is for the API.

pub mod block;
pub mod chain;
pub mod db;
pub mod error;
pub mod ledger;
pub mod ownership;

pub use block::{Block, DecodedBlock};
pub use chain::{Chain, IntegrityViolation};
pub use db::{DbError, LedgerDb};
pub use error::LedgerError;
pub use ledger::Ledger;
pub use ownership::{ChallengeResponse, OwnershipChallenge};
