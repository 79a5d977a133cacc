//! # Cryptographic Primitives
//!
//! Everything security-related in the notary flows through here: block
//! digests, the canonical form a payload takes before it is hashed, and the
//! Ed25519 keys and verifier that gate submissions.
//!
//! - **BLAKE3** for block digests.
//! - **Ed25519** for ownership proofs.
//!
//! Both are thin, type-safe wrappers around audited crates. Nothing here is
//! hand-rolled beyond the byte layout we feed into the hash.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{blake3_hash, blake3_hash_multi, canonical_json};
pub use keys::{NotaryKeypair, NotaryPublicKey, NotarySignature};
pub use signatures::{sign_challenge, Ed25519Verifier, SignatureVerifier};
