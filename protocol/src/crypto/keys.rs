//! # Key Management
//!
//! Ed25519 keypairs for notary wallets. A wallet address *is* the
//! hex-encoded 32-byte public key, so there is no separate address
//! derivation step to get wrong.
//!
//! ## Security considerations
//!
//! - Keys are generated from `OsRng`.
//! - Secret key bytes never appear in `Debug` output or logs.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while parsing key material.
///
/// Deliberately terse about *why* parsing failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key bytes")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignature,
}

/// A wallet keypair wrapping an Ed25519 signing key.
///
/// Does not implement `Serialize`. Exporting a secret key should be an
/// explicit call to [`secret_key_hex`](Self::secret_key_hex).
///
/// ```
/// use notary_protocol::crypto::NotaryKeypair;
///
/// let kp = NotaryKeypair::generate();
/// let sig = kp.sign(b"claim polaris");
/// assert!(kp.public_key().verify(b"claim polaris", &sig));
/// ```
pub struct NotaryKeypair {
    signing_key: SigningKey,
}

/// The public half of a wallet. Its hex form is the wallet address.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotaryPublicKey {
    bytes: [u8; 32],
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotarySignature {
    bytes: Vec<u8>,
}

impl NotaryKeypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte seed. Tests and tooling only.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Load a keypair from a hex-encoded 32-byte secret key.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let arr: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&arr))
    }

    /// The public key of this keypair.
    pub fn public_key(&self) -> NotaryPublicKey {
        NotaryPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// The wallet address: hex of the public key.
    pub fn address(&self) -> String {
        self.public_key().to_hex()
    }

    /// Sign arbitrary bytes.
    pub fn sign(&self, message: &[u8]) -> NotarySignature {
        NotarySignature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }

    /// Hex-encoded secret key. Handle with care.
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }
}

impl Clone for NotaryKeypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for NotaryKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NotaryKeypair(pub={})", self.public_key().to_hex())
    }
}

impl NotaryPublicKey {
    /// Parse and validate a hex-encoded public key (i.e. a wallet address).
    ///
    /// Rejects strings that decode to anything other than a valid curve point.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&arr).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes: arr })
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Hex encoding, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Check a signature against this key. Any malformed input is a `false`.
    pub fn verify(&self, message: &[u8], signature: &NotarySignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Some(dalek_sig) = signature.to_dalek_signature() else {
            return false;
        };
        verifying_key.verify(message, &dalek_sig).is_ok()
    }
}

impl fmt::Display for NotaryPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for NotaryPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NotaryPublicKey({})", &self.to_hex()[..16])
    }
}

impl NotarySignature {
    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Parse a hex-encoded 64-byte signature.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidSignature)?;
        if bytes.len() != 64 {
            return Err(KeyError::InvalidSignature);
        }
        Ok(Self { bytes })
    }

    /// Hex encoding, 128 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    fn to_dalek_signature(&self) -> Option<DalekSignature> {
        let arr: [u8; 64] = self.bytes.as_slice().try_into().ok()?;
        Some(DalekSignature::from_bytes(&arr))
    }
}

impl fmt::Display for NotarySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for NotarySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "NotarySignature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "NotarySignature({})", hex_str)
        }
    }
}
