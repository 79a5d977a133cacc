//! # Signature Verification
//!
//! The chain never looks at key material itself. It asks a
//! [`SignatureVerifier`] one question: did the holder of `address` sign
//! `message`, producing `signature`? Everything arrives as strings because
//! that is how it arrives over the wire.
//!
//! [`Ed25519Verifier`] is the production answer: the address is a hex
//! public key and the signature is hex over the UTF-8 message bytes. Any
//! closure with the same shape also works, which keeps chain tests free of
//! real key generation when they don't care about it.

use super::keys::{NotaryKeypair, NotaryPublicKey, NotarySignature};

/// `VerifySignature(message, address, signature) -> bool`.
///
/// Implementations must be deterministic and must not touch the network or
/// persistent state. Malformed inputs verify as `false`; they never panic.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, message: &str, address: &str, signature: &str) -> bool;
}

impl<F> SignatureVerifier for F
where
    F: Fn(&str, &str, &str) -> bool + Send + Sync,
{
    fn verify(&self, message: &str, address: &str, signature: &str) -> bool {
        self(message, address, signature)
    }
}

/// Ed25519 over hex-encoded public keys and signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, message: &str, address: &str, signature: &str) -> bool {
        let Ok(public_key) = NotaryPublicKey::from_hex(address) else {
            return false;
        };
        let Ok(signature) = NotarySignature::from_hex(signature) else {
            return false;
        };
        public_key.verify(message.as_bytes(), &signature)
    }
}

/// Sign an ownership challenge, returning the hex signature a client submits.
///
/// ```
/// use notary_protocol::crypto::{sign_challenge, Ed25519Verifier, NotaryKeypair, SignatureVerifier};
///
/// let kp = NotaryKeypair::generate();
/// let message = format!("{}:1700000000:starRegistry", kp.address());
/// let signature = sign_challenge(&kp, &message);
/// assert!(Ed25519Verifier.verify(&message, &kp.address(), &signature));
/// ```
pub fn sign_challenge(keypair: &NotaryKeypair, message: &str) -> String {
    keypair.sign(message.as_bytes()).to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed25519_verifier_accepts_valid_signature() {
        let kp = NotaryKeypair::generate();
        let sig = sign_challenge(&kp, "hello");
        assert!(Ed25519Verifier.verify("hello", &kp.address(), &sig));
    }

    #[test]
    fn ed25519_verifier_rejects_other_message() {
        let kp = NotaryKeypair::generate();
        let sig = sign_challenge(&kp, "hello");
        assert!(!Ed25519Verifier.verify("hell0", &kp.address(), &sig));
    }

    #[test]
    fn ed25519_verifier_rejects_other_address() {
        let kp = NotaryKeypair::generate();
        let other = NotaryKeypair::generate();
        let sig = sign_challenge(&kp, "hello");
        assert!(!Ed25519Verifier.verify("hello", &other.address(), &sig));
    }

    #[test]
    fn ed25519_verifier_rejects_garbage() {
        let kp = NotaryKeypair::generate();
        let sig = sign_challenge(&kp, "hello");
        assert!(!Ed25519Verifier.verify("hello", "addr1", &sig));
        assert!(!Ed25519Verifier.verify("hello", &kp.address(), "not-hex"));
        assert!(!Ed25519Verifier.verify("hello", &kp.address(), ""));
    }

    #[test]
    fn closures_are_verifiers() {
        let always = |_: &str, _: &str, sig: &str| sig == "ok";
        assert!(always.verify("m", "a", "ok"));
        assert!(!always.verify("m", "a", "no"));
    }
}
