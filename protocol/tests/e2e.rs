//! End-to-end integration tests for the notary ledger.
//!
//! These tests drive the public API the way a host process does: generate a
//! wallet key, request a challenge, sign it, submit, look the block up again,
//! restart from disk, and audit the chain after someone edits the store
//! behind the ledger's back.
//!
//! Each test stands alone with its own ledger and temporary store.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::json;

use notary_protocol::crypto::keys::NotaryKeypair;
use notary_protocol::crypto::signatures::sign_challenge;
use notary_protocol::storage::{ChallengeResponse, IntegrityViolation};
use notary_protocol::{ChainConfig, Ledger, LedgerDb, LedgerError};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Request and sign a challenge for `kp`, returning `(message, signature)`.
fn sign_fresh(ledger: &Ledger, kp: &NotaryKeypair) -> (String, String) {
    let ChallengeResponse { message, .. } = ledger.request_validation(&kp.address());
    let signature = sign_challenge(kp, &message);
    (message, signature)
}

fn star(name: &str) -> serde_json::Value {
    json!({
        "star": {
            "dec": "68° 52' 56.9",
            "ra": "16h 29m 1.0s",
            "story": format!("Found {name} from the back yard"),
        }
    })
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_full_registration_lifecycle() {
    let ledger = Ledger::new(ChainConfig::default());
    let alice = NotaryKeypair::generate();
    let bob = NotaryKeypair::generate();

    let (m, s) = sign_fresh(&ledger, &alice);
    let a1 = ledger.submit(&alice.address(), &m, &s, star("Vega")).unwrap();
    let (m, s) = sign_fresh(&ledger, &bob);
    let b1 = ledger.submit(&bob.address(), &m, &s, star("Rigel")).unwrap();
    let (m, s) = sign_fresh(&ledger, &alice);
    let a2 = ledger.submit(&alice.address(), &m, &s, star("Mira")).unwrap();

    assert_eq!(ledger.height(), 3);
    assert_eq!((a1.block.height, b1.block.height, a2.block.height), (1, 2, 3));

    // Links run genesis-first.
    let genesis = ledger.block_by_height(0).unwrap();
    assert_eq!(a1.block.previous_hash, Some(genesis.block.hash));
    assert_eq!(b1.block.previous_hash, Some(a1.block.hash));
    assert_eq!(a2.block.previous_hash, Some(b1.block.hash));

    // Decoded payload mirrors the submitted one.
    assert_eq!(a1.decoded_payload, star("Vega"));

    assert_eq!(
        ledger.stars_by_wallet_address(&alice.address()),
        vec![a1.clone(), a2]
    );
    assert_eq!(ledger.stars_by_wallet_address(&bob.address()), vec![b1]);
    assert_eq!(
        ledger.block_by_hash_hex(&a1.block.hash_hex()).unwrap(),
        a1
    );
    assert!(ledger.validate_chain().is_empty());
}

#[test]
fn test_signature_from_other_key_is_refused() {
    let ledger = Ledger::new(ChainConfig::default());
    let alice = NotaryKeypair::generate();
    let mallory = NotaryKeypair::generate();

    let message = ledger.request_ownership_message(&alice.address());
    let forged = sign_challenge(&mallory, &message);

    let err = ledger
        .submit(&alice.address(), &message, &forged, star("Sirius"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Authentication));
    assert_eq!(err.to_string(), "invalid signature");
    assert_eq!(ledger.height(), 0);
}

#[test]
fn test_challenge_cannot_be_reused_for_another_wallet() {
    let ledger = Ledger::new(ChainConfig::default());
    let alice = NotaryKeypair::generate();
    let bob = NotaryKeypair::generate();

    // Bob signs Alice's challenge with his own key: valid signature, wrong
    // subject.
    let message = ledger.request_ownership_message(&alice.address());
    let signature = sign_challenge(&bob, &message);

    let err = ledger
        .submit(&bob.address(), &message, &signature, star("Sirius"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::ChallengeMismatch(_)));
    assert!(ledger.stars_by_wallet_address(&bob.address()).is_empty());
}

#[test]
fn test_stale_challenge_is_refused() {
    let config = ChainConfig::default().with_validation_window(Duration::from_secs(60));
    let ledger = Ledger::new(config);
    let alice = NotaryKeypair::generate();

    let stale_ts = chrono::Utc::now().timestamp() as u64 - 3_600;
    let message = format!("{}:{}:starRegistry", alice.address(), stale_ts);
    let signature = sign_challenge(&alice, &message);

    let err = ledger
        .submit(&alice.address(), &message, &signature, star("Deneb"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::ChallengeExpired { window: 60, .. }));
}

#[test]
fn test_lookup_misses() {
    let ledger = Ledger::new(ChainConfig::default());
    assert!(ledger.block_by_height(-1).is_none());
    assert!(ledger.block_by_height(1).is_none());
    assert!(ledger.block_by_hash(&[7u8; 32]).is_none());
    assert!(ledger.block_by_hash_hex("not-hex").is_none());
    assert!(ledger.stars_by_wallet_address("nobody").is_empty());
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn test_restart_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let alice = NotaryKeypair::generate();

    let submitted = {
        let db = LedgerDb::open(dir.path()).unwrap();
        let ledger = Ledger::open(ChainConfig::default(), db).unwrap();
        let (m, s) = sign_fresh(&ledger, &alice);
        ledger.submit(&alice.address(), &m, &s, star("Arcturus")).unwrap()
    };

    let db = LedgerDb::open(dir.path()).unwrap();
    let ledger = Ledger::open(ChainConfig::default(), db).unwrap();

    assert_eq!(ledger.height(), 1);
    assert_eq!(ledger.block_by_height(1), Some(submitted.clone()));
    assert_eq!(ledger.stars_by_wallet_address(&alice.address()), vec![submitted]);
    assert!(ledger.validate_chain().is_empty());

    // The restored ledger keeps extending the same chain.
    let (m, s) = sign_fresh(&ledger, &alice);
    let next = ledger.submit(&alice.address(), &m, &s, star("Spica")).unwrap();
    assert_eq!(next.block.height, 2);
    assert!(ledger.validate_chain().is_empty());
}

#[test]
fn test_float_payload_validates_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let alice = NotaryKeypair::generate();
    let readings: Vec<f64> = (1..=500)
        .map(|i| (i as f64).sqrt() / 7.0 + 0.1 * i as f64)
        .chain([f64::MIN_POSITIVE, f64::MAX, 5e-324, 0.1 + 0.2, -1.0 / 3.0])
        .collect();

    {
        let ledger = Ledger::open(ChainConfig::default(), LedgerDb::open(dir.path()).unwrap()).unwrap();
        let (m, s) = sign_fresh(&ledger, &alice);
        ledger
            .submit(&alice.address(), &m, &s, json!({ "magnitudes": readings }))
            .unwrap();
        assert!(ledger.validate_chain().is_empty());
    }

    let ledger = Ledger::open(ChainConfig::default(), LedgerDb::open(dir.path()).unwrap()).unwrap();
    assert!(ledger.validate_chain().is_empty());
    assert_eq!(
        ledger.block_by_height(1).unwrap().decoded_payload,
        json!({ "magnitudes": readings })
    );
}

#[test]
fn test_tampered_store_is_reported_after_restart() {
    let db = LedgerDb::open_temporary().unwrap();
    let alice = NotaryKeypair::generate();

    {
        let ledger = Ledger::open(ChainConfig::default(), db.clone()).unwrap();
        for name in ["Betelgeuse", "Aldebaran", "Procyon"] {
            let (m, s) = sign_fresh(&ledger, &alice);
            ledger.submit(&alice.address(), &m, &s, star(name)).unwrap();
        }
    }

    // Rewrite block 2's payload in place, keeping its old digest.
    let mut block = db.get_block(2).unwrap().unwrap();
    block.payload = star("Nowhere");
    db.put_block(&block).unwrap();

    let ledger = Ledger::open(ChainConfig::default(), db).unwrap();
    let findings = ledger.validate_chain();

    assert_eq!(findings.len(), 2);
    assert!(matches!(
        findings[0],
        IntegrityViolation::ContentTampered { height: 2, .. }
    ));
    assert!(matches!(
        findings[1],
        IntegrityViolation::BrokenLink { height: 3, .. }
    ));
    // The tampered payload is served as stored.
    assert_eq!(
        ledger.block_by_height(2).unwrap().decoded_payload,
        star("Nowhere")
    );
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn test_concurrent_submissions_form_one_chain() {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 10;

    let ledger = Arc::new(Ledger::new(ChainConfig::default()));

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                let kp = NotaryKeypair::generate();
                for i in 0..PER_WRITER {
                    let (m, s) = sign_fresh(&ledger, &kp);
                    ledger
                        .submit(&kp.address(), &m, &s, json!({ "writer": w, "seq": i }))
                        .unwrap();
                }
                kp.address()
            })
        })
        .collect();

    let addresses: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(ledger.height(), (WRITERS * PER_WRITER) as i64);
    assert!(ledger.validate_chain().is_empty());

    for address in &addresses {
        let stars = ledger.stars_by_wallet_address(address);
        assert_eq!(stars.len(), PER_WRITER);
        // Per-writer order survives interleaving.
        let seqs: Vec<u64> = stars
            .iter()
            .map(|b| b.decoded_payload["seq"].as_u64().unwrap())
            .collect();
        assert_eq!(seqs, (0..PER_WRITER as u64).collect::<Vec<_>>());
        assert!(stars.windows(2).all(|w| w[0].block.height < w[1].block.height));
    }

    // Ownership index agrees with a replay of the blocks.
    let (live, replayed) =
        ledger.with_chain(|chain| (chain.ownership_index().clone(), chain.rebuild_ownership_index()));
    assert_eq!(live, replayed);
}

#[test]
fn test_readers_never_see_partial_state() {
    let ledger = Arc::new(Ledger::new(ChainConfig::default()));
    let kp = NotaryKeypair::generate();

    let writer = {
        let ledger = Arc::clone(&ledger);
        let kp = kp.clone();
        thread::spawn(move || {
            for i in 0..50 {
                let (m, s) = sign_fresh(&ledger, &kp);
                ledger.submit(&kp.address(), &m, &s, json!(i)).unwrap();
            }
        })
    };

    let reader = {
        let ledger = Arc::clone(&ledger);
        let address = kp.address();
        thread::spawn(move || {
            for _ in 0..200 {
                // Tip block and index stay in step inside one snapshot.
                ledger.with_chain(|chain| {
                    let credited = chain.ownership_index().get(&address).map_or(0, Vec::len);
                    assert_eq!(credited as i64, chain.height());
                });
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(ledger.height(), 50);
}
