//! Multi-signature assembly
//!
//! Adds one co-signer's signature at a time to a transaction and checks
//! whether the collected signatures authorize it. All operations are pure:
//! they return a new transaction and never touch their input.

use super::authorization::Authorization;
use super::keyset::{MultisigConfig, MultisigError};
use crate::core::Transaction;
use crate::crypto::{verify_signature, KeyPair, PublicKey};

/// Add `signer`'s signature to `tx` for the M-of-N key set `(threshold, public_keys)`.
///
/// The key set may be given in any order; it is canonicalized first.
pub fn add_signature(
    tx: &Transaction,
    threshold: u16,
    public_keys: &[PublicKey],
    signer: &KeyPair,
) -> Result<Transaction, MultisigError> {
    let config = MultisigConfig::new(threshold, public_keys.to_vec())?;
    add_signature_with_config(tx, &config, signer)
}

/// Add `signer`'s signature to `tx` for an already canonical key set
pub fn add_signature_with_config(
    tx: &Transaction,
    config: &MultisigConfig,
    signer: &KeyPair,
) -> Result<Transaction, MultisigError> {
    if let Some(auth) = tx.authorization() {
        if auth.config() != config {
            return Err(MultisigError::KeySetMismatch);
        }
    }

    let mut next = tx.clone();
    let address = config.address();
    if next.payer.is_empty() && next.signature_count() == 0 {
        next.payer = address;
    } else if next.payer != address {
        return Err(MultisigError::PayerMismatch {
            expected: address,
            found: next.payer,
        });
    }

    let digest = next.signing_digest();
    let signature = signer.sign(&digest);

    let auth = next
        .authorization
        .get_or_insert_with(|| Authorization::new(config.clone()));

    let slot = config.slot_of(&signer.public_key);
    if slot.map_or(false, |s| auth.has_slot(s)) {
        return Err(MultisigError::DuplicateSigner(signer.public_key_hex()));
    }
    let slot = slot.ok_or_else(|| MultisigError::UnauthorizedSigner(signer.public_key_hex()))?;

    auth.insert(slot, signature);
    log::debug!(
        "Signer {} filled slot {} ({}/{})",
        signer.address(),
        slot,
        auth.signatures().len(),
        config.threshold()
    );
    Ok(next)
}

/// Check every attached signature against its slot's key and the signing digest
pub fn verify_signatures(tx: &Transaction) -> Result<(), MultisigError> {
    let Some(auth) = tx.authorization() else {
        return Ok(());
    };

    let digest = tx.signing_digest();
    let keys = auth.config().public_keys();
    for sig in auth.signatures() {
        let key = &keys[usize::from(sig.slot)];
        if !verify_signature(key, &digest, &sig.signature)? {
            return Err(MultisigError::InvalidSignature(sig.slot));
        }
    }
    Ok(())
}

/// True once the transaction carries at least M signatures
pub fn is_complete(tx: &Transaction) -> bool {
    tx.authorization().map_or(false, Authorization::is_complete)
}

/// Check that a transaction may be submitted: signed for a key set, at
/// least M valid signatures, paid for by the multi-sig address.
pub fn ensure_submittable(tx: &Transaction) -> Result<(), MultisigError> {
    let auth = tx.authorization().ok_or(MultisigError::Unsigned)?;
    let config = auth.config();

    if !auth.is_complete() {
        return Err(MultisigError::InsufficientSignatures {
            have: auth.signatures().len(),
            need: config.threshold(),
        });
    }

    let address = config.address();
    if tx.payer != address {
        return Err(MultisigError::PayerMismatch {
            expected: address,
            found: tx.payer,
        });
    }

    verify_signatures(tx)
}
