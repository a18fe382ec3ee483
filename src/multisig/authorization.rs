//! Multi-signature authorization section
//!
//! The part of a transaction that grows as co-signers sign: the key set it
//! is signed for, and one signature per signing slot kept in ascending slot
//! order so the encoding never depends on signing order.

use bytes::{Buf, BufMut};

use super::keyset::{MultisigConfig, MAX_SIGNERS};
use crate::core::codec::{
    get_length, get_u16, get_var_bytes, put_var_bytes, put_var_uint, CodecError, Decode, Encode,
};
use crate::crypto::{PublicKey, PUBLIC_KEY_LEN, SIGNATURE_LEN};

/// A signature bound to its signer's slot in the canonical key set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotSignature {
    pub slot: u16,
    pub signature: [u8; SIGNATURE_LEN],
}

/// Key set plus collected signatures
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Authorization {
    config: MultisigConfig,
    signatures: Vec<SlotSignature>,
}

impl Authorization {
    /// Empty authorization for a key set
    pub fn new(config: MultisigConfig) -> Self {
        Self {
            config,
            signatures: Vec::new(),
        }
    }

    pub fn config(&self) -> &MultisigConfig {
        &self.config
    }

    /// Signatures in ascending slot order
    pub fn signatures(&self) -> &[SlotSignature] {
        &self.signatures
    }

    pub fn has_slot(&self, slot: u16) -> bool {
        self.signatures
            .binary_search_by_key(&slot, |s| s.slot)
            .is_ok()
    }

    /// True once at least M signatures are attached
    pub fn is_complete(&self) -> bool {
        self.signatures.len() >= usize::from(self.config.threshold())
    }

    /// Public keys that have signed, in slot order
    pub fn signers(&self) -> Vec<PublicKey> {
        self.signatures
            .iter()
            .map(|s| self.config.public_keys()[usize::from(s.slot)])
            .collect()
    }

    /// Insert a signature at its canonical position.
    ///
    /// Returns false, leaving the section unchanged, if the slot is
    /// already filled.
    pub(crate) fn insert(&mut self, slot: u16, signature: [u8; SIGNATURE_LEN]) -> bool {
        match self.signatures.binary_search_by_key(&slot, |s| s.slot) {
            Ok(_) => false,
            Err(pos) => {
                self.signatures.insert(pos, SlotSignature { slot, signature });
                true
            }
        }
    }
}

impl Encode for Authorization {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u16_le(self.config.threshold());
        put_var_uint(buf, self.config.signer_count() as u64);
        for key in self.config.public_keys() {
            put_var_bytes(buf, &key.serialize());
        }

        put_var_uint(buf, self.signatures.len() as u64);
        for sig in &self.signatures {
            buf.put_u16_le(sig.slot);
            put_var_bytes(buf, &sig.signature);
        }
    }
}

impl Decode for Authorization {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        let threshold = get_u16(buf)?;
        let n = get_length(buf)?;
        if n > MAX_SIGNERS {
            return Err(CodecError::Invalid(format!("key set of {} keys", n)));
        }

        let mut public_keys = Vec::with_capacity(n);
        for _ in 0..n {
            let bytes = get_var_bytes(buf)?;
            if bytes.len() != PUBLIC_KEY_LEN {
                return Err(CodecError::Invalid(format!(
                    "public key of {} bytes",
                    bytes.len()
                )));
            }
            let key = PublicKey::from_slice(&bytes).map_err(|_| {
                CodecError::Invalid(format!("invalid public key {}", hex::encode(&bytes)))
            })?;
            public_keys.push(key);
        }
        let config = MultisigConfig::from_canonical(threshold, public_keys)
            .map_err(|e| CodecError::Invalid(e.to_string()))?;

        let k = get_length(buf)?;
        if k > n {
            return Err(CodecError::Invalid(format!(
                "{} signatures for {} keys",
                k, n
            )));
        }

        let mut signatures: Vec<SlotSignature> = Vec::with_capacity(k);
        for _ in 0..k {
            let slot = get_u16(buf)?;
            if usize::from(slot) >= n {
                return Err(CodecError::Invalid(format!("slot {} out of range", slot)));
            }
            if signatures.last().map_or(false, |prev| prev.slot >= slot) {
                return Err(CodecError::Invalid(format!(
                    "slot {} out of canonical order",
                    slot
                )));
            }

            let bytes = get_var_bytes(buf)?;
            let signature: [u8; SIGNATURE_LEN] = bytes.as_slice().try_into().map_err(|_| {
                CodecError::Invalid(format!("signature of {} bytes", bytes.len()))
            })?;
            signatures.push(SlotSignature { slot, signature });
        }

        Ok(Self { config, signatures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn config(m: u16, n: usize) -> MultisigConfig {
        let keys = (0..n).map(|_| KeyPair::generate().public_key).collect();
        MultisigConfig::new(m, keys).unwrap()
    }

    #[test]
    fn test_insert_keeps_slot_order() {
        let mut auth = Authorization::new(config(3, 4));
        assert!(auth.insert(2, [2u8; 64]));
        assert!(auth.insert(0, [0u8; 64]));
        assert!(auth.insert(3, [3u8; 64]));

        let slots: Vec<u16> = auth.signatures().iter().map(|s| s.slot).collect();
        assert_eq!(slots, vec![0, 2, 3]);
        assert!(auth.is_complete());
    }

    #[test]
    fn test_insert_rejects_filled_slot() {
        let mut auth = Authorization::new(config(2, 3));
        assert!(auth.insert(1, [1u8; 64]));
        assert!(!auth.insert(1, [9u8; 64]));
        assert_eq!(auth.signatures()[0].signature, [1u8; 64]);
    }

    #[test]
    fn test_round_trip() {
        let mut auth = Authorization::new(config(2, 3));
        auth.insert(1, [7u8; 64]);
        let decoded = Authorization::from_bytes(&auth.to_bytes()).unwrap();
        assert_eq!(decoded, auth);
        assert_eq!(decoded.signers(), vec![auth.config().public_keys()[1]]);
    }

    fn encode_raw(auth: &Authorization, sigs: &[(u16, usize)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u16_le(auth.config().threshold());
        put_var_uint(&mut out, auth.config().signer_count() as u64);
        for key in auth.config().public_keys() {
            put_var_bytes(&mut out, &key.serialize());
        }
        put_var_uint(&mut out, sigs.len() as u64);
        for (slot, len) in sigs {
            out.put_u16_le(*slot);
            put_var_bytes(&mut out, &vec![1u8; *len]);
        }
        out
    }

    #[test]
    fn test_non_canonical_slots_rejected() {
        let auth = Authorization::new(config(3, 4));

        assert!(Authorization::from_bytes(&encode_raw(&auth, &[(0, 64), (2, 64)])).is_ok());
        // Unsorted
        assert!(Authorization::from_bytes(&encode_raw(&auth, &[(2, 64), (0, 64)])).is_err());
        // Duplicate
        assert!(Authorization::from_bytes(&encode_raw(&auth, &[(1, 64), (1, 64)])).is_err());
        // Out of range
        assert!(Authorization::from_bytes(&encode_raw(&auth, &[(4, 64)])).is_err());
        // Wrong signature length
        assert!(Authorization::from_bytes(&encode_raw(&auth, &[(0, 63)])).is_err());
        // More signatures than keys
        assert!(Authorization::from_bytes(&encode_raw(
            &auth,
            &[(0, 64), (1, 64), (2, 64), (3, 64), (3, 64)]
        ))
        .is_err());
    }

    #[test]
    fn test_signatures_beyond_threshold_decode() {
        let auth = Authorization::new(config(2, 4));
        let bytes = encode_raw(&auth, &[(0, 64), (1, 64), (3, 64)]);
        let decoded = Authorization::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.signatures().len(), 3);
        assert!(decoded.is_complete());
    }

    fn encode_keys(threshold: u16, keys: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        out.put_u16_le(threshold);
        put_var_uint(&mut out, keys.len() as u64);
        for key in keys {
            put_var_bytes(&mut out, key);
        }
        put_var_uint(&mut out, 0);
        out
    }

    #[test]
    fn test_invalid_key_point_rejected() {
        let auth = Authorization::new(config(2, 3));
        let mut keys: Vec<Vec<u8>> = auth
            .config()
            .public_keys()
            .iter()
            .map(|k| k.serialize().to_vec())
            .collect();
        assert!(Authorization::from_bytes(&encode_keys(2, &keys)).is_ok());

        // Right length, but 0x05 is not a compressed point prefix
        keys[1] = vec![5u8; PUBLIC_KEY_LEN];
        let err = Authorization::from_bytes(&encode_keys(2, &keys)).unwrap_err();
        assert!(err.to_string().contains("invalid public key"));
    }

    #[test]
    fn test_unsorted_keys_rejected() {
        let auth = Authorization::new(config(2, 3));
        let mut keys: Vec<Vec<u8>> = auth
            .config()
            .public_keys()
            .iter()
            .map(|k| k.serialize().to_vec())
            .collect();
        keys.swap(0, 2);
        let err = Authorization::from_bytes(&encode_keys(2, &keys)).unwrap_err();
        assert!(err.to_string().contains("canonical order"));

        // Repeated key
        keys[0] = keys[1].clone();
        assert!(Authorization::from_bytes(&encode_keys(2, &keys)).is_err());
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let auth = Authorization::new(config(2, 3));
        let mut bytes = auth.to_bytes();
        bytes[0] = 0;
        assert!(Authorization::from_bytes(&bytes).is_err());
        bytes[0] = 4;
        assert!(Authorization::from_bytes(&bytes).is_err());
    }
}
