//! Multi-signature key sets
//!
//! An M-of-N key set in canonical order, the address derived from it, and
//! the errors raised while assembling multi-signed transactions.

use crate::crypto::{compare_public_keys, public_key_from_hex, Address, KeyError, PublicKey};
use std::cmp::Ordering;
use thiserror::Error;

/// Largest key set a multi-signature account may have
pub const MAX_SIGNERS: usize = 16;

/// Errors related to multisig operations
#[derive(Error, Debug)]
pub enum MultisigError {
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("Invalid signer count {0}: a key set holds 1 to 16 public keys")]
    InvalidSignerCount(usize),
    #[error("Duplicate public key in key set: {0}")]
    DuplicatePublicKey(String),
    #[error("Already signed by this signer: {0}")]
    DuplicateSigner(String),
    #[error("Signer not authorized: {0}")]
    UnauthorizedSigner(String),
    #[error("Transaction is already signed for a different key set or threshold")]
    KeySetMismatch,
    #[error("Payer {found} does not match multi-sig address {expected}")]
    PayerMismatch { expected: Address, found: Address },
    #[error("Invalid signature in slot {0}")]
    InvalidSignature(u16),
    #[error("Transaction carries no signatures")]
    Unsigned,
    #[error("Insufficient signatures: have {have}, need {need}")]
    InsufficientSignatures { have: usize, need: u16 },
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// Default threshold for `n` admins: ceil(5n / 7)
pub fn default_threshold(n: usize) -> u16 {
    ((5 * n + 6) / 7) as u16
}

/// Parse a comma-separated list of hex public keys
pub fn parse_public_keys(list: &str) -> Result<Vec<PublicKey>, MultisigError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| public_key_from_hex(s).map_err(MultisigError::from))
        .collect()
}

/// An M-of-N key set with keys held in canonical order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultisigConfig {
    threshold: u16,
    public_keys: Vec<PublicKey>,
}

impl MultisigConfig {
    /// Create a key set from keys in any order
    ///
    /// # Errors
    /// Returns error if the signer count or threshold is out of range, or if
    /// a key appears twice
    pub fn new(threshold: u16, mut public_keys: Vec<PublicKey>) -> Result<Self, MultisigError> {
        public_keys.sort_by(compare_public_keys);
        for pair in public_keys.windows(2) {
            if pair[0] == pair[1] {
                return Err(MultisigError::DuplicatePublicKey(hex::encode(
                    pair[0].serialize(),
                )));
            }
        }
        Self::checked(threshold, public_keys)
    }

    /// Create a key set from keys that must already be in strict canonical
    /// order, as read back from an encoded transaction
    pub fn from_canonical(
        threshold: u16,
        public_keys: Vec<PublicKey>,
    ) -> Result<Self, MultisigError> {
        for pair in public_keys.windows(2) {
            match compare_public_keys(&pair[0], &pair[1]) {
                Ordering::Less => {}
                Ordering::Equal => {
                    return Err(MultisigError::DuplicatePublicKey(hex::encode(
                        pair[0].serialize(),
                    )))
                }
                Ordering::Greater => {
                    return Err(MultisigError::InvalidThreshold(
                        "public keys are not in canonical order".to_string(),
                    ))
                }
            }
        }
        Self::checked(threshold, public_keys)
    }

    fn checked(threshold: u16, public_keys: Vec<PublicKey>) -> Result<Self, MultisigError> {
        let n = public_keys.len();
        if n == 0 || n > MAX_SIGNERS {
            return Err(MultisigError::InvalidSignerCount(n));
        }
        if threshold == 0 {
            return Err(MultisigError::InvalidThreshold(
                "threshold must be at least 1".to_string(),
            ));
        }
        if usize::from(threshold) > n {
            return Err(MultisigError::InvalidThreshold(format!(
                "threshold {} exceeds signer count {}",
                threshold, n
            )));
        }

        Ok(Self {
            threshold,
            public_keys,
        })
    }

    /// Get the threshold (M)
    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Get the total signer count (N)
    pub fn signer_count(&self) -> usize {
        self.public_keys.len()
    }

    /// Keys in canonical order
    pub fn public_keys(&self) -> &[PublicKey] {
        &self.public_keys
    }

    /// Canonical slot of a key, if it belongs to the set
    pub fn slot_of(&self, public_key: &PublicKey) -> Option<u16> {
        self.public_keys
            .binary_search_by(|k| compare_public_keys(k, public_key))
            .ok()
            .map(|i| i as u16)
    }

    /// Verification program: m (u16 LE) || n (u16 LE) || compressed keys
    pub fn program(&self) -> Vec<u8> {
        let mut program = Vec::with_capacity(4 + self.public_keys.len() * 33);
        program.extend_from_slice(&self.threshold.to_le_bytes());
        program.extend_from_slice(&(self.public_keys.len() as u16).to_le_bytes());
        for key in &self.public_keys {
            program.extend_from_slice(&key.serialize());
        }
        program
    }

    /// Derived multi-sig address
    pub fn address(&self) -> Address {
        Address::from_program(&self.program())
    }

    /// Get description like "5-of-7"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.public_keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn keys(n: usize) -> Vec<PublicKey> {
        (0..n).map(|_| KeyPair::generate().public_key).collect()
    }

    #[test]
    fn test_create_config() {
        let config = MultisigConfig::new(2, keys(3)).unwrap();
        assert_eq!(config.threshold(), 2);
        assert_eq!(config.signer_count(), 3);
        assert_eq!(config.description(), "2-of-3");
    }

    #[test]
    fn test_single_key_allowed() {
        let config = MultisigConfig::new(1, keys(1)).unwrap();
        assert_eq!(config.description(), "1-of-1");
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(matches!(
            MultisigConfig::new(0, keys(3)),
            Err(MultisigError::InvalidThreshold(_))
        ));
        assert!(matches!(
            MultisigConfig::new(4, keys(3)),
            Err(MultisigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_signer_count_bounds() {
        assert!(matches!(
            MultisigConfig::new(1, Vec::new()),
            Err(MultisigError::InvalidSignerCount(0))
        ));
        assert!(matches!(
            MultisigConfig::new(1, keys(MAX_SIGNERS + 1)),
            Err(MultisigError::InvalidSignerCount(17))
        ));
        assert!(MultisigConfig::new(12, keys(MAX_SIGNERS)).is_ok());
    }

    #[test]
    fn test_duplicate_key() {
        let mut set = keys(2);
        set.push(set[0]);
        assert!(matches!(
            MultisigConfig::new(2, set),
            Err(MultisigError::DuplicatePublicKey(_))
        ));
    }

    #[test]
    fn test_address_ignores_input_order() {
        let set = keys(5);
        let config = MultisigConfig::new(3, set.clone()).unwrap();

        let mut reversed = set.clone();
        reversed.reverse();
        let mut rotated = set;
        rotated.rotate_left(2);

        assert_eq!(MultisigConfig::new(3, reversed).unwrap(), config);
        assert_eq!(
            MultisigConfig::new(3, rotated).unwrap().address(),
            config.address()
        );
    }

    #[test]
    fn test_address_depends_on_threshold() {
        let set = keys(3);
        let a = MultisigConfig::new(2, set.clone()).unwrap().address();
        let b = MultisigConfig::new(3, set).unwrap().address();
        assert_ne!(a, b);
    }

    #[test]
    fn test_slots_follow_canonical_order() {
        let config = MultisigConfig::new(2, keys(4)).unwrap();
        for (i, key) in config.public_keys().iter().enumerate() {
            assert_eq!(config.slot_of(key), Some(i as u16));
        }
        assert_eq!(config.slot_of(&KeyPair::generate().public_key), None);
    }

    #[test]
    fn test_from_canonical_rejects_unsorted() {
        let config = MultisigConfig::new(2, keys(3)).unwrap();
        let mut unsorted = config.public_keys().to_vec();
        unsorted.swap(0, 2);

        assert!(MultisigConfig::from_canonical(2, config.public_keys().to_vec()).is_ok());
        assert!(MultisigConfig::from_canonical(2, unsorted).is_err());
    }

    #[test]
    fn test_program_layout() {
        let config = MultisigConfig::new(2, keys(3)).unwrap();
        let program = config.program();
        assert_eq!(&program[..4], &[2, 0, 3, 0]);
        assert_eq!(program.len(), 4 + 3 * 33);
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(default_threshold(1), 1);
        assert_eq!(default_threshold(4), 3);
        assert_eq!(default_threshold(7), 5);
        assert_eq!(default_threshold(16), 12);
    }

    #[test]
    fn test_parse_public_keys() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let list = format!("{}, {},", a.public_key_hex(), b.public_key_hex());

        let parsed = parse_public_keys(&list).unwrap();
        assert_eq!(parsed, vec![a.public_key, b.public_key]);
        assert!(parse_public_keys("nothex").is_err());
    }
}
