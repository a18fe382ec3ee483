//! 20-byte account addresses
//!
//! Addresses are rendered as Base58Check(version || hash160). Single-key
//! accounts hash the compressed public key; multi-signature accounts hash
//! their verification program (see `multisig::MultisigConfig::address`).

use super::hash::{checksum, hash160};
use super::keys::KeyError;
use secp256k1::PublicKey;
use std::fmt;
use std::str::FromStr;

/// Address length in bytes
pub const ADDRESS_LEN: usize = 20;

/// Base58Check version byte (addresses start with 'A')
pub const ADDRESS_VERSION: u8 = 0x17;

/// A 20-byte account or contract address
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address, used for "no payer chosen yet"
    pub const EMPTY: Address = Address([0u8; ADDRESS_LEN]);

    /// Address of a single public key
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(hash160(&public_key.serialize()))
    }

    /// Address of an arbitrary verification program
    pub fn from_program(program: &[u8]) -> Self {
        Self(hash160(program))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Base58Check encoding
    pub fn to_base58(&self) -> String {
        let mut data = Vec::with_capacity(1 + ADDRESS_LEN + 4);
        data.push(ADDRESS_VERSION);
        data.extend_from_slice(&self.0);
        let check = checksum(&data);
        data.extend_from_slice(&check);
        bs58::encode(data).into_string()
    }

    /// Parse a Base58Check address
    pub fn from_base58(encoded: &str) -> Result<Self, KeyError> {
        let invalid = || KeyError::InvalidAddress(encoded.to_string());

        let data = bs58::decode(encoded).into_vec().map_err(|_| invalid())?;
        if data.len() != 1 + ADDRESS_LEN + 4 || data[0] != ADDRESS_VERSION {
            return Err(invalid());
        }

        let (body, check) = data.split_at(1 + ADDRESS_LEN);
        if checksum(body) != check {
            return Err(invalid());
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&body[1..]);
        Ok(Self(bytes))
    }

    /// Raw hex form, used for contract addresses
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl FromStr for Address {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_base58_round_trip() {
        let kp = KeyPair::generate();
        let address = kp.address();
        let encoded = address.to_base58();

        assert!(encoded.starts_with('A'));
        assert_eq!(Address::from_base58(&encoded).unwrap(), address);
        assert_eq!(encoded.parse::<Address>().unwrap(), address);
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let encoded = KeyPair::generate().address().to_base58();
        let mut chars: Vec<char> = encoded.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '1' { '2' } else { '1' };
        let tampered: String = chars.into_iter().collect();

        assert!(matches!(
            Address::from_base58(&tampered),
            Err(KeyError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_empty_address() {
        assert!(Address::EMPTY.is_empty());
        assert!(!KeyPair::generate().address().is_empty());
        assert_eq!(Address::default(), Address::EMPTY);
    }
}
