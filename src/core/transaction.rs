//! Transaction handling
//!
//! A transaction is an unsigned body (version, type, nonce, fee fields,
//! payer, and the operation payload) followed by an optional multi-signature
//! authorization section. The signing digest covers only the body, so it
//! stays fixed while signatures accumulate.

use bytes::{Buf, BufMut};
use std::collections::BTreeMap;
use thiserror::Error;

use super::codec::{
    get_length, get_u32, get_u64, get_u8, get_var_bytes, put_var_bytes, put_var_uint, CodecError,
    Decode, Encode,
};
use super::params::Operation;
use crate::crypto::{double_sha256, Address};
use crate::multisig::Authorization;

// =============================================================================
// Constants
// =============================================================================

/// Current transaction version
pub const TX_VERSION: u8 = 0;

/// Transaction type for contract invocations
pub const TX_TYPE_INVOKE: u8 = 0xd1;

// =============================================================================
// Error Types
// =============================================================================

/// Transaction-related errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(#[from] CodecError),
    #[error("Invalid hex encoding: {0}")]
    InvalidHexEncoding(#[from] hex::FromHexError),
    #[error("Invalid parameter name: {0}")]
    InvalidParameterName(String),
    #[error("Parameter {0} given more than once")]
    DuplicateParameter(String),
    #[error("Parameter update must change at least one parameter")]
    EmptyParameterChanges,
    #[error("Gas limit must be greater than zero")]
    InvalidGasLimit,
}

// =============================================================================
// Transaction
// =============================================================================

/// A global-parameter transaction, possibly carrying collected signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: u8,
    pub tx_type: u8,
    /// Random value that keeps otherwise identical updates distinct
    pub nonce: u32,
    pub gas_price: u64,
    pub gas_limit: u64,
    /// Account charged for gas; empty until bound to the multi-sig address
    pub payer: Address,
    pub operation: Operation,
    pub(crate) authorization: Option<Authorization>,
}

impl Transaction {
    /// Create a new unsigned transaction
    pub fn new(
        nonce: u32,
        gas_price: u64,
        gas_limit: u64,
        payer: Address,
        operation: Operation,
    ) -> Self {
        Self {
            version: TX_VERSION,
            tx_type: TX_TYPE_INVOKE,
            nonce,
            gas_price,
            gas_limit,
            payer,
            operation,
            authorization: None,
        }
    }

    /// Collected multi-signature, if any signer has signed yet
    pub fn authorization(&self) -> Option<&Authorization> {
        self.authorization.as_ref()
    }

    /// Number of signatures attached
    pub fn signature_count(&self) -> usize {
        self.authorization
            .as_ref()
            .map_or(0, |auth| auth.signatures().len())
    }

    /// Parameter changes keyed by on-chain name (empty for snapshots)
    pub fn param_changes(&self) -> BTreeMap<String, String> {
        self.operation.param_changes()
    }

    /// Canonical encoding of the unsigned body
    pub fn unsigned_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_unsigned(&mut out);
        out
    }

    /// The digest every co-signer signs
    pub fn signing_digest(&self) -> [u8; 32] {
        double_sha256(&self.unsigned_bytes())
    }

    /// Transaction id as reported by the network (digest, byte-reversed hex)
    pub fn id(&self) -> String {
        let mut digest = self.signing_digest();
        digest.reverse();
        hex::encode(digest)
    }

    /// Hex text form used to hand a transaction between invocations
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse the hex text form
    pub fn from_hex(encoded: &str) -> Result<Self, TransactionError> {
        let bytes = decode_hex(encoded)?;
        Ok(Self::from_bytes(&bytes)?)
    }

    fn encode_unsigned<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.version);
        buf.put_u8(self.tx_type);
        buf.put_u32_le(self.nonce);
        buf.put_u64_le(self.gas_price);
        buf.put_u64_le(self.gas_limit);
        self.payer.encode(buf);
        put_var_bytes(buf, &self.operation.to_bytes());
    }
}

impl Encode for Transaction {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        self.encode_unsigned(buf);
        match &self.authorization {
            Some(auth) => {
                put_var_uint(buf, 1);
                auth.encode(buf);
            }
            None => put_var_uint(buf, 0),
        }
    }
}

impl Decode for Transaction {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        let version = get_u8(buf)?;
        if version != TX_VERSION {
            return Err(CodecError::Invalid(format!(
                "unsupported transaction version {}",
                version
            )));
        }

        let tx_type = get_u8(buf)?;
        if tx_type != TX_TYPE_INVOKE {
            return Err(CodecError::Invalid(format!(
                "unsupported transaction type {:#04x}",
                tx_type
            )));
        }

        let nonce = get_u32(buf)?;
        let gas_price = get_u64(buf)?;
        let gas_limit = get_u64(buf)?;
        let payer = Address::decode(buf)?;
        let operation = Operation::from_bytes(&get_var_bytes(buf)?)?;

        let authorization = match get_length(buf)? {
            0 => None,
            1 => Some(Authorization::decode(buf)?),
            n => {
                return Err(CodecError::Invalid(format!(
                    "expected at most one authorization section, found {}",
                    n
                )))
            }
        };

        Ok(Self {
            version,
            tx_type,
            nonce,
            gas_price,
            gas_limit,
            payer,
            operation,
            authorization,
        })
    }
}

/// Decode hex text, tolerating surrounding whitespace and a `0x` prefix
pub fn decode_hex(encoded: &str) -> Result<Vec<u8>, TransactionError> {
    let trimmed = encoded.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    Ok(hex::decode(body)?)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::GlobalParam;

    fn sample_update() -> Transaction {
        let mut changes = BTreeMap::new();
        changes.insert(GlobalParam::GasPrice, "2500".to_string());
        Transaction::new(
            42,
            500,
            20000,
            Address::EMPTY,
            Operation::SetGlobalParams(changes),
        )
    }

    #[test]
    fn test_round_trip_unsigned() {
        let tx = sample_update();
        let bytes = tx.to_bytes();

        assert_eq!(Transaction::from_bytes(&bytes).unwrap(), tx);
        assert_eq!(decode_hex(&hex::encode(&bytes)).unwrap(), bytes);
        assert_eq!(Transaction::from_hex(&tx.to_hex()).unwrap(), tx);
    }

    #[test]
    fn test_unsigned_layout() {
        let tx = sample_update();
        let bytes = tx.to_bytes();

        assert_eq!(bytes[0], TX_VERSION);
        assert_eq!(bytes[1], TX_TYPE_INVOKE);
        assert_eq!(&bytes[2..6], &42u32.to_le_bytes());
        assert_eq!(&bytes[6..14], &500u64.to_le_bytes());
        assert_eq!(&bytes[14..22], &20000u64.to_le_bytes());
        // Empty authorization section
        assert_eq!(*bytes.last().unwrap(), 0);
        assert_eq!(tx.unsigned_bytes().len() + 1, bytes.len());
    }

    #[test]
    fn test_digest_depends_on_body() {
        let tx = sample_update();
        let mut other = tx.clone();
        other.nonce += 1;

        assert_ne!(tx.signing_digest(), other.signing_digest());
        assert_eq!(tx.signing_digest(), tx.clone().signing_digest());
        assert_eq!(tx.id().len(), 64);
    }

    #[test]
    fn test_hex_tolerates_prefix_and_whitespace() {
        let tx = sample_update();
        let wrapped = format!("  0x{}\n", tx.to_hex());
        assert_eq!(Transaction::from_hex(&wrapped).unwrap(), tx);
    }

    #[test]
    fn test_invalid_hex() {
        assert!(matches!(
            Transaction::from_hex("abc"),
            Err(TransactionError::InvalidHexEncoding(_))
        ));
        assert!(matches!(
            Transaction::from_hex("zz"),
            Err(TransactionError::InvalidHexEncoding(_))
        ));
    }

    #[test]
    fn test_truncated_rejected() {
        let bytes = sample_update().to_bytes();
        for cut in [1, 10, bytes.len() - 1] {
            assert!(matches!(
                Transaction::from_hex(&hex::encode(&bytes[..cut])),
                Err(TransactionError::MalformedTransaction(_))
            ));
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = sample_update().to_bytes();
        bytes.push(0xAA);
        assert!(matches!(
            Transaction::from_bytes(&bytes),
            Err(CodecError::TrailingBytes(1))
        ));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut bytes = sample_update().to_bytes();
        bytes[0] = 7;
        assert!(matches!(
            Transaction::from_bytes(&bytes),
            Err(CodecError::Invalid(_))
        ));
    }

    #[test]
    fn test_multiple_authorization_sections_rejected() {
        let mut bytes = sample_update().to_bytes();
        *bytes.last_mut().unwrap() = 2;
        assert!(Transaction::from_bytes(&bytes).is_err());
    }
}
