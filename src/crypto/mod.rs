//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 / RIPEMD-160 hashing
//! - ECDSA key management (secp256k1)
//! - Base58Check addresses

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{Address, ADDRESS_LEN, ADDRESS_VERSION};
pub use hash::{checksum, double_sha256, hash160, sha256};
pub use keys::{
    compare_public_keys, public_key_from_hex, sign_digest, verify_signature, KeyError, KeyPair,
    PUBLIC_KEY_LEN, SIGNATURE_LEN,
};
pub use secp256k1::PublicKey;
