//! globalparam: multi-signed global parameter governance
//!
//! This crate builds and authorizes transactions that change network-wide
//! gas parameters:
//! - Canonical binary transaction codec with a hex hand-off form
//! - Parameter update and snapshot builders
//! - M-of-N multi-signature assembly with canonical key ordering
//! - Signing sessions that can be resumed across invocations
//! - Password-protected admin wallets
//! - JSON-RPC submission
//!
//! # Example
//!
//! ```rust
//! use globalparam::core::build_parameter_update;
//! use globalparam::crypto::KeyPair;
//! use globalparam::multisig::{MultisigConfig, SigningSession};
//!
//! let admins: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
//! let keys = admins.iter().map(|kp| kp.public_key).collect();
//! let config = MultisigConfig::new(2, keys).unwrap();
//!
//! let tx = build_parameter_update(500, 20000, [("gasPrice", "2500")]).unwrap();
//! let mut session = SigningSession::new(tx, config);
//! session.add_signature(&admins[0]).unwrap();
//!
//! // Hand the hex to the next admin
//! let hex = session.to_hex();
//! let mut session = SigningSession::from_hex(&hex, session.config().clone()).unwrap();
//! session.add_signature(&admins[2]).unwrap();
//!
//! let raw = session.finalize().unwrap();
//! println!("Ready to submit: {}", raw);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod network;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use core::{
    build_parameter_update, build_snapshot_request, GlobalParam, Operation, Transaction,
    TransactionBuilder,
};
pub use crypto::{Address, KeyPair};
pub use multisig::{add_signature, MultisigConfig, SigningSession};
pub use network::{NetworkClient, RpcClient};
pub use wallet::Wallet;
