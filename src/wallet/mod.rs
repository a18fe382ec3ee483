//! Wallet module for admin key storage

pub mod keystore;
pub mod wallet;

pub use keystore::{read_password, PASSWORD_ENV};
pub use wallet::{AccountEntry, AdminAccount, Wallet, WalletError, WALLET_VERSION};
