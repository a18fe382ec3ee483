//! Admin wallet files
//!
//! A wallet is a JSON file holding one or more accounts. Public keys and
//! addresses are stored in the clear; private keys are sealed with the
//! account password (see `keystore`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::keystore::{self, SealedKey};
use crate::crypto::{public_key_from_hex, Address, KeyError, KeyPair, PublicKey};

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet file not found: {0}")]
    FileNotFound(String),
    #[error("Wallet file already exists: {0}")]
    WalletExists(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Account already exists: {0}")]
    AccountExists(String),
    #[error("Invalid password for account {0}")]
    InvalidPassword(String),
    #[error("Corrupt account entry: {0}")]
    CorruptAccount(String),
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("Encryption failed: {0}")]
    Encryption(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// Current wallet file format version
pub const WALLET_VERSION: &str = "1.0";

/// One account as stored in a wallet file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountEntry {
    /// Base58 address
    pub address: String,
    #[serde(default)]
    pub label: String,
    /// Compressed public key (hex)
    pub public_key: String,
    /// Sealed private key (base64)
    pub key: String,
    pub salt: String,
    pub iv: String,
    pub created_at: DateTime<Utc>,
}

impl AccountEntry {
    fn sealed(&self) -> SealedKey {
        SealedKey {
            ciphertext: self.key.clone(),
            salt: self.salt.clone(),
            iv: self.iv.clone(),
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        self.address == query || (!self.label.is_empty() && self.label == query)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WalletData {
    #[serde(default)]
    version: String,
    #[serde(default)]
    accounts: Vec<AccountEntry>,
}

/// An unlocked admin account, valid for one process invocation
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub wallet_path: PathBuf,
    pub address: Address,
    pub key_pair: KeyPair,
}

/// A wallet file and its accounts
#[derive(Debug)]
pub struct Wallet {
    path: PathBuf,
    data: WalletData,
}

impl Wallet {
    /// Create a new, empty wallet file
    pub fn create(path: &Path) -> Result<Self, WalletError> {
        if path.exists() {
            return Err(WalletError::WalletExists(path.display().to_string()));
        }

        let wallet = Self {
            path: path.to_path_buf(),
            data: WalletData {
                version: WALLET_VERSION.to_string(),
                accounts: Vec::new(),
            },
        };
        wallet.save()?;
        log::info!("Created wallet {}", path.display());
        Ok(wallet)
    }

    /// Open an existing wallet file
    pub fn open(path: &Path) -> Result<Self, WalletError> {
        if !path.is_file() {
            return Err(WalletError::FileNotFound(path.display().to_string()));
        }

        let json = fs::read_to_string(path)?;
        let data: WalletData = serde_json::from_str(&json)?;
        log::debug!(
            "Opened wallet {} ({} accounts)",
            path.display(),
            data.accounts.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Write the wallet back to its file
    pub fn save(&self) -> Result<(), WalletError> {
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn accounts(&self) -> &[AccountEntry] {
        &self.data.accounts
    }

    /// Generate a new account sealed under `password`
    pub fn add_account(
        &mut self,
        label: &str,
        password: &str,
    ) -> Result<AccountEntry, WalletError> {
        self.import_account(label, &KeyPair::generate(), password)
    }

    /// Store an existing key pair sealed under `password`
    pub fn import_account(
        &mut self,
        label: &str,
        key_pair: &KeyPair,
        password: &str,
    ) -> Result<AccountEntry, WalletError> {
        let address = key_pair.address().to_base58();
        if self.find_account(&address).is_some() {
            return Err(WalletError::AccountExists(address));
        }
        if !label.is_empty() && self.find_account(label).is_some() {
            return Err(WalletError::AccountExists(label.to_string()));
        }

        let sealed = keystore::seal(&key_pair.secret_key.secret_bytes(), password)?;
        let entry = AccountEntry {
            address,
            label: label.to_string(),
            public_key: key_pair.public_key_hex(),
            key: sealed.ciphertext,
            salt: sealed.salt,
            iv: sealed.iv,
            created_at: Utc::now(),
        };
        self.data.accounts.push(entry.clone());
        log::info!("Added account {} to {}", entry.address, self.path.display());
        Ok(entry)
    }

    /// Look up an account by address or label; an empty query selects the
    /// first account
    pub fn find_account(&self, query: &str) -> Option<&AccountEntry> {
        if query.is_empty() {
            return self.data.accounts.first();
        }
        self.data.accounts.iter().find(|a| a.matches(query))
    }

    fn account(&self, query: &str) -> Result<&AccountEntry, WalletError> {
        self.find_account(query)
            .ok_or_else(|| WalletError::AccountNotFound(query.to_string()))
    }

    /// Public key of an account; no password needed
    pub fn public_key(&self, query: &str) -> Result<PublicKey, WalletError> {
        let entry = self.account(query)?;
        Ok(public_key_from_hex(&entry.public_key)?)
    }

    /// Unlock an account with its password
    pub fn get_account(&self, query: &str, password: &str) -> Result<AdminAccount, WalletError> {
        let entry = self.account(query)?;
        let secret = keystore::open(&entry.sealed(), password)?
            .ok_or_else(|| WalletError::InvalidPassword(entry.address.clone()))?;

        let key_pair = KeyPair::from_secret_bytes(&secret)?;
        let address = key_pair.address();
        if address.to_base58() != entry.address {
            return Err(WalletError::CorruptAccount(format!(
                "key does not match address {}",
                entry.address
            )));
        }

        Ok(AdminAccount {
            wallet_path: self.path.clone(),
            address,
            key_pair,
        })
    }
}
