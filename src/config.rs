//! Configuration for the config-driven flows
//!
//! `update-param` and `create-snapshot` read a JSON file naming the admin
//! wallets, the threshold, the node endpoint and the fee settings:
//!
//! ```json
//! {
//!   "Wallets": [{ "Path": "wallets/admin1.json", "Account": "AXk..." }],
//!   "M": 5,
//!   "RPCAddr": "http://127.0.0.1:20336",
//!   "GasPrice": 500,
//!   "GasLimit": 20000,
//!   "NewGasPrice": 2500
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::{GlobalParam, ParamValues};
use crate::multisig::{default_threshold, MAX_SIGNERS};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("No new parameter value given (set NewGasPrice, NewDeployGas or NewMigrateGas)")]
    NoParameterChanges,
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A wallet file and the admin account to use from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WalletAccount {
    pub path: PathBuf,
    /// Address or label; empty selects the wallet's first account
    #[serde(default)]
    pub account: String,
}

/// Config file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    pub wallets: Vec<WalletAccount>,
    /// Threshold; 0 or absent means the default for the wallet count
    #[serde(default)]
    pub m: u16,
    #[serde(rename = "RPCAddr")]
    pub rpc_addr: String,
    pub gas_price: u64,
    pub gas_limit: u64,
    #[serde(default, alias = "DestinationGasPrice", skip_serializing_if = "Option::is_none")]
    pub new_gas_price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_deploy_gas: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_migrate_gas: Option<u64>,
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let json = fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&json)?;
        config.resolve_paths(path.parent().unwrap_or_else(|| Path::new("")));
        config.validate()?;
        log::debug!(
            "Loaded config {} ({} wallets, m = {})",
            path.display(),
            config.wallets.len(),
            config.threshold()
        );
        Ok(config)
    }

    /// Wallet paths are relative to the config file's directory
    fn resolve_paths(&mut self, base: &Path) {
        for wallet in &mut self.wallets {
            if wallet.path.is_relative() {
                wallet.path = base.join(&wallet.path);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.wallets.len();
        if n == 0 || n > MAX_SIGNERS {
            return Err(ConfigError::Invalid(format!(
                "need between 1 and {} wallets, got {}",
                MAX_SIGNERS, n
            )));
        }
        if usize::from(self.m) > n {
            return Err(ConfigError::Invalid(format!(
                "M = {} exceeds wallet count {}",
                self.m, n
            )));
        }
        if self.rpc_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("RPCAddr is empty".to_string()));
        }
        if self.gas_limit == 0 {
            return Err(ConfigError::Invalid("GasLimit must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Effective threshold
    pub fn threshold(&self) -> u16 {
        if self.m == 0 {
            default_threshold(self.wallets.len())
        } else {
            self.m
        }
    }

    /// Parameter changes requested by the config
    pub fn parameter_changes(&self) -> Result<BTreeMap<GlobalParam, String>, ConfigError> {
        let changes = ParamValues {
            gas_price: self.new_gas_price,
            deploy_gas: self.new_deploy_gas,
            migrate_gas: self.new_migrate_gas,
            contract_gas: None,
        }
        .into_changes();

        if changes.is_empty() {
            return Err(ConfigError::NoParameterChanges);
        }
        Ok(changes)
    }
}
