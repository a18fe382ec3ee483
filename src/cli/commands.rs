//! CLI commands for global parameter governance
//!
//! Implements all command handlers for the CLI interface. Commands whose
//! output is relayed to the next operator (raw transactions, transaction
//! ids) print only that value on stdout; progress goes to the logger.

use std::path::Path;
use std::time::Duration;

use crate::config::{Config, WalletAccount};
use crate::core::{GlobalParam, ParamValues, Transaction, TransactionBuilder, TransactionError};
use crate::multisig::{
    default_threshold, parse_public_keys, MultisigConfig, MultisigError, SigningSession,
};
use crate::network::{NetworkClient, RpcClient};
use crate::wallet::{read_password, AdminAccount, Wallet, WalletError};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// How long `--wait-blocks` waits per requested block
const WAIT_PER_BLOCK: Duration = Duration::from_secs(60);

/// Password prompts per admin before the config flow aborts
const PASSWORD_ATTEMPTS: u32 = 3;

// =============================================================================
// Offline transaction building
// =============================================================================

/// Build an unsigned parameter update and print its hex form
pub fn cmd_gen_update_param_tx(
    gas_price: u64,
    gas_limit: u64,
    values: ParamValues,
) -> CliResult<String> {
    let changes = values.into_changes();
    let tx = TransactionBuilder::new(gas_price, gas_limit).build_typed_update(changes)?;
    log::info!("Built parameter update {}", tx.id());
    for (name, value) in tx.param_changes() {
        log::info!("  {} = {}", name, value);
    }

    let encoded = tx.to_hex();
    println!("{}", encoded);
    Ok(encoded)
}

/// Build an unsigned snapshot request and print its hex form
pub fn cmd_gen_create_snapshot_tx(gas_price: u64, gas_limit: u64) -> CliResult<String> {
    let tx = TransactionBuilder::new(gas_price, gas_limit).build_snapshot_request()?;
    log::info!("Built snapshot request {}", tx.id());

    let encoded = tx.to_hex();
    println!("{}", encoded);
    Ok(encoded)
}

// =============================================================================
// Signing and submission
// =============================================================================

/// Key set from `--m` and `--pub-keys`; a missing M takes the default
fn key_set(m: Option<u16>, pub_keys: &str) -> Result<MultisigConfig, MultisigError> {
    let keys = parse_public_keys(pub_keys)?;
    let threshold = m.unwrap_or_else(|| default_threshold(keys.len()));
    MultisigConfig::new(threshold, keys)
}

/// Add one admin's signature to a raw transaction and print the new hex form
pub fn cmd_multi_sign_tx(
    wallet_path: &Path,
    account: &str,
    m: Option<u16>,
    raw_tx: &str,
    pub_keys: &str,
) -> CliResult<String> {
    let config = key_set(m, pub_keys)?;
    let mut session = SigningSession::from_hex(raw_tx, config)?;

    let wallet = Wallet::open(wallet_path)?;
    let password = read_password(&format!(
        "please input account {} in wallet {} password: ",
        account,
        wallet_path.display()
    ))?;
    let admin = wallet.get_account(account, &password)?;

    let state = session.add_signature(&admin.key_pair)?;
    log::info!(
        "Multi-sig address {} ({}): {}",
        session.config().address(),
        session.config().description(),
        state
    );

    let encoded = session.to_hex();
    println!("{}", encoded);
    Ok(encoded)
}

/// Finalize and submit a session, optionally waiting for blocks afterwards
pub async fn submit_session(
    session: &mut SigningSession,
    client: &dyn NetworkClient,
    wait_blocks: u32,
) -> CliResult<String> {
    session.finalize()?;
    let id = session.submit(client).await?;

    if wait_blocks > 0 {
        log::info!("Waiting for {} block(s)...", wait_blocks);
        let height = client
            .wait_for_blocks(wait_blocks, WAIT_PER_BLOCK * wait_blocks)
            .await?;
        log::info!("Chain reached height {}", height);
    }
    Ok(id)
}

/// Verify a fully signed raw transaction, submit it, and print its id
pub async fn cmd_send_tx(raw_tx: &str, rpc_addr: &str, wait_blocks: u32) -> CliResult<String> {
    let tx = Transaction::from_hex(raw_tx)?;
    let config = tx
        .authorization()
        .map(|auth| auth.config().clone())
        .ok_or(MultisigError::Unsigned)?;
    let mut session = SigningSession::from_hex(raw_tx, config)?;

    let client = RpcClient::new(rpc_addr)?;
    log::info!("Submitting to {}", client.url());
    let id = submit_session(&mut session, &client, wait_blocks).await?;
    println!("{}", id);
    Ok(id)
}

// =============================================================================
// Config-driven flows
// =============================================================================

/// Open every configured wallet, sign with admins until M is reached, and
/// return the completed session.
///
/// `password_for` supplies each admin's password. A rejected password is
/// asked for again; after `PASSWORD_ATTEMPTS` failures the flow aborts with
/// `InvalidPassword`.
pub fn collect_admin_signatures<B, F>(
    config: &Config,
    build: B,
    mut password_for: F,
) -> CliResult<SigningSession>
where
    B: FnOnce(TransactionBuilder) -> Result<Transaction, TransactionError>,
    F: FnMut(&WalletAccount) -> Result<String, WalletError>,
{
    let mut wallets = Vec::with_capacity(config.wallets.len());
    let mut keys = Vec::with_capacity(config.wallets.len());
    for entry in &config.wallets {
        let wallet = Wallet::open(&entry.path)?;
        keys.push(wallet.public_key(&entry.account)?);
        wallets.push((entry, wallet));
    }

    let ms_config = MultisigConfig::new(config.threshold(), keys)?;
    log::info!(
        "Multi-sig address {} ({})",
        ms_config.address(),
        ms_config.description()
    );

    let builder = TransactionBuilder::new(config.gas_price, config.gas_limit)
        .payer(ms_config.address());
    let mut session = SigningSession::new(build(builder)?, ms_config);

    for (entry, wallet) in &wallets {
        if session.is_complete() {
            break;
        }

        let admin = unlock_admin(entry, wallet, &mut password_for)?;
        session.add_signature(&admin.key_pair)?;
    }
    Ok(session)
}

/// Decrypt an admin account, re-prompting after a wrong password up to
/// `PASSWORD_ATTEMPTS` times
fn unlock_admin<F>(
    entry: &WalletAccount,
    wallet: &Wallet,
    password_for: &mut F,
) -> Result<AdminAccount, WalletError>
where
    F: FnMut(&WalletAccount) -> Result<String, WalletError>,
{
    let mut attempt = 1;
    loop {
        let password = password_for(entry)?;
        match wallet.get_account(&entry.account, &password) {
            Err(WalletError::InvalidPassword(address)) if attempt < PASSWORD_ATTEMPTS => {
                log::warn!(
                    "Wrong password for {} in {} ({}/{})",
                    address,
                    entry.path.display(),
                    attempt,
                    PASSWORD_ATTEMPTS
                );
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn prompt_admin_password(entry: &WalletAccount) -> Result<String, WalletError> {
    read_password(&format!(
        "please input account {} in wallet {} password: ",
        entry.account,
        entry.path.display()
    ))
}

/// Update global parameters using the admins listed in a config file
pub async fn cmd_update_param(config_path: &Path, wait_blocks: u32) -> CliResult<String> {
    let config = Config::load(config_path)?;
    let changes = config.parameter_changes()?;

    let mut session = collect_admin_signatures(
        &config,
        |builder| builder.build_typed_update(changes),
        prompt_admin_password,
    )?;

    let client = RpcClient::new(&config.rpc_addr)?;
    log::info!("Submitting to {}", client.url());
    let id = submit_session(&mut session, &client, wait_blocks).await?;
    println!("{}", id);
    Ok(id)
}

/// Snapshot global parameters using the admins listed in a config file
pub async fn cmd_create_snapshot(config_path: &Path, wait_blocks: u32) -> CliResult<String> {
    let config = Config::load(config_path)?;

    let mut session = collect_admin_signatures(
        &config,
        TransactionBuilder::build_snapshot_request,
        prompt_admin_password,
    )?;

    let client = RpcClient::new(&config.rpc_addr)?;
    log::info!("Submitting to {}", client.url());
    let id = submit_session(&mut session, &client, wait_blocks).await?;
    println!("{}", id);
    Ok(id)
}

// =============================================================================
// Inspection
// =============================================================================

/// Decode a raw transaction and print what it does and who has signed it
pub fn cmd_inspect_tx(raw_tx: &str) -> CliResult<()> {
    let tx = Transaction::from_hex(raw_tx)?;

    println!("📄 Transaction {}", tx.id());
    println!("   ├─ Method: {}", tx.operation.method());
    for (name, value) in tx.param_changes() {
        println!("   │    {} = {}", name, value);
    }
    println!("   ├─ Gas price: {}", tx.gas_price);
    println!("   ├─ Gas limit: {}", tx.gas_limit);
    println!("   ├─ Nonce: {}", tx.nonce);
    if tx.payer.is_empty() {
        println!("   ├─ Payer: (not bound yet)");
    } else {
        println!("   ├─ Payer: {}", tx.payer);
    }

    match tx.authorization() {
        None => println!("   └─ Signatures: none"),
        Some(auth) => {
            let config = auth.config();
            println!(
                "   ├─ Key set: {} at {}",
                config.description(),
                config.address()
            );
            println!(
                "   └─ Signatures: {}/{}",
                auth.signatures().len(),
                config.threshold()
            );
            for signer in auth.signers() {
                println!("        ✍️  {}", hex::encode(signer.serialize()));
            }

            match crate::multisig::ensure_submittable(&tx) {
                Ok(()) => println!("✅ Ready to submit"),
                Err(e) => println!("⏳ Not submittable: {}", e),
            }
        }
    }
    Ok(())
}

/// Print the multi-sig address of a key set
pub fn cmd_multisig_addr(m: Option<u16>, pub_keys: &str) -> CliResult<String> {
    let config = key_set(m, pub_keys)?;
    let address = config.address().to_base58();
    log::info!("Key set {}", config.description());
    println!("{}", address);
    Ok(address)
}

/// Show the recognized parameter names
pub fn cmd_list_params() -> CliResult<()> {
    println!("🔧 Global parameters:");
    for param in GlobalParam::ALL {
        println!("   • {}", param);
    }
    Ok(())
}

// =============================================================================
// Wallet commands
// =============================================================================

/// Create a new wallet file
pub fn cmd_wallet_new(path: &Path) -> CliResult<()> {
    Wallet::create(path)?;
    println!("✅ Wallet created: {}", path.display());
    Ok(())
}

/// Add a password-protected account to a wallet, creating the file if needed
pub fn cmd_wallet_add(path: &Path, label: &str) -> CliResult<()> {
    let mut wallet = if path.exists() {
        Wallet::open(path)?
    } else {
        Wallet::create(path)?
    };

    let password = read_password("Enter password for the new account: ")?;
    let entry = wallet.add_account(label, &password)?;
    wallet.save()?;

    println!("✅ Account added!");
    println!("   📍 Address: {}", entry.address);
    println!("   🔑 Public key: {}", entry.public_key);
    Ok(())
}

/// List the accounts in a wallet
pub fn cmd_wallet_list(path: &Path) -> CliResult<()> {
    let wallet = Wallet::open(path)?;
    let accounts = wallet.accounts();

    if accounts.is_empty() {
        println!("📭 No accounts found in {}", path.display());
        return Ok(());
    }

    println!("👛 Accounts in {} ({}):", path.display(), accounts.len());
    for account in accounts {
        if account.label.is_empty() {
            println!("   • {}", account.address);
        } else {
            println!("   • {} ({})", account.address, account.label);
        }
        println!("     {}", account.public_key);
    }
    Ok(())
}
