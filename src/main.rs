//! Global parameter governance CLI
//!
//! Builds, multi-signs and submits transactions that change network-wide
//! gas parameters or snapshot them.

use clap::{Parser, Subcommand};
use globalparam::cli;
use globalparam::core::ParamValues;
use std::path::PathBuf;

/// Default fee gas price for governance transactions
const DEFAULT_GAS_PRICE: &str = "500";

/// Default fee gas limit for governance transactions
const DEFAULT_GAS_LIMIT: &str = "20000";

#[derive(Parser)]
#[command(name = "globalparam")]
#[command(version)]
#[command(about = "Multi-signed global parameter governance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an unsigned global parameter update transaction
    GenUpdateParamTx {
        /// Gas price paid for this transaction
        #[arg(long, default_value = DEFAULT_GAS_PRICE)]
        gas_price: u64,

        /// Gas limit for this transaction
        #[arg(long, default_value = DEFAULT_GAS_LIMIT)]
        gas_limit: u64,

        /// New network gas price
        #[arg(long)]
        new_gas_price: Option<u64>,

        /// New contract deployment gas
        #[arg(long)]
        new_deploy_gas: Option<u64>,

        /// New contract migration gas
        #[arg(long)]
        new_migrate_gas: Option<u64>,

        /// Legacy: sets both deployment and migration gas
        #[arg(long)]
        new_contract_gas: Option<u64>,
    },

    /// Generate an unsigned snapshot transaction
    GenCreateSnapshotTx {
        /// Gas price paid for this transaction
        #[arg(long, default_value = DEFAULT_GAS_PRICE)]
        gas_price: u64,

        /// Gas limit for this transaction
        #[arg(long, default_value = DEFAULT_GAS_LIMIT)]
        gas_limit: u64,
    },

    /// Add one admin signature to a raw transaction
    MultiSignTx {
        /// Wallet file holding the admin account
        #[arg(short, long)]
        wallet: PathBuf,

        /// Account address or label (default: first account)
        #[arg(short, long, default_value = "")]
        account: String,

        /// Signature threshold (default: ceil(5n/7))
        #[arg(long)]
        m: Option<u16>,

        /// Hex-encoded transaction
        #[arg(long)]
        raw_tx: String,

        /// All admin public keys, comma-separated hex
        #[arg(long)]
        pub_keys: String,
    },

    /// Submit a fully signed transaction
    SendTx {
        /// Hex-encoded transaction
        #[arg(long)]
        raw_tx: String,

        /// Node JSON-RPC address
        #[arg(long)]
        rpc_addr: String,

        /// Blocks to wait for after submission
        #[arg(long, default_value = "0")]
        wait_blocks: u32,
    },

    /// Update global parameters using the admins in a config file
    UpdateParam {
        /// Config file path
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Blocks to wait for after submission
        #[arg(long, default_value = "0")]
        wait_blocks: u32,
    },

    /// Snapshot global parameters using the admins in a config file
    CreateSnapshot {
        /// Config file path
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Blocks to wait for after submission
        #[arg(long, default_value = "0")]
        wait_blocks: u32,
    },

    /// Decode a raw transaction and show its signing progress
    InspectTx {
        /// Hex-encoded transaction
        #[arg(long)]
        raw_tx: String,
    },

    /// Print the multi-sig address of an admin key set
    MultisigAddr {
        /// Signature threshold (default: ceil(5n/7))
        #[arg(long)]
        m: Option<u16>,

        /// All admin public keys, comma-separated hex
        #[arg(long)]
        pub_keys: String,
    },

    /// List the recognized global parameter names
    Params,

    /// Wallet operations
    Wallet {
        #[command(subcommand)]
        action: WalletCommands,
    },
}

#[derive(Subcommand)]
enum WalletCommands {
    /// Create a new wallet file
    New {
        /// Wallet file path
        #[arg(short, long)]
        wallet: PathBuf,
    },

    /// Add a new password-protected account
    Add {
        /// Wallet file path
        #[arg(short, long)]
        wallet: PathBuf,

        /// Optional label for the account
        #[arg(short, long, default_value = "")]
        label: String,
    },

    /// List accounts
    List {
        /// Wallet file path
        #[arg(short, long)]
        wallet: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::GenUpdateParamTx {
            gas_price,
            gas_limit,
            new_gas_price,
            new_deploy_gas,
            new_migrate_gas,
            new_contract_gas,
        } => {
            let values = ParamValues {
                gas_price: new_gas_price,
                deploy_gas: new_deploy_gas,
                migrate_gas: new_migrate_gas,
                contract_gas: new_contract_gas,
            };
            cli::cmd_gen_update_param_tx(gas_price, gas_limit, values)?;
        }

        Commands::GenCreateSnapshotTx {
            gas_price,
            gas_limit,
        } => {
            cli::cmd_gen_create_snapshot_tx(gas_price, gas_limit)?;
        }

        Commands::MultiSignTx {
            wallet,
            account,
            m,
            raw_tx,
            pub_keys,
        } => {
            cli::cmd_multi_sign_tx(&wallet, &account, m, &raw_tx, &pub_keys)?;
        }

        Commands::SendTx {
            raw_tx,
            rpc_addr,
            wait_blocks,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cli::cmd_send_tx(&raw_tx, &rpc_addr, wait_blocks))?;
        }

        Commands::UpdateParam {
            config,
            wait_blocks,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cli::cmd_update_param(&config, wait_blocks))?;
        }

        Commands::CreateSnapshot {
            config,
            wait_blocks,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cli::cmd_create_snapshot(&config, wait_blocks))?;
        }

        Commands::InspectTx { raw_tx } => {
            cli::cmd_inspect_tx(&raw_tx)?;
        }

        Commands::MultisigAddr { m, pub_keys } => {
            cli::cmd_multisig_addr(m, &pub_keys)?;
        }

        Commands::Params => {
            cli::cmd_list_params()?;
        }

        Commands::Wallet { action } => match action {
            WalletCommands::New { wallet } => {
                cli::cmd_wallet_new(&wallet)?;
            }
            WalletCommands::Add { wallet, label } => {
                cli::cmd_wallet_add(&wallet, &label)?;
            }
            WalletCommands::List { wallet } => {
                cli::cmd_wallet_list(&wallet)?;
            }
        },
    }

    Ok(())
}
