//! Node access
//!
//! Submits finalized transactions to a node and follows the chain height
//! over the node's JSON-RPC interface.

pub mod client;
pub mod message;

pub use client::{NetworkClient, NetworkError, RpcClient, DEFAULT_TIMEOUT, POLL_INTERVAL};
pub use message::{
    RpcRequest, RpcResponse, JSONRPC_VERSION, METHOD_GET_BLOCK_COUNT, METHOD_SEND_RAW_TRANSACTION,
};
