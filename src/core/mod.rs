//! Core transaction components
//!
//! This module contains the fundamental building blocks:
//! - Canonical binary codec
//! - Global parameter operations (update, snapshot)
//! - Transactions (unsigned body, signing digest, hex hand-off form)
//! - Transaction builder

pub mod builder;
pub mod codec;
pub mod params;
pub mod transaction;

pub use builder::{build_parameter_update, build_snapshot_request, ParamValues, TransactionBuilder};
pub use codec::{CodecError, Decode, Encode, MAX_VAR_BYTES};
pub use params::{
    GlobalParam, Operation, GLOBAL_PARAMS_CONTRACT, METHOD_CREATE_SNAPSHOT, METHOD_SET_GLOBAL_PARAM,
};
pub use transaction::{decode_hex, Transaction, TransactionError, TX_TYPE_INVOKE, TX_VERSION};
