//! Global parameter operations
//!
//! The payload of every transaction this tool produces: a call into the
//! global-params native contract that either updates a set of recognized
//! parameters or snapshots their current values.

use bytes::{Buf, BufMut};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::codec::{
    get_length, get_var_string, put_var_uint, put_var_string, CodecError, Decode, Encode,
};
use super::transaction::TransactionError;
use crate::crypto::Address;

/// Address of the global-params native contract
pub const GLOBAL_PARAMS_CONTRACT: Address = Address([
    0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
]);

/// Contract method that updates parameters
pub const METHOD_SET_GLOBAL_PARAM: &str = "setGlobalParam";

/// Contract method that snapshots parameters
pub const METHOD_CREATE_SNAPSHOT: &str = "createSnapshot";

/// Parameters the global-params contract accepts.
///
/// Variant order matches the byte order of the parameter names, so a
/// `BTreeMap<GlobalParam, _>` iterates in canonical wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GlobalParam {
    /// Gas charged for deploying a contract
    ContractCreate,
    /// Gas charged for migrating a contract
    ContractMigrate,
    /// Minimum transaction gas price
    GasPrice,
}

impl GlobalParam {
    pub const ALL: [GlobalParam; 3] = [
        GlobalParam::ContractCreate,
        GlobalParam::ContractMigrate,
        GlobalParam::GasPrice,
    ];

    /// Name used on-chain
    pub fn name(&self) -> &'static str {
        match self {
            GlobalParam::ContractCreate => "Ontology.Contract.Create",
            GlobalParam::ContractMigrate => "Ontology.Contract.Migrate",
            GlobalParam::GasPrice => "gasPrice",
        }
    }
}

impl fmt::Display for GlobalParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GlobalParam {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| TransactionError::InvalidParameterName(s.to_string()))
    }
}

/// The operation carried in a transaction payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Update one or more parameters to new string-encoded values
    SetGlobalParams(BTreeMap<GlobalParam, String>),
    /// Record the currently effective parameter values
    CreateSnapshot,
}

impl Operation {
    pub fn method(&self) -> &'static str {
        match self {
            Operation::SetGlobalParams(_) => METHOD_SET_GLOBAL_PARAM,
            Operation::CreateSnapshot => METHOD_CREATE_SNAPSHOT,
        }
    }

    /// Parameter changes keyed by on-chain name (empty for snapshots)
    pub fn param_changes(&self) -> BTreeMap<String, String> {
        match self {
            Operation::SetGlobalParams(changes) => changes
                .iter()
                .map(|(param, value)| (param.name().to_string(), value.clone()))
                .collect(),
            Operation::CreateSnapshot => BTreeMap::new(),
        }
    }
}

impl Encode for Operation {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        GLOBAL_PARAMS_CONTRACT.encode(buf);
        put_var_string(buf, self.method());

        if let Operation::SetGlobalParams(changes) = self {
            put_var_uint(buf, changes.len() as u64);
            for (param, value) in changes {
                put_var_string(buf, param.name());
                put_var_string(buf, value);
            }
        }
    }
}

impl Decode for Operation {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, CodecError> {
        let contract = Address::decode(buf)?;
        if contract != GLOBAL_PARAMS_CONTRACT {
            return Err(CodecError::Invalid(format!(
                "unexpected contract {}",
                contract.to_hex()
            )));
        }

        let method = get_var_string(buf)?;
        match method.as_str() {
            METHOD_CREATE_SNAPSHOT => Ok(Operation::CreateSnapshot),
            METHOD_SET_GLOBAL_PARAM => {
                let count = get_length(buf)?;
                if count == 0 {
                    return Err(CodecError::Invalid("empty parameter list".to_string()));
                }

                let mut changes = BTreeMap::new();
                let mut previous: Option<GlobalParam> = None;
                for _ in 0..count {
                    let name = get_var_string(buf)?;
                    let param: GlobalParam = name
                        .parse()
                        .map_err(|e: TransactionError| CodecError::Invalid(e.to_string()))?;
                    if previous.map_or(false, |p| p >= param) {
                        return Err(CodecError::Invalid(format!(
                            "parameter {} out of canonical order",
                            name
                        )));
                    }
                    previous = Some(param);
                    changes.insert(param, get_var_string(buf)?);
                }
                Ok(Operation::SetGlobalParams(changes))
            }
            other => Err(CodecError::Invalid(format!("unknown method {}", other))),
        }
    }
}
