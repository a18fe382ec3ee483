//! Transaction builder
//!
//! Produces the canonical unsigned transaction for a parameter update or a
//! snapshot request.

use std::collections::BTreeMap;

use super::params::{GlobalParam, Operation};
use super::transaction::{Transaction, TransactionError};
use crate::crypto::Address;

/// Builder for global-parameter transactions
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    gas_price: u64,
    gas_limit: u64,
    nonce: Option<u32>,
    payer: Address,
}

impl TransactionBuilder {
    pub fn new(gas_price: u64, gas_limit: u64) -> Self {
        Self {
            gas_price,
            gas_limit,
            nonce: None,
            payer: Address::EMPTY,
        }
    }

    /// Use a fixed nonce instead of a random one
    pub fn nonce(mut self, nonce: u32) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the fee payer up front (normally the multi-sig address)
    pub fn payer(mut self, payer: Address) -> Self {
        self.payer = payer;
        self
    }

    /// Build a parameter update from on-chain parameter names to new values
    pub fn build_parameter_update<I, K, V>(
        self,
        changes: I,
    ) -> Result<Transaction, TransactionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = BTreeMap::new();
        for (name, value) in changes {
            let param: GlobalParam = name.as_ref().parse()?;
            if params.insert(param, value.into()).is_some() {
                return Err(TransactionError::DuplicateParameter(param.to_string()));
            }
        }
        self.build_typed_update(params)
    }

    /// Build a parameter update from already-validated parameters
    pub fn build_typed_update(
        self,
        params: BTreeMap<GlobalParam, String>,
    ) -> Result<Transaction, TransactionError> {
        if params.is_empty() {
            return Err(TransactionError::EmptyParameterChanges);
        }
        self.build(Operation::SetGlobalParams(params))
    }

    /// Build a snapshot request
    pub fn build_snapshot_request(self) -> Result<Transaction, TransactionError> {
        self.build(Operation::CreateSnapshot)
    }

    fn build(self, operation: Operation) -> Result<Transaction, TransactionError> {
        if self.gas_limit == 0 {
            return Err(TransactionError::InvalidGasLimit);
        }

        let nonce = self.nonce.unwrap_or_else(rand::random);
        let tx = Transaction::new(nonce, self.gas_price, self.gas_limit, self.payer, operation);
        log::debug!(
            "Built {} transaction {} (nonce {})",
            tx.operation.method(),
            tx.id(),
            nonce
        );
        Ok(tx)
    }
}

/// Build a parameter update with a random nonce
pub fn build_parameter_update<I, K, V>(
    gas_price: u64,
    gas_limit: u64,
    changes: I,
) -> Result<Transaction, TransactionError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    TransactionBuilder::new(gas_price, gas_limit).build_parameter_update(changes)
}

/// Build a snapshot request with a random nonce
pub fn build_snapshot_request(
    gas_price: u64,
    gas_limit: u64,
) -> Result<Transaction, TransactionError> {
    TransactionBuilder::new(gas_price, gas_limit).build_snapshot_request()
}

/// Parameter values as given on the command line or in a config file.
///
/// `contract_gas` is the legacy single knob that sets both the create and
/// the migrate cost; an explicit deploy or migrate value takes precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamValues {
    pub gas_price: Option<u64>,
    pub deploy_gas: Option<u64>,
    pub migrate_gas: Option<u64>,
    pub contract_gas: Option<u64>,
}

impl ParamValues {
    pub fn into_changes(self) -> BTreeMap<GlobalParam, String> {
        let mut changes = BTreeMap::new();
        if let Some(v) = self.gas_price {
            changes.insert(GlobalParam::GasPrice, v.to_string());
        }
        if let Some(v) = self.deploy_gas.or(self.contract_gas) {
            changes.insert(GlobalParam::ContractCreate, v.to_string());
        }
        if let Some(v) = self.migrate_gas.or(self.contract_gas) {
            changes.insert(GlobalParam::ContractMigrate, v.to_string());
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec::Decode;

    #[test]
    fn test_gas_price_update_decodes_exactly() {
        let tx = build_parameter_update(500, 20000, [("gasPrice", "2500")]).unwrap();
        let decoded = Transaction::from_hex(&tx.to_hex()).unwrap();

        let mut expected = BTreeMap::new();
        expected.insert("gasPrice".to_string(), "2500".to_string());
        assert_eq!(decoded.param_changes(), expected);
        assert_eq!(decoded.gas_price, 500);
        assert_eq!(decoded.gas_limit, 20000);
        assert_eq!(decoded.signature_count(), 0);
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let result = build_parameter_update(500, 20000, [("blockSize", "1")]);
        assert!(matches!(
            result,
            Err(TransactionError::InvalidParameterName(name)) if name == "blockSize"
        ));
    }

    #[test]
    fn test_empty_update_rejected() {
        let changes: Vec<(String, String)> = Vec::new();
        assert!(matches!(
            build_parameter_update(500, 20000, changes),
            Err(TransactionError::EmptyParameterChanges)
        ));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let result = build_parameter_update(500, 20000, [("gasPrice", "1"), ("gasPrice", "2")]);
        assert!(matches!(
            result,
            Err(TransactionError::DuplicateParameter(_))
        ));
    }

    #[test]
    fn test_zero_gas_limit_rejected() {
        assert!(matches!(
            build_snapshot_request(500, 0),
            Err(TransactionError::InvalidGasLimit)
        ));
        // Zero gas price is left to network policy
        assert!(build_snapshot_request(0, 20000).is_ok());
    }

    #[test]
    fn test_fixed_nonce_is_deterministic() {
        let a = TransactionBuilder::new(500, 20000)
            .nonce(7)
            .build_snapshot_request()
            .unwrap();
        let b = TransactionBuilder::new(500, 20000)
            .nonce(7)
            .build_snapshot_request()
            .unwrap();
        assert_eq!(a.to_hex(), b.to_hex());
        assert_eq!(
            Transaction::from_bytes(&hex::decode(a.to_hex()).unwrap()).unwrap(),
            a
        );
    }

    #[test]
    fn test_legacy_contract_gas_fans_out() {
        let values = ParamValues {
            gas_price: Some(2500),
            contract_gas: Some(4_000_000),
            migrate_gas: Some(20_000_000),
            ..Default::default()
        };
        let changes = values.into_changes();

        assert_eq!(changes[&GlobalParam::GasPrice], "2500");
        assert_eq!(changes[&GlobalParam::ContractCreate], "4000000");
        assert_eq!(changes[&GlobalParam::ContractMigrate], "20000000");
        assert!(ParamValues::default().into_changes().is_empty());
    }
}
