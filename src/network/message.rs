//! JSON-RPC message types
//!
//! The request and response envelopes spoken by the node's JSON-RPC
//! endpoint. Responses carry a numeric `error` code (0 on success) and a
//! human readable `desc` alongside the `result`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::client::NetworkError;

/// JSON-RPC protocol version
pub const JSONRPC_VERSION: &str = "2.0";

/// Method that submits a raw transaction
pub const METHOD_SEND_RAW_TRANSACTION: &str = "sendrawtransaction";

/// Method that returns the number of blocks in the chain
pub const METHOD_GET_BLOCK_COUNT: &str = "getblockcount";

/// Error code the node uses for success
pub const RPC_SUCCESS: i64 = 0;

/// RPC request
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(method: &str, params: serde_json::Value, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }
}

/// RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub error: i64,
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

impl RpcResponse {
    /// Turn the envelope into its typed result, or the node's rejection
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, NetworkError> {
        if self.error != RPC_SUCCESS {
            // Nodes put the detailed reason in `result` when they have one
            let detail = match &self.result {
                serde_json::Value::String(s) if !s.is_empty() => s.clone(),
                _ => self.desc,
            };
            return Err(NetworkError::Rejected {
                code: self.error,
                message: detail,
            });
        }

        if self.result.is_null() {
            return Err(NetworkError::InvalidResponse(
                "missing result field".to_string(),
            ));
        }
        Ok(serde_json::from_value(self.result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = RpcRequest::new(
            METHOD_SEND_RAW_TRANSACTION,
            serde_json::json!(["00d1"]),
            1,
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "sendrawtransaction");
        assert_eq!(value["params"][0], "00d1");
        assert_eq!(value["id"], 1);
    }

    #[test]
    fn test_success_response() {
        let body = r#"{"desc":"SUCCESS","error":0,"id":1,"jsonrpc":"2.0","result":"ab12"}"#;
        let response: RpcResponse = serde_json::from_str(body).unwrap();
        let hash: String = response.into_result().unwrap();
        assert_eq!(hash, "ab12");

        let body = r#"{"desc":"SUCCESS","error":0,"id":1,"jsonrpc":"2.0","result":1024}"#;
        let response: RpcResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_result::<u32>().unwrap(), 1024);
    }

    #[test]
    fn test_rejected_response() {
        let body = r#"{"desc":"INTERNAL ERROR","error":43001,"id":1,"jsonrpc":"2.0","result":"duplicated transaction detected"}"#;
        let response: RpcResponse = serde_json::from_str(body).unwrap();
        match response.into_result::<String>() {
            Err(NetworkError::Rejected { code, message }) => {
                assert_eq!(code, 43001);
                assert_eq!(message, "duplicated transaction detected");
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        let body = r#"{"desc":"INVALID PARAMS","error":45002,"id":1,"jsonrpc":"2.0","result":""}"#;
        let response: RpcResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            response.into_result::<String>(),
            Err(NetworkError::Rejected { message, .. }) if message == "INVALID PARAMS"
        ));
    }

    #[test]
    fn test_malformed_response() {
        let body = r#"{"desc":"SUCCESS","error":0,"id":1,"jsonrpc":"2.0"}"#;
        let response: RpcResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            response.into_result::<String>(),
            Err(NetworkError::InvalidResponse(_))
        ));

        let body = r#"{"desc":"SUCCESS","error":0,"id":1,"jsonrpc":"2.0","result":{"x":1}}"#;
        let response: RpcResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            response.into_result::<u32>(),
            Err(NetworkError::Json(_))
        ));
    }
}
