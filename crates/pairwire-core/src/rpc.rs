//! JSON-RPC envelopes and protocol methods

use crate::identifiers::{RequestId, Topic};
use serde::{Deserialize, Serialize};

/// Closed set of protocol methods this core speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolMethod {
    /// `wc_sessionAuthenticate`
    #[serde(rename = "wc_sessionAuthenticate")]
    SessionAuthenticate,
}

impl ProtocolMethod {
    /// Method name on the wire
    pub fn method(&self) -> &'static str {
        match self {
            ProtocolMethod::SessionAuthenticate => "wc_sessionAuthenticate",
        }
    }

    /// Relay tag of the request
    pub fn request_tag(&self) -> u32 {
        match self {
            ProtocolMethod::SessionAuthenticate => 1116,
        }
    }

    /// Relay tag of the response
    pub fn response_tag(&self) -> u32 {
        match self {
            ProtocolMethod::SessionAuthenticate => 1117,
        }
    }

    /// Time-to-live of messages for this method, in seconds
    pub fn ttl_secs(&self) -> u64 {
        match self {
            ProtocolMethod::SessionAuthenticate => 3600,
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
}

/// Outcome carried by a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcOutcome {
    /// Successful result
    Result(serde_json::Value),
    /// Error object
    Error(RpcError),
}

/// JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Protocol version, always `2.0`
    pub jsonrpc: String,
    /// Id of the request being answered
    pub id: RequestId,
    /// Result or error
    #[serde(flatten)]
    pub outcome: RpcOutcome,
}

impl RpcResponse {
    /// Successful response with a serialisable result
    pub fn result<T: Serialize>(id: RequestId, result: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            jsonrpc: "2.0".to_string(),
            id,
            outcome: RpcOutcome::Result(serde_json::to_value(result)?),
        })
    }

    /// Error response
    pub fn error(id: RequestId, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            outcome: RpcOutcome::Error(error),
        }
    }
}

/// A request kept in history so responses can be correlated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRecord {
    /// Request id
    pub id: RequestId,
    /// Topic the request was exchanged on
    pub topic: Topic,
    /// Protocol method
    pub method: ProtocolMethod,
    /// Raw request parameters
    pub request: serde_json::Value,
}

/// Success response delivered to a response subscription
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSubscriptionPayload {
    /// Request id
    pub id: RequestId,
    /// Topic the request was sent on (the pairing topic)
    pub topic: Topic,
    /// Original request parameters
    pub request: serde_json::Value,
    /// Response result
    pub response: serde_json::Value,
}

/// Error response delivered to an error subscription
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSubscriptionErrorPayload {
    /// Request id
    pub id: RequestId,
    /// Topic the request was sent on
    pub topic: Topic,
    /// Original request parameters
    pub request: serde_json::Value,
    /// Error sent by the peer
    pub error: RpcError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_wire_shape() {
        let ok = RpcResponse::result(RequestId(7), &serde_json::json!({"a": 1})).unwrap();
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert_eq!(value["result"]["a"], 1);

        let err = RpcResponse::error(
            RequestId(8),
            RpcError {
                code: 12001,
                message: "User rejected".to_string(),
            },
        );
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["error"]["code"], 12001);
        let back: RpcResponse = serde_json::from_value(value).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_method_name() {
        let method = ProtocolMethod::SessionAuthenticate;
        assert_eq!(
            serde_json::to_value(method).unwrap(),
            serde_json::json!(method.method())
        );
        assert_eq!(method.request_tag() + 1, method.response_tag());
    }
}
