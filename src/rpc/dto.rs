//! Wire types for the full node's JSON-RPC dialect
//!
//! Requests go out as `{jsonrpc, method, params, id}`. Responses come back
//! capitalised: `{Result, Error}`, where `Error` is either a bare string or
//! an object carrying a `StackTrace`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version string the full node expects
pub const JSONRPC_VERSION: &str = "1.0";

/// Outgoing JSON-RPC request body
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: Vec<Value>,
    pub id: u64,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(method: &'a str, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id: 1,
        }
    }
}

/// Response envelope returned by the full node
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "Result", default)]
    pub result: Option<Value>,

    #[serde(rename = "Error", default)]
    pub error: Option<RpcErrorPayload>,
}

/// Error half of the envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RpcErrorPayload {
    Message(String),
    Detail {
        #[serde(rename = "Code", default)]
        code: Option<i64>,
        #[serde(rename = "Message", default)]
        message: Option<String>,
        #[serde(rename = "StackTrace", default)]
        stack_trace: Option<String>,
    },
}

impl RpcErrorPayload {
    /// An empty error string is how the node says "no error"
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Message(msg) if msg.is_empty())
    }

    /// Server-reported message. The stack trace carries the specific cause,
    /// so it is preferred over the generic message.
    pub fn message(&self) -> String {
        match self {
            Self::Message(msg) => msg.clone(),
            Self::Detail {
                code,
                message,
                stack_trace,
            } => stack_trace
                .clone()
                .filter(|s| !s.is_empty())
                .or_else(|| message.clone().filter(|s| !s.is_empty()))
                .unwrap_or_else(|| match code {
                    Some(code) => format!("error code {}", code),
                    None => "unknown error".to_string(),
                }),
        }
    }
}
