//! JSON-RPC envelope types.
//!
//! Requests and responses share the fixed `"2.0"` version tag. The request
//! `id` is treated as an opaque [`serde_json::Value`] and echoed back
//! unchanged; an absent id becomes null.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::McpError;

/// The only protocol version this server speaks.
pub const JSONRPC_VERSION: &str = "2.0";

/// A validated request envelope.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    pub method: String,
    pub params: Value,
    pub id: Value,
}

impl RpcRequest {
    /// Decode and validate a request body.
    ///
    /// On failure returns the error together with the best-effort id to echo:
    /// null when the body never parsed, the request's own id when the
    /// envelope parsed but failed validation.
    pub fn parse(body: &[u8]) -> Result<Self, (McpError, Value)> {
        let raw: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(_) => return Err((McpError::ParseError, Value::Null)),
        };

        let id = raw.get("id").cloned().unwrap_or(Value::Null);

        let version_ok = raw
            .get("jsonrpc")
            .and_then(Value::as_str)
            .is_some_and(|v| v == JSONRPC_VERSION);
        let method = raw
            .get("method")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty());

        match (version_ok, method) {
            (true, Some(method)) => Ok(Self {
                method: method.to_string(),
                params: raw
                    .get("params")
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Default::default())),
                id,
            }),
            _ => Err((McpError::InvalidRequest, id)),
        }
    }
}

/// Error body of a response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A response envelope: exactly one of `result` or `error` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorBody>,
    pub id: Value,
}

impl RpcResponse {
    pub fn success(result: Value, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(err: &McpError, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(RpcErrorBody {
                code: err.code(),
                message: err.client_message(),
                data: None,
            }),
            id,
        }
    }

    /// Wire error code, if this is an error response.
    pub fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|e| e.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_well_formed_envelope() {
        let body = br#"{"jsonrpc":"2.0","method":"get_posts","params":{"limit":5},"id":7}"#;
        let req = RpcRequest::parse(body).unwrap();
        assert_eq!(req.method, "get_posts");
        assert_eq!(req.params, json!({"limit": 5}));
        assert_eq!(req.id, json!(7));
    }

    #[test]
    fn absent_id_and_params_default_to_null_and_empty() {
        let req = RpcRequest::parse(br#"{"jsonrpc":"2.0","method":"get_posts"}"#).unwrap();
        assert_eq!(req.id, Value::Null);
        assert_eq!(req.params, json!({}));
    }

    #[test]
    fn invalid_json_is_a_parse_error_with_null_id() {
        let (err, id) = RpcRequest::parse(b"{not json").unwrap_err();
        assert_eq!(err.code(), crate::error::CODE_PARSE_ERROR);
        assert_eq!(id, Value::Null);
    }

    #[test]
    fn wrong_version_echoes_the_id() {
        let (err, id) =
            RpcRequest::parse(br#"{"jsonrpc":"1.0","method":"get_posts","id":"abc"}"#).unwrap_err();
        assert_eq!(err.code(), crate::error::CODE_INVALID_REQUEST);
        assert_eq!(id, json!("abc"));
    }

    #[test]
    fn missing_or_empty_method_is_invalid() {
        for body in [
            br#"{"jsonrpc":"2.0","id":1}"#.as_slice(),
            br#"{"jsonrpc":"2.0","method":"","id":1}"#.as_slice(),
            br#"{"jsonrpc":"2.0","method":42,"id":1}"#.as_slice(),
        ] {
            let (err, id) = RpcRequest::parse(body).unwrap_err();
            assert_eq!(err.code(), crate::error::CODE_INVALID_REQUEST);
            assert_eq!(id, json!(1));
        }
    }

    #[test]
    fn success_and_error_envelopes_are_exclusive() {
        let ok = RpcResponse::success(json!({"posts": []}), json!(1));
        assert!(ok.result.is_some() && ok.error.is_none());

        let err = RpcResponse::failure(&McpError::MethodNotFound, json!(1));
        assert!(err.result.is_none());
        assert_eq!(err.error_code(), Some(-32601));
    }
}
