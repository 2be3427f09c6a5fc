//! JSON-RPC 2.0 line framing
//!
//! Each message is a single JSON object terminated by `\n`:
//!
//! ```text
//! -> {"jsonrpc":"2.0","method":"read_page","params":[3],"id":7}
//! <- {"jsonrpc":"2.0","result":[255,255,...],"id":7}
//! <- {"jsonrpc":"2.0","error":{"code":41,"message":"read mode disabled"},"id":8}
//! ```
//!
//! The board also prints plain text (boot banner, debug output) on the same
//! line; [`decode_response`] reports those as `None` so the client can skip
//! them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SerialError};

/// Protocol version tag sent with every request
pub const JSONRPC_VERSION: &str = "2.0";

/// Outgoing request
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a [Value],
    id: u64,
}

impl<'a> Request<'a> {
    /// Build a request with positional parameters
    pub fn new(id: u64, method: &'a str, params: &'a [Value]) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id,
        }
    }
}

/// Error object carried by a failed response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    /// Board error code
    pub code: i64,
    /// Board error message
    #[serde(default)]
    pub message: String,
}

/// Decoded response
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Request id this answers, if the board echoed one
    pub id: Option<u64>,
    /// `result` on success, `error` on failure
    pub outcome: core::result::Result<Value, RpcError>,
}

/// Encode one request line, including the trailing newline
pub fn encode_request(id: u64, method: &str, params: &[Value]) -> Result<String> {
    let mut line = serde_json::to_string(&Request::new(id, method, params))
        .map_err(|e| SerialError::Framing(e.to_string()))?;
    line.push('\n');
    Ok(line)
}

/// Decode one received line
///
/// Returns `Ok(None)` for lines that are not JSON objects.
pub fn decode_response(line: &str) -> Result<Option<Response>> {
    let mut obj: Map<String, Value> = match serde_json::from_str(line.trim()) {
        Ok(Value::Object(obj)) => obj,
        _ => return Ok(None),
    };

    let id = match obj.get("id") {
        None | Some(Value::Null) => None,
        Some(id) => Some(
            id.as_u64()
                .ok_or_else(|| SerialError::Framing(format!("invalid response id: {}", id)))?,
        ),
    };

    let outcome = match (obj.remove("result"), obj.remove("error")) {
        (_, Some(error)) if !error.is_null() => Err(serde_json::from_value::<RpcError>(error)
            .map_err(|e| SerialError::Framing(format!("invalid error object: {}", e)))?),
        (Some(result), _) => Ok(result),
        (None, _) => {
            return Err(SerialError::Framing(
                "response has neither result nor error".into(),
            ))
        }
    };

    Ok(Some(Response { id, outcome }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_request() {
        let line = encode_request(1, "init_chip", &[json!("AT28C64")]).unwrap();
        assert_eq!(
            line,
            "{\"jsonrpc\":\"2.0\",\"method\":\"init_chip\",\"params\":[\"AT28C64\"],\"id\":1}\n"
        );

        let line = encode_request(9, "get_write_perf", &[]).unwrap();
        assert!(line.contains("\"params\":[]"));
        assert!(line.ends_with("\"id\":9}\n"));
    }

    #[test]
    fn test_decode_result() {
        let response = decode_response("{\"jsonrpc\":\"2.0\",\"result\":[8192,64],\"id\":1}\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(response.id, Some(1));
        assert_eq!(response.outcome, Ok(json!([8192, 64])));
    }

    #[test]
    fn test_decode_null_result() {
        let response = decode_response(r#"{"jsonrpc":"2.0","result":null,"id":4}"#)
            .unwrap()
            .unwrap();
        assert_eq!(response.outcome, Ok(Value::Null));
    }

    #[test]
    fn test_decode_error() {
        let line = r#"{"jsonrpc":"2.0","error":{"code":23,"message":"chip not initialized"},"id":2}"#;
        let response = decode_response(line).unwrap().unwrap();
        assert_eq!(
            response.outcome,
            Err(RpcError {
                code: 23,
                message: "chip not initialized".into()
            })
        );
    }

    #[test]
    fn test_decode_skips_plain_text() {
        assert_eq!(decode_response("EEPROM programmer v1.2 ready").unwrap(), None);
        assert_eq!(decode_response("").unwrap(), None);
        assert_eq!(decode_response("[1, 2]").unwrap(), None);
    }

    #[test]
    fn test_decode_rejects_malformed_objects() {
        assert!(decode_response(r#"{"jsonrpc":"2.0","id":3}"#).is_err());
        assert!(decode_response(r#"{"result":1,"id":"x"}"#).is_err());
        assert!(decode_response(r#"{"error":{"message":"no code"},"id":3}"#).is_err());
    }
}
