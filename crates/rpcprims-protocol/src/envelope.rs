use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::codec::ErrorRecord;
use crate::method::MethodPath;

/// Tag identifying this calling convention on every envelope.
pub const PROTOCOL: &str = "rpcprims";

/// Envelope format version stamped by the builders.
pub const PROTOCOL_VERSION: &str = "3.0";

/// A single call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub protocol: String,
    pub version: String,
    /// Version the client expects the server to be compatible with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<String>,
    pub id: String,
    pub method: MethodPath,
    pub params: Vec<Value>,
    /// Opaque routing hint, passed through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl Request {
    pub fn new(id: impl Into<String>, method: MethodPath, params: Vec<Value>) -> Self {
        Self {
            protocol: PROTOCOL.to_string(),
            version: PROTOCOL_VERSION.to_string(),
            expected_version: None,
            id: id.into(),
            method,
            params,
            channel: None,
        }
    }

    pub fn with_expected_version(mut self, expected_version: Option<String>) -> Self {
        self.expected_version = expected_version;
        self
    }

    pub fn with_channel(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }
}

/// Terminal outcome of one call: exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "result")]
    Result(Value),
    #[serde(rename = "error")]
    Error(ErrorRecord),
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    pub fn into_result(self) -> std::result::Result<Value, ErrorRecord> {
        match self {
            Outcome::Result(value) => Ok(value),
            Outcome::Error(record) => Err(record),
        }
    }
}

/// Reply to a single [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub protocol: String,
    pub version: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    pub fn new(id: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            protocol: PROTOCOL.to_string(),
            version: PROTOCOL_VERSION.to_string(),
            id: id.into(),
            channel: None,
            outcome,
        }
    }

    pub fn result(id: impl Into<String>, result: Value) -> Self {
        Self::new(id, Outcome::Result(result))
    }

    pub fn error(id: impl Into<String>, error: ErrorRecord) -> Self {
        Self::new(id, Outcome::Error(error))
    }

    pub fn with_channel(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }
}

/// One call inside a [`BatchRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCall {
    pub method: MethodPath,
    pub params: Vec<Value>,
}

impl BatchCall {
    pub fn new(method: MethodPath, params: Vec<Value>) -> Self {
        Self { method, params }
    }
}

/// Several independent calls carried in one round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub protocol: String,
    pub version: String,
    /// Checked once for the whole batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<String>,
    pub id: String,
    /// Run calls concurrently (`true`) or one after another (`false`).
    pub parallel: bool,
    #[serde(deserialize_with = "non_empty_calls")]
    pub requests: Vec<BatchCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl BatchRequest {
    /// Build a batch. Callers are responsible for passing at least one call.
    pub fn new(id: impl Into<String>, requests: Vec<BatchCall>, parallel: bool) -> Self {
        Self {
            protocol: PROTOCOL.to_string(),
            version: PROTOCOL_VERSION.to_string(),
            expected_version: None,
            id: id.into(),
            parallel,
            requests,
            channel: None,
        }
    }

    pub fn with_expected_version(mut self, expected_version: Option<String>) -> Self {
        self.expected_version = expected_version;
        self
    }

    pub fn with_channel(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }
}

/// Body of a [`BatchResponse`]: a whole-batch failure or one outcome per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BatchBody {
    #[serde(rename = "error")]
    Error(ErrorRecord),
    #[serde(rename = "responses")]
    Responses(Vec<Outcome>),
}

/// Reply to a [`BatchRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub protocol: String,
    pub version: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(flatten)]
    pub body: BatchBody,
}

impl BatchResponse {
    pub fn new(id: impl Into<String>, body: BatchBody) -> Self {
        Self {
            protocol: PROTOCOL.to_string(),
            version: PROTOCOL_VERSION.to_string(),
            id: id.into(),
            channel: None,
            body,
        }
    }

    /// Per-call outcomes, in submission order.
    pub fn responses(id: impl Into<String>, responses: Vec<Outcome>) -> Self {
        Self::new(id, BatchBody::Responses(responses))
    }

    /// Whole-batch failure; no call outcomes are produced.
    pub fn error(id: impl Into<String>, error: ErrorRecord) -> Self {
        Self::new(id, BatchBody::Error(error))
    }

    pub fn with_channel(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }
}

fn non_empty_calls<'de, D>(deserializer: D) -> std::result::Result<Vec<BatchCall>, D::Error>
where
    D: Deserializer<'de>,
{
    let calls = Vec::<BatchCall>::deserialize(deserializer)?;
    if calls.is_empty() {
        return Err(serde::de::Error::custom("batch must contain at least one call"));
    }
    Ok(calls)
}
