//! Structural checks for classifying raw JSON messages.
//!
//! Transports that multiplex several message kinds over one stream use these
//! to decide which envelope to deserialize into.

use serde_json::{Map, Value};

use crate::envelope::PROTOCOL;

fn envelope(value: &Value) -> Option<&Map<String, Value>> {
    let map = value.as_object()?;
    let tagged = map.get("protocol").and_then(Value::as_str) == Some(PROTOCOL);
    let versioned = map.get("version").is_some_and(Value::is_string);
    let identified = map.get("id").is_some_and(Value::is_string);
    (tagged && versioned && identified).then_some(map)
}

fn is_method_path(value: Option<&Value>) -> bool {
    match value.and_then(Value::as_array) {
        Some(segments) => !segments.is_empty() && segments.iter().all(Value::is_string),
        None => false,
    }
}

fn is_call(map: &Map<String, Value>) -> bool {
    is_method_path(map.get("method")) && map.get("params").is_some_and(Value::is_array)
}

fn is_error_record(value: Option<&Value>) -> bool {
    match value.and_then(Value::as_object) {
        Some(record) => {
            record.get("name").is_some_and(Value::is_string)
                && record.get("message").is_some_and(Value::is_string)
        }
        None => false,
    }
}

/// A single-call request.
pub fn is_request(value: &Value) -> bool {
    envelope(value).is_some_and(is_call)
}

/// A single-call response carrying a result.
pub fn is_result(value: &Value) -> bool {
    envelope(value).is_some_and(|map| map.contains_key("result") && !map.contains_key("error"))
}

/// A single-call response, or a batch response, carrying an error record.
pub fn is_error(value: &Value) -> bool {
    envelope(value).is_some_and(|map| {
        is_error_record(map.get("error")) && !map.contains_key("result")
    })
}

/// Either kind of single-call response.
pub fn is_response(value: &Value) -> bool {
    is_result(value) || (is_error(value) && value.get("responses").is_none())
}

/// A batch request.
pub fn is_batch_request(value: &Value) -> bool {
    envelope(value).is_some_and(|map| {
        map.get("parallel").is_some_and(Value::is_boolean)
            && map
                .get("requests")
                .and_then(Value::as_array)
                .is_some_and(|calls| {
                    !calls.is_empty()
                        && calls
                            .iter()
                            .all(|call| call.as_object().is_some_and(is_call))
                })
    })
}

/// A batch response with per-call outcomes.
pub fn is_batch_response(value: &Value) -> bool {
    envelope(value).is_some_and(|map| {
        map.get("responses")
            .and_then(Value::as_array)
            .is_some_and(|outcomes| {
                outcomes.iter().all(|outcome| match outcome.as_object() {
                    Some(slot) => {
                        slot.contains_key("result") != is_error_record(slot.get("error"))
                    }
                    None => false,
                })
            })
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn recognizes_requests() {
        let request = json!({
            "protocol": "rpcprims", "version": "3.0", "id": "id",
            "method": ["echo"], "params": ["message"]
        });
        assert!(is_request(&request));
        assert!(!is_batch_request(&request));
        assert!(!is_response(&request));
    }

    #[test]
    fn rejects_foreign_protocols_and_bad_paths() {
        assert!(!is_request(&json!({
            "protocol": "other", "version": "3.0", "id": "id",
            "method": ["echo"], "params": []
        })));
        assert!(!is_request(&json!({
            "protocol": "rpcprims", "version": "3.0", "id": "id",
            "method": [], "params": []
        })));
        assert!(!is_request(&json!("not an object")));
    }

    #[test]
    fn recognizes_responses() {
        let ok = json!({ "protocol": "rpcprims", "version": "3.0", "id": "id", "result": null });
        let err = json!({
            "protocol": "rpcprims", "version": "3.0", "id": "id",
            "error": { "name": "Error", "message": "m", "stack": "", "ancestors": [] }
        });
        assert!(is_result(&ok));
        assert!(!is_error(&ok));
        assert!(is_error(&err));
        assert!(!is_result(&err));
        assert!(is_response(&ok));
        assert!(is_response(&err));
    }

    #[test]
    fn recognizes_batches() {
        let request = json!({
            "protocol": "rpcprims", "version": "3.0", "id": "id", "parallel": false,
            "requests": [{ "method": ["a"], "params": [] }]
        });
        assert!(is_batch_request(&request));
        assert!(!is_request(&request));

        let response = json!({
            "protocol": "rpcprims", "version": "3.0", "id": "id",
            "responses": [
                { "result": 1 },
                { "error": { "name": "Error", "message": "m" } }
            ]
        });
        assert!(is_batch_response(&response));
        assert!(!is_response(&response));

        let broken = json!({
            "protocol": "rpcprims", "version": "3.0", "id": "id",
            "responses": [{ "result": 1, "error": { "name": "Error", "message": "m" } }]
        });
        assert!(!is_batch_response(&broken));
    }
}
