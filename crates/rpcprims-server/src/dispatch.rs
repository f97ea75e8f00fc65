use std::panic::{catch_unwind, AssertUnwindSafe};

use futures_util::FutureExt;
use rpcprims_protocol::{
    is_batch_request, is_request, negotiate, normalize, normalize_throwable, panic_message,
    BatchRequest, BatchResponse, ErrorRecord, Exception, InternalError, MethodPath, Outcome,
    ParameterValidationError, Request, Response, Result, VersionMismatch,
};
use rpcprims_schema::ParameterValidators;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{Api, Handler};
use crate::config::ServerConfig;
use crate::registry::MethodRegistry;

/// Turns requests into responses.
///
/// Cheap to share behind an `Arc`; every entry point takes `&self`.
#[derive(Debug)]
pub struct Server {
    registry: MethodRegistry,
    validators: ParameterValidators,
    config: ServerConfig,
}

impl Server {
    pub fn new(api: Api) -> Self {
        Self {
            registry: MethodRegistry::from_api(api),
            validators: ParameterValidators::default(),
            config: ServerConfig::default(),
        }
    }

    /// Check arguments before the target method is resolved.
    pub fn with_validators(mut self, validators: ParameterValidators) -> Self {
        self.validators = validators;
        self
    }

    /// Advertise a semantic version for clients to negotiate against.
    pub fn with_version(mut self, version: &str) -> Result<Self> {
        self.config = self.config.with_version(version)?;
        Ok(self)
    }

    /// Override server config.
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn has_method(&self, path: &MethodPath) -> bool {
        self.registry.contains(path)
    }

    /// Answer a single call.
    pub async fn respond(&self, request: &Request) -> Response {
        debug!(id = %request.id, method = %request.method, "dispatching call");

        let outcome = match self.negotiate(request.expected_version.as_deref()) {
            Ok(()) => self.call(&request.method, request.params.clone()).await,
            Err(mismatch) => {
                warn!(id = %request.id, error = %mismatch, "rejecting call");
                Outcome::Error(normalize_throwable(mismatch))
            }
        };

        Response::new(request.id.clone(), outcome).with_channel(request.channel.clone())
    }

    /// Answer a raw JSON message.
    ///
    /// Returns `None` for anything that is not a request of this protocol,
    /// leaving it to the transport to route elsewhere. A request that has
    /// the right shape but fails to parse is answered with an
    /// `InternalError` under its own id.
    pub async fn handle(&self, message: &Value) -> Option<Value> {
        let response = if is_batch_request(message) {
            match BatchRequest::deserialize(message) {
                Ok(batch) => serde_json::to_value(self.respond_batch(&batch).await),
                Err(err) => {
                    let (id, record, channel) = malformed(message, &err)?;
                    serde_json::to_value(BatchResponse::error(id, record).with_channel(channel))
                }
            }
        } else if is_request(message) {
            match Request::deserialize(message) {
                Ok(request) => serde_json::to_value(self.respond(&request).await),
                Err(err) => {
                    let (id, record, channel) = malformed(message, &err)?;
                    serde_json::to_value(Response::error(id, record).with_channel(channel))
                }
            }
        } else {
            return None;
        };

        match response {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, "failed to encode response");
                None
            }
        }
    }

    pub(crate) fn negotiate(
        &self,
        expected_version: Option<&str>,
    ) -> std::result::Result<(), VersionMismatch> {
        negotiate(expected_version, self.config.version.as_ref())
    }

    /// Validate, resolve and invoke one call.
    pub(crate) async fn call(&self, path: &MethodPath, params: Vec<Value>) -> Outcome {
        if let Err(rejection) = self.validators.validate(path, &params) {
            warn!(method = %path, error = %rejection, "parameters rejected");
            return Outcome::Error(normalize_throwable(ParameterValidationError::new(
                rejection.to_string(),
            )));
        }

        let handler = match self.registry.resolve(path) {
            Ok(handler) => handler,
            Err(missing) => {
                warn!(method = %path, "method not available");
                return Outcome::Error(normalize_throwable(missing));
            }
        };

        match invoke(handler, params).await {
            Ok(result) => Outcome::Result(result),
            Err(error) => {
                debug!(method = %path, error = %error, "method failed");
                Outcome::Error(normalize(&error))
            }
        }
    }
}

async fn invoke(handler: &Handler, params: Vec<Value>) -> std::result::Result<Value, Exception> {
    let future = match catch_unwind(AssertUnwindSafe(|| handler(params))) {
        Ok(future) => future,
        Err(payload) => return Err(panicked(payload.as_ref())),
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(panicked(payload.as_ref())),
    }
}

/// Panics are reported like any other failure, as `"{name}: {message}"`.
fn panicked(payload: &(dyn std::any::Any + Send)) -> Exception {
    let message = panic_message(payload);
    warn!(panic = message, "method panicked");
    Exception::from(InternalError::new(Exception::msg(message).to_string()))
}

fn malformed(
    message: &Value,
    err: &serde_json::Error,
) -> Option<(String, ErrorRecord, Option<String>)> {
    let Some(id) = message.get("id").and_then(Value::as_str) else {
        warn!(error = %err, "dropping malformed request without an id");
        return None;
    };
    warn!(id, error = %err, "rejecting malformed request");

    let failure = Exception::msg(format!("malformed request: {err}"));
    let record = normalize_throwable(InternalError::new(failure.to_string()));
    let channel = message
        .get("channel")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some((id.to_string(), record, channel))
}

#[cfg(test)]
mod tests {
    use rpcprims_protocol::{ErrorClass, Throwable, CUSTOM_ERROR};
    use serde_json::json;

    use super::*;

    static TEAPOT: ErrorClass = ErrorClass::extends("Teapot", &CUSTOM_ERROR);

    #[derive(Debug, thiserror::Error)]
    #[error("short and stout")]
    struct Teapot;

    impl Throwable for Teapot {
        fn class(&self) -> &'static ErrorClass {
            &TEAPOT
        }
    }

    fn path(dotted: &str) -> MethodPath {
        dotted.parse().unwrap()
    }

    fn server() -> Server {
        Server::new(
            Api::new()
                .method("echo", |params: Vec<Value>| async move {
                    Ok::<_, Exception>(params.into_iter().next().unwrap_or(Value::Null))
                })
                .method_sync("teapot", |_| Err(Teapot.into()))
                .method_sync("explode", |_| panic!("kaboom"))
                .namespace(
                    "ns",
                    Api::new().method_sync("upper", |params: Vec<Value>| {
                        let text = params.first().and_then(Value::as_str).unwrap_or_default();
                        Ok(json!(text.to_uppercase()))
                    }),
                ),
        )
    }

    fn error_of(response: &Response) -> &rpcprims_protocol::ErrorRecord {
        match &response.outcome {
            Outcome::Error(record) => record,
            Outcome::Result(value) => panic!("expected an error, got {value}"),
        }
    }

    #[tokio::test]
    async fn echoes_result_and_id() {
        let request = Request::new("abc", path("echo"), vec![json!("message")]);
        let response = server().respond(&request).await;

        assert_eq!(response.id, "abc");
        assert_eq!(response.outcome, Outcome::Result(json!("message")));
    }

    #[tokio::test]
    async fn resolves_namespaced_methods() {
        let request = Request::new("id", path("ns.upper"), vec![json!("hi")]);
        let response = server().respond(&request).await;
        assert_eq!(response.outcome, Outcome::Result(json!("HI")));
    }

    #[tokio::test]
    async fn unknown_paths_are_method_not_available() {
        let server = server();
        for missing in ["missing", "ns", "echo.deeper", "ns.upper.deeper"] {
            let response = server.respond(&Request::new("id", path(missing), vec![])).await;
            let record = error_of(&response);
            assert_eq!(record.name, "MethodNotAvailable", "{missing}");
            assert_eq!(record.message, "The method is not available.");
        }
    }

    #[tokio::test]
    async fn user_errors_keep_their_type() {
        let response = server()
            .respond(&Request::new("id", path("teapot"), vec![]))
            .await;
        let record = error_of(&response);
        assert_eq!(record.name, "Teapot");
        assert_eq!(record.message, "short and stout");
        assert_eq!(record.ancestors, ["CustomError", "Error"]);
    }

    #[tokio::test]
    async fn panics_become_internal_errors() {
        let response = server()
            .respond(&Request::new("id", path("explode"), vec![]))
            .await;
        let record = error_of(&response);
        assert_eq!(record.name, "InternalError");
        assert_eq!(record.message, "Error: kaboom");
    }

    #[tokio::test]
    async fn validator_rejection_skips_the_method() {
        let invoked = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let seen = invoked.clone();
        let server = Server::new(Api::new().method_sync("echo", move |_| {
            seen.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(Value::Null)
        }))
        .with_validators(
            ParameterValidators::new().with("echo", |_: &[Value]| Err(Exception::msg("custom error"))),
        );

        let response = server
            .respond(&Request::new("id", path("echo"), vec![json!("message")]))
            .await;
        let record = error_of(&response);
        assert_eq!(record.name, "ParameterValidationError");
        assert_eq!(record.message, "Error: custom error");
        assert!(!invoked.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn version_negotiation() {
        let server = server().with_version("1.0.0").unwrap();

        let ok = Request::new("id", path("echo"), vec![json!(1)])
            .with_expected_version(Some("1.0.0".to_string()));
        assert_eq!(server.respond(&ok).await.outcome, Outcome::Result(json!(1)));

        let newer = Request::new("id", path("echo"), vec![json!(1)])
            .with_expected_version(Some("1.1.0".to_string()));
        let response = server.respond(&newer).await;
        let record = error_of(&response);
        assert_eq!(record.name, "VersionMismatch");
        assert_eq!(
            record.message,
            "The expected version is ^1.1.0, but the server version is 1.0.0."
        );

        let unversioned = Request::new("id", path("echo"), vec![json!(1)]);
        assert!(!server.respond(&unversioned).await.outcome.is_error());
    }

    #[tokio::test]
    async fn channel_is_echoed() {
        let request = Request::new("id", path("echo"), vec![]).with_channel(Some("c1".to_string()));
        let response = server().respond(&request).await;
        assert_eq!(response.channel.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn handle_routes_raw_messages() {
        let server = server();

        let reply = server
            .handle(&json!({
                "protocol": "rpcprims", "version": "3.0", "id": "1",
                "method": ["echo"], "params": ["message"]
            }))
            .await
            .unwrap();
        assert_eq!(reply["result"], "message");
        assert_eq!(reply["id"], "1");

        let reply = server
            .handle(&json!({
                "protocol": "rpcprims", "version": "3.0", "id": "2", "parallel": true,
                "requests": [{ "method": ["echo"], "params": [1] }]
            }))
            .await
            .unwrap();
        assert_eq!(reply["responses"], json!([{ "result": 1 }]));

        assert!(server.handle(&json!({ "jsonrpc": "2.0" })).await.is_none());
        assert!(server
            .handle(&json!({ "protocol": "rpcprims", "version": "3.0", "id": "3", "result": 1 }))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn unparseable_requests_are_answered_under_their_id() {
        let server = server();

        let reply = server
            .handle(&json!({
                "protocol": "rpcprims", "version": "3.0", "id": "7", "channel": "c",
                "method": ["echo"], "params": [], "expectedVersion": 1
            }))
            .await
            .unwrap();
        assert_eq!(reply["id"], "7");
        assert_eq!(reply["channel"], "c");
        assert_eq!(reply["error"]["name"], "InternalError");
        assert!(reply["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Error: malformed request: "));

        let reply = server
            .handle(&json!({
                "protocol": "rpcprims", "version": "3.0", "id": "8", "parallel": false,
                "requests": [{ "method": ["echo"], "params": [] }], "expectedVersion": 1
            }))
            .await
            .unwrap();
        assert_eq!(reply["id"], "8");
        assert_eq!(reply["error"]["name"], "InternalError");
        assert!(reply.get("responses").is_none());
    }
}
