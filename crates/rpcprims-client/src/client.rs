use rpcprims_protocol::{ErrorRegistry, Exception, InternalError, IntoMethodPath, Outcome, Request};
use rpcprims_schema::ParameterValidators;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::transport::Transport;

/// Issues single calls through a [`Transport`].
#[derive(Debug)]
pub struct Client<T> {
    transport: T,
    config: ClientConfig,
    validators: ParameterValidators,
    errors: ErrorRegistry,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: ClientConfig::default(),
            validators: ParameterValidators::default(),
            errors: ErrorRegistry::default(),
        }
    }

    /// Override client config.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Check arguments locally before anything is sent.
    pub fn with_validators(mut self, validators: ParameterValidators) -> Self {
        self.validators = validators;
        self
    }

    /// Factories used to rebuild typed errors from responses.
    pub fn with_error_registry(mut self, errors: ErrorRegistry) -> Self {
        self.errors = errors;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Call `method` with `params` and wait for its result.
    ///
    /// A local validator rejection is returned as-is and nothing is sent.
    /// Remote failures come back hydrated through the error registry.
    pub async fn call(
        &self,
        method: impl IntoMethodPath,
        params: Vec<Value>,
    ) -> Result<Value, Exception> {
        let method = method.into_method_path()?;
        self.validators.validate(&method, &params)?;

        let id = request_id();
        let request = Request::new(id.clone(), method, params)
            .with_expected_version(self.config.expected_version_tag())
            .with_channel(self.config.channel.clone());
        debug!(id = %id, method = %request.method, "sending call");

        let response = self.transport.send(request).await?;
        if response.id != id {
            warn!(expected = %id, received = %response.id, "response id mismatch");
            return Err(id_mismatch(&id, &response.id));
        }

        match response.outcome {
            Outcome::Result(value) => Ok(value),
            Outcome::Error(record) => {
                debug!(id = %id, error = %record.name, "call failed remotely");
                Err(self.errors.hydrate(&record))
            }
        }
    }
}

pub(crate) fn request_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn id_mismatch(expected: &str, received: &str) -> Exception {
    Exception::from(InternalError::new(format!(
        "response id {received} does not match request id {expected}"
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use rpcprims_protocol::{
        normalize_throwable, ErrorClass, ErrorRecord, MethodNotAvailable, Response, Throwable,
        VersionMismatch, CUSTOM_ERROR,
    };
    use serde_json::json;

    use super::*;

    static OUT_OF_STOCK: ErrorClass = ErrorClass::extends("OutOfStock", &CUSTOM_ERROR);

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct OutOfStock(String);

    impl Throwable for OutOfStock {
        fn class(&self) -> &'static ErrorClass {
            &OUT_OF_STOCK
        }
    }

    async fn echo_transport(request: Request) -> Result<Response, Exception> {
        let first = request.params.into_iter().next().unwrap_or(Value::Null);
        Ok(Response::result(request.id, first).with_channel(request.channel))
    }

    #[tokio::test]
    async fn returns_result() {
        let client = Client::new(echo_transport);
        let value = client.call("echo", vec![json!("message")]).await.unwrap();
        assert_eq!(value, json!("message"));
    }

    #[tokio::test]
    async fn stamps_config_and_fresh_ids() {
        let seen: Arc<Mutex<Vec<Request>>> = Arc::default();
        let log = seen.clone();
        let client = Client::new(move |request: Request| {
            log.lock().unwrap().push(request.clone());
            async move { Ok::<_, Exception>(Response::result(request.id, Value::Null)) }
        })
        .with_config(
            ClientConfig::default()
                .with_expected_version("1.0.0")
                .unwrap()
                .with_channel("c1"),
        );

        client.call("ns.echo", vec![]).await.unwrap();
        client.call(["ns", "echo"], vec![]).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].expected_version.as_deref(), Some("1.0.0"));
        assert_eq!(seen[0].channel.as_deref(), Some("c1"));
        assert_eq!(seen[0].method.segments(), ["ns", "echo"]);
        assert_ne!(seen[0].id, seen[1].id);
    }

    #[tokio::test]
    async fn validator_rejection_short_circuits() {
        let sent = Arc::new(AtomicUsize::new(0));
        let counter = sent.clone();
        let client = Client::new(move |request: Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, Exception>(Response::result(request.id, Value::Null)) }
        })
        .with_validators(
            ParameterValidators::new()
                .with("echo", |_: &[Value]| Err(Exception::from(OutOfStock("local".into())))),
        );

        let err = client.call("echo", vec![json!(1)]).await.unwrap_err();
        assert_eq!(err.name(), "OutOfStock");
        assert!(err.downcast_ref::<OutOfStock>().is_some());
        assert_eq!(sent.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remote_errors_are_hydrated_by_name() {
        let client = Client::new(|request: Request| async move {
            let record = normalize_throwable(OutOfStock("no widgets".into()));
            Ok::<_, Exception>(Response::error(request.id, record))
        });

        let err = client.call("buy", vec![]).await.unwrap_err();
        assert_eq!(err.name(), "OutOfStock");
        assert_eq!(err.message(), "no widgets");
        assert!(err.is("CustomError"));
        assert!(err.downcast_ref::<OutOfStock>().is_none());
    }

    #[tokio::test]
    async fn protocol_failures_are_typed() {
        let client = Client::new(|request: Request| async move {
            Ok::<_, Exception>(Response::error(
                request.id,
                normalize_throwable(MethodNotAvailable::default()),
            ))
        });
        let err = client.call("missing", vec![]).await.unwrap_err();
        assert!(err.downcast_ref::<MethodNotAvailable>().is_some());

        let client = Client::new(|request: Request| async move {
            Ok::<_, Exception>(Response::error(
                request.id,
                normalize_throwable(VersionMismatch::new("too old")),
            ))
        });
        let err = client.call("any", vec![]).await.unwrap_err();
        assert!(err.downcast_ref::<VersionMismatch>().is_some());
    }

    #[tokio::test]
    async fn custom_registry_rebuilds_user_types() {
        let client = Client::new(|request: Request| async move {
            let record = normalize_throwable(OutOfStock("none left".into()));
            Ok::<_, Exception>(Response::error(request.id, record))
        })
        .with_error_registry(
            ErrorRegistry::default().with("OutOfStock", |r: &ErrorRecord| OutOfStock(r.message.clone())),
        );

        let err = client.call("buy", vec![]).await.unwrap_err();
        assert_eq!(err.downcast_ref::<OutOfStock>().map(|e| e.0.as_str()), Some("none left"));
    }

    #[tokio::test]
    async fn mismatched_response_id_is_internal_error() {
        let client = Client::new(|_: Request| async move {
            Ok::<_, Exception>(Response::result("someone-else", Value::Null))
        });
        let err = client.call("echo", vec![]).await.unwrap_err();
        assert_eq!(err.name(), "InternalError");
    }

    #[tokio::test]
    async fn transport_failures_pass_through() {
        let client = Client::new(|_: Request| async move {
            Err::<Response, _>(Exception::msg("connection reset"))
        });
        let err = client.call("echo", vec![]).await.unwrap_err();
        assert_eq!(err.to_string(), "Error: connection reset");
    }

    #[tokio::test]
    async fn invalid_method_path_is_rejected_locally() {
        let client = Client::new(echo_transport);
        let err = client.call("", vec![]).await.unwrap_err();
        assert_eq!(err.name(), "Error");
    }
}
