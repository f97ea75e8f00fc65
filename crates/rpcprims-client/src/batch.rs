use rpcprims_protocol::{
    BatchBody, BatchCall, BatchRequest, ErrorRegistry, Exception, InternalError, Outcome,
    ProtocolError,
};
use rpcprims_schema::ParameterValidators;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::{id_mismatch, request_id};
use crate::config::ClientConfig;
use crate::proxy::BatchProxy;
use crate::transport::BatchTransport;

/// Per-call results of a batch, in submission order.
pub type BatchResults = Vec<Result<Value, Exception>>;

/// Issues batches through a [`BatchTransport`].
#[derive(Debug)]
pub struct BatchClient<T> {
    transport: T,
    config: ClientConfig,
    validators: ParameterValidators,
    errors: ErrorRegistry,
}

impl<T: BatchTransport> BatchClient<T> {
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

    /// Validators applied by [`BatchClient::proxy`].
    pub fn with_validators(mut self, validators: ParameterValidators) -> Self {
        self.validators = validators;
        self
    }

    /// Factories used to rebuild typed errors from responses.
    pub fn with_error_registry(mut self, errors: ErrorRegistry) -> Self {
        self.errors = errors;
        self
    }

    /// Builder for validated batch calls.
    pub fn proxy(&self) -> BatchProxy<'_> {
        BatchProxy::new(&self.validators)
    }

    /// Run every call concurrently on the server.
    pub async fn parallel(&self, calls: Vec<BatchCall>) -> Result<BatchResults, Exception> {
        self.send(calls, true).await
    }

    /// Run the calls one after another on the server.
    ///
    /// A failing call does not stop the ones after it.
    pub async fn series(&self, calls: Vec<BatchCall>) -> Result<BatchResults, Exception> {
        self.send(calls, false).await
    }

    async fn send(&self, calls: Vec<BatchCall>, parallel: bool) -> Result<BatchResults, Exception> {
        if calls.is_empty() {
            return Err(ProtocolError::EmptyBatch.into());
        }

        let expected = calls.len();
        let id = request_id();
        let batch = BatchRequest::new(id.clone(), calls, parallel)
            .with_expected_version(self.config.expected_version_tag())
            .with_channel(self.config.channel.clone());
        debug!(id = %id, calls = expected, parallel, "sending batch");

        let response = self.transport.send_batch(batch).await?;
        if response.id != id {
            warn!(expected = %id, received = %response.id, "batch response id mismatch");
            return Err(id_mismatch(&id, &response.id));
        }

        let outcomes = match response.body {
            BatchBody::Error(record) => {
                debug!(id = %id, error = %record.name, "batch failed remotely");
                return Err(self.errors.hydrate(&record));
            }
            BatchBody::Responses(outcomes) => outcomes,
        };

        if outcomes.len() != expected {
            warn!(id = %id, expected, received = outcomes.len(), "batch outcome count mismatch");
            return Err(InternalError::new(format!(
                "batch of {expected} calls returned {} outcomes",
                outcomes.len()
            ))
            .into());
        }

        Ok(outcomes
            .into_iter()
            .map(|outcome| match outcome {
                Outcome::Result(value) => Ok(value),
                Outcome::Error(record) => Err(self.errors.hydrate(&record)),
            })
            .collect())
    }
}
