use futures_util::future::join_all;
use rpcprims_protocol::{normalize_throwable, BatchRequest, BatchResponse};
use tracing::{debug, warn};

use crate::dispatch::Server;

impl Server {
    /// Answer a batch of calls.
    ///
    /// The expected version is checked once; a mismatch fails the whole
    /// batch without running any call. Otherwise every call runs, either
    /// all at once (`parallel`) or each after the previous one settles, and
    /// outcomes come back in submission order.
    pub async fn respond_batch(&self, batch: &BatchRequest) -> BatchResponse {
        debug!(
            id = %batch.id,
            calls = batch.requests.len(),
            parallel = batch.parallel,
            "dispatching batch"
        );

        if let Err(mismatch) = self.negotiate(batch.expected_version.as_deref()) {
            warn!(id = %batch.id, error = %mismatch, "rejecting batch");
            return BatchResponse::error(batch.id.clone(), normalize_throwable(mismatch))
                .with_channel(batch.channel.clone());
        }

        let outcomes = if batch.parallel {
            join_all(
                batch
                    .requests
                    .iter()
                    .map(|call| self.call(&call.method, call.params.clone())),
            )
            .await
        } else {
            let mut outcomes = Vec::with_capacity(batch.requests.len());
            for call in &batch.requests {
                outcomes.push(self.call(&call.method, call.params.clone()).await);
            }
            outcomes
        };

        let failed = outcomes.iter().filter(|outcome| outcome.is_error()).count();
        debug!(id = %batch.id, failed, "batch complete");

        BatchResponse::responses(batch.id.clone(), outcomes).with_channel(batch.channel.clone())
    }
}
