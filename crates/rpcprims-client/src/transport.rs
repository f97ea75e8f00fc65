//! The seam between the client and whatever moves bytes.

use std::future::Future;

use rpcprims_protocol::{BatchRequest, BatchResponse, Exception, Request, Response};

/// Delivers a single-call request and yields the server's response.
///
/// Any async closure of the right shape is a transport.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, Exception>> + Send;
}

/// Delivers a batch request and yields the server's batch response.
pub trait BatchTransport: Send + Sync {
    fn send_batch(
        &self,
        batch: BatchRequest,
    ) -> impl Future<Output = Result<BatchResponse, Exception>> + Send;
}

impl<F, Fut> Transport for F
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, Exception>> + Send,
{
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, Exception>> + Send {
        self(request)
    }
}

impl<F, Fut> BatchTransport for F
where
    F: Fn(BatchRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<BatchResponse, Exception>> + Send,
{
    fn send_batch(
        &self,
        batch: BatchRequest,
    ) -> impl Future<Output = Result<BatchResponse, Exception>> + Send {
        self(batch)
    }
}
