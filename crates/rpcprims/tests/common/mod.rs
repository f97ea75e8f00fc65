#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;

use rpcprims::protocol::{BatchRequest, BatchResponse, Request, Response};
use rpcprims::{Exception, Server};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Push an envelope through JSON text into `server` and parse the reply,
/// the way a real transport would.
async fn exchange<Req, Resp>(server: &Server, envelope: &Req) -> Result<Resp, Exception>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let text = serde_json::to_string(envelope).map_err(|err| Exception::msg(err.to_string()))?;
    let message: Value =
        serde_json::from_str(&text).map_err(|err| Exception::msg(err.to_string()))?;

    let reply = server
        .handle(&message)
        .await
        .ok_or_else(|| Exception::msg("server ignored the message"))?;
    let text = serde_json::to_string(&reply).map_err(|err| Exception::msg(err.to_string()))?;
    serde_json::from_str(&text).map_err(|err| Exception::msg(err.to_string()))
}

pub fn transport(
    server: Arc<Server>,
) -> impl Fn(Request) -> std::pin::Pin<Box<dyn Future<Output = Result<Response, Exception>> + Send>>
       + Send
       + Sync {
    move |request: Request| {
        let server = Arc::clone(&server);
        Box::pin(async move { exchange(&server, &request).await })
    }
}

pub fn batch_transport(
    server: Arc<Server>,
) -> impl Fn(BatchRequest) -> std::pin::Pin<Box<dyn Future<Output = Result<BatchResponse, Exception>> + Send>>
       + Send
       + Sync {
    move |batch: BatchRequest| {
        let server = Arc::clone(&server);
        Box::pin(async move { exchange(&server, &batch).await })
    }
}
