//! Client side of rpcprims.
//!
//! The client builds envelopes and hands them to a transport you supply,
//! usually a closure that serializes the envelope and ships it to a server.
//! Error responses come back as [`Exception`](rpcprims_protocol::Exception)
//! values that still answer to their original type names.

pub mod batch;
pub mod client;
pub mod config;
pub mod proxy;
pub mod transport;

pub use batch::{BatchClient, BatchResults};
pub use client::Client;
pub use config::ClientConfig;
pub use proxy::BatchProxy;
pub use transport::{BatchTransport, Transport};
