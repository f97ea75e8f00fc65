//! Transport-agnostic RPC marshaling with typed errors and batch calls.
//!
//! rpcprims defines the envelopes a client and server exchange, how a server
//! resolves and runs the named method, and how an error raised on one side
//! is rebuilt on the other with its type identity intact. Moving envelopes
//! between processes is left to you: anything that can carry JSON works.
//!
//! # Crate Structure
//!
//! - [`protocol`]: envelopes, error codec, version negotiation
//! - [`validators`]: per-method parameter validators, plus JSON Schema
//!   support behind the `schema` feature
//! - [`server`]: method tree, dispatcher, batch orchestration (behind `server`)
//! - [`client`]: invoker, batch client, transport traits (behind `client`)

/// Re-export protocol types.
pub mod protocol {
    pub use rpcprims_protocol::*;
}

/// Re-export validator types.
pub mod validators {
    pub use rpcprims_schema::*;
}

/// Re-export server types (requires `server` feature).
#[cfg(feature = "server")]
pub mod server {
    pub use rpcprims_server::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use rpcprims_client::*;
}

pub use rpcprims_protocol::{ErrorClass, ErrorRecord, Exception, MethodPath, Throwable, Version};
pub use rpcprims_schema::ParameterValidators;

#[cfg(feature = "client")]
pub use rpcprims_client::{BatchClient, Client, ClientConfig};
#[cfg(feature = "server")]
pub use rpcprims_server::{Api, Server, ServerConfig};
