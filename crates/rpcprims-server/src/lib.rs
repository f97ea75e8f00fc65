//! Server side of rpcprims.
//!
//! A [`Server`] owns a flattened method table built from an [`Api`] tree,
//! optional parameter validators and an optional semantic version. It turns
//! requests into responses and never lets a failure escape: every error,
//! including a panicking handler, comes back as an error record.
//!
//! ```
//! use rpcprims_server::{Api, Server};
//! use serde_json::{json, Value};
//!
//! let api = Api::new().namespace(
//!     "math",
//!     Api::new().method_sync("add", |params: Vec<Value>| {
//!         let sum: i64 = params.iter().filter_map(Value::as_i64).sum();
//!         Ok(json!(sum))
//!     }),
//! );
//! let server = Server::new(api).with_version("1.4.0").unwrap();
//! assert!(server.has_method(&"math.add".parse().unwrap()));
//! ```

pub mod api;
mod batch;
pub mod config;
pub mod dispatch;
pub mod registry;

pub use api::{Api, Handler, HandlerFuture};
pub use config::ServerConfig;
pub use dispatch::Server;
pub use registry::MethodRegistry;
