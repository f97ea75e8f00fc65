//! Declarative method tree.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use rpcprims_protocol::Exception;
use serde_json::Value;

/// Future returned by a [`Handler`].
pub type HandlerFuture = BoxFuture<'static, Result<Value, Exception>>;

/// A callable method: takes the call's argument list, yields its result.
pub type Handler = Arc<dyn Fn(Vec<Value>) -> HandlerFuture + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Node {
    Method(Handler),
    Namespace(Api),
}

/// Tree of methods and nested namespaces served by a [`Server`](crate::Server).
///
/// Registering a name twice at the same level keeps the last entry.
#[derive(Clone, Default)]
pub struct Api {
    pub(crate) entries: BTreeMap<String, Node>,
}

impl Api {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asynchronous method.
    pub fn method<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, Exception>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |params| handler(params).boxed());
        self.entries.insert(name.into(), Node::Method(handler));
        self
    }

    /// Add a synchronous method. It runs when the dispatcher first polls it.
    pub fn method_sync<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, Exception> + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let handler: Handler = Arc::new(move |params| {
            let handler = Arc::clone(&handler);
            async move { handler(params) }.boxed()
        });
        self.entries.insert(name.into(), Node::Method(handler));
        self
    }

    /// Mount `nested` under `name`.
    pub fn namespace(mut self, name: impl Into<String>, nested: Api) -> Self {
        self.entries.insert(name.into(), Node::Namespace(nested));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, node) in &self.entries {
            match node {
                Node::Method(_) => map.entry(name, &"<method>"),
                Node::Namespace(nested) => map.entry(name, nested),
            };
        }
        map.finish()
    }
}
