use std::collections::HashMap;

use rpcprims_protocol::{MethodNotAvailable, MethodPath};

use crate::api::{Api, Handler, Node};

/// Flat lookup table from method path to handler.
///
/// Built once from an [`Api`] tree. Only leaves are callable: a namespace
/// path, or a path running through a method, never resolves.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<MethodPath, Handler>,
}

impl MethodRegistry {
    pub fn from_api(api: Api) -> Self {
        let mut methods = HashMap::new();
        flatten(api, None, &mut methods);
        Self { methods }
    }

    /// Handler at `path`, or the fixed method-not-available failure.
    pub fn resolve(&self, path: &MethodPath) -> Result<&Handler, MethodNotAvailable> {
        self.methods.get(path).ok_or_else(MethodNotAvailable::default)
    }

    pub fn contains(&self, path: &MethodPath) -> bool {
        self.methods.contains_key(path)
    }

    /// Callable paths, in dotted-name order.
    pub fn paths(&self) -> Vec<&MethodPath> {
        let mut paths: Vec<&MethodPath> = self.methods.keys().collect();
        paths.sort_by_cached_key(|path| path.to_string());
        paths
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

fn flatten(api: Api, prefix: Option<&MethodPath>, out: &mut HashMap<MethodPath, Handler>) {
    for (name, node) in api.entries {
        let path = match prefix {
            Some(prefix) => prefix.child(name),
            None => MethodPath::root(name),
        };
        match node {
            Node::Method(handler) => {
                out.insert(path, handler);
            }
            Node::Namespace(nested) => flatten(nested, Some(&path), out),
        }
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let paths: Vec<String> = self.paths().iter().map(ToString::to_string).collect();
        f.debug_struct("MethodRegistry").field("methods", &paths).finish()
    }
}
