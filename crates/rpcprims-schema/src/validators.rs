use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use rpcprims_protocol::{panic_message, Exception, MethodPath};
use serde_json::Value;
use tracing::warn;

/// A check run against a call's arguments before the call is dispatched.
pub type ValidatorFn = Arc<dyn Fn(&[Value]) -> Result<(), Exception> + Send + Sync>;

/// Validators keyed by method path.
///
/// The map is sparse: a path with no validator accepts any arguments.
/// Namespaces nest the same way a server's method tree does, so a validator
/// registered as `echo` inside namespace `ns` guards `ns.echo`. A fallback
/// mounted under a namespace only covers paths inside that namespace.
#[derive(Clone, Default)]
pub struct ParameterValidators {
    validators: HashMap<MethodPath, ValidatorFn>,
    /// Keyed by namespace prefix; the empty prefix covers every path.
    fallbacks: Vec<(Vec<String>, ValidatorFn)>,
}

impl ParameterValidators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validator for the method `name` at this level.
    pub fn with<F>(mut self, name: impl Into<String>, validator: F) -> Self
    where
        F: Fn(&[Value]) -> Result<(), Exception> + Send + Sync + 'static,
    {
        self.insert(MethodPath::root(name), validator);
        self
    }

    /// Mount `nested` under the namespace `name`.
    pub fn namespace(mut self, name: impl Into<String>, nested: ParameterValidators) -> Self {
        let name = name.into();
        let prefix = MethodPath::root(name.clone());
        for (path, validator) in nested.validators {
            let mut full = prefix.clone();
            for segment in path.segments() {
                full = full.child(segment.clone());
            }
            self.validators.insert(full, validator);
        }
        for (scope, validator) in nested.fallbacks {
            let mut full = vec![name.clone()];
            full.extend(scope);
            self.set_fallback(full, validator);
        }
        self
    }

    /// Register a validator at an absolute path.
    pub fn insert<F>(&mut self, path: MethodPath, validator: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<(), Exception> + Send + Sync + 'static,
    {
        self.validators.insert(path, Arc::new(validator));
        self
    }

    /// Check applied to paths that have no validator of their own.
    pub fn with_fallback<F>(mut self, validator: F) -> Self
    where
        F: Fn(&[Value]) -> Result<(), Exception> + Send + Sync + 'static,
    {
        self.set_fallback(Vec::new(), Arc::new(validator));
        self
    }

    fn set_fallback(&mut self, scope: Vec<String>, validator: ValidatorFn) {
        self.fallbacks.retain(|(existing, _)| *existing != scope);
        self.fallbacks.push((scope, validator));
    }

    /// Validator registered at exactly `path`.
    pub fn get(&self, path: &MethodPath) -> Option<&ValidatorFn> {
        self.validators.get(path)
    }

    /// Fallback from the innermost namespace that contains `path`.
    fn fallback_for(&self, path: &MethodPath) -> Option<&ValidatorFn> {
        let segments = path.segments();
        self.fallbacks
            .iter()
            .filter(|(scope, _)| scope.len() < segments.len() && segments.starts_with(scope))
            .max_by_key(|(scope, _)| scope.len())
            .map(|(_, validator)| validator)
    }

    /// Run the validator for `path` against `params`.
    ///
    /// A validator that panics is reported as a failed validation carrying
    /// the panic message.
    pub fn validate(&self, path: &MethodPath, params: &[Value]) -> Result<(), Exception> {
        let Some(validator) = self.get(path).or_else(|| self.fallback_for(path)) else {
            return Ok(());
        };

        match catch_unwind(AssertUnwindSafe(|| validator(params))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(method = %path, panic = message, "parameter validator panicked");
                Err(Exception::msg(message))
            }
        }
    }

    /// Paths that have a validator, in dotted-name order.
    pub fn paths(&self) -> Vec<&MethodPath> {
        let mut paths: Vec<&MethodPath> = self.validators.keys().collect();
        paths.sort_by_cached_key(|path| path.to_string());
        paths
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty() && self.fallbacks.is_empty()
    }
}

impl fmt::Debug for ParameterValidators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<String> = self.paths().iter().map(ToString::to_string).collect();
        f.debug_struct("ParameterValidators")
            .field("paths", &paths)
            .field("fallbacks", &self.fallbacks.len())
            .finish()
    }
}
