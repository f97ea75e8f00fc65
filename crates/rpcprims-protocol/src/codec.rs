//! Error codec: turns an [`Exception`] into a transmissible record and back.
//!
//! The record carries the most-derived type name and every ancestor name up
//! to and including `Error`, so the receiving side can answer "is this an X"
//! without sharing code. Typed reconstruction is opt-in through
//! [`ErrorRegistry`]; names it does not know degrade to [`RemoteError`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::class::{
    ERROR, INTERNAL_ERROR, METHOD_NOT_AVAILABLE, PARAMETER_VALIDATION_ERROR, VERSION_MISMATCH,
};
use crate::error::{InternalError, MethodNotAvailable, ParameterValidationError, VersionMismatch};
use crate::exception::{Exception, RemoteError, Throwable};

/// Normalized, serializable form of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub stack: String,
    /// Ancestor type names, closest first.
    #[serde(default)]
    pub ancestors: Vec<String>,
}

impl ErrorRecord {
    /// True if `name` is the record's type or one of its ancestors.
    ///
    /// `Error` matches every record.
    pub fn is(&self, name: &str) -> bool {
        name == ERROR.name()
            || self.name == name || self.ancestors.iter().any(|ancestor| ancestor == name)
    }
}

/// Capture an exception's identity for transmission.
pub fn normalize(error: &Exception) -> ErrorRecord {
    ErrorRecord {
        name: error.name().to_string(),
        message: error.message(),
        stack: error.stack().to_string(),
        ancestors: error.ancestors().to_vec(),
    }
}

/// Shorthand for normalizing a concrete throwable.
pub fn normalize_throwable<T: Throwable>(error: T) -> ErrorRecord {
    normalize(&Exception::new(error))
}

/// Rebuild an exception from a record without any typed factories.
pub fn hydrate(record: &ErrorRecord) -> Exception {
    Exception::new(RemoteError::new(
        record.name.clone(),
        record.message.clone(),
        record.stack.clone(),
        record.ancestors.clone(),
    ))
}

type Factory = Arc<dyn Fn(&ErrorRecord) -> Exception + Send + Sync>;

/// Type-name keyed factories for typed hydration.
///
/// The default registry knows the protocol's own failure types.
#[derive(Clone)]
pub struct ErrorRegistry {
    factories: HashMap<String, Factory>,
}

impl ErrorRegistry {
    /// A registry with no factories; every record hydrates to [`RemoteError`].
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory for records named `name`.
    pub fn register<T, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        T: Throwable,
        F: Fn(&ErrorRecord) -> T + Send + Sync + 'static,
    {
        self.factories.insert(
            name.into(),
            Arc::new(move |record: &ErrorRecord| Exception::new(factory(record))),
        );
        self
    }

    /// Builder form of [`ErrorRegistry::register`].
    pub fn with<T, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        T: Throwable,
        F: Fn(&ErrorRecord) -> T + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Rebuild an exception, typed when a factory is registered for its name.
    ///
    /// The result always reports the record's name, message, ancestors and
    /// stack.
    pub fn hydrate(&self, record: &ErrorRecord) -> Exception {
        match self.factories.get(&record.name) {
            Some(factory) => factory(record).with_identity(
                record.name.clone(),
                record.message.clone(),
                record.ancestors.clone(),
                record.stack.clone(),
            ),
            None => hydrate(record),
        }
    }
}

impl Default for ErrorRegistry {
    fn default() -> Self {
        Self::empty()
            .with(VERSION_MISMATCH.name(), |r: &ErrorRecord| {
                VersionMismatch::new(r.message.clone())
            })
            .with(METHOD_NOT_AVAILABLE.name(), |r: &ErrorRecord| {
                MethodNotAvailable::new(r.message.clone())
            })
            .with(PARAMETER_VALIDATION_ERROR.name(), |r: &ErrorRecord| {
                ParameterValidationError::new(r.message.clone())
            })
            .with(INTERNAL_ERROR.name(), |r: &ErrorRecord| {
                InternalError::new(r.message.clone())
            })
    }
}

impl fmt::Debug for ErrorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ErrorRegistry").field("types", &names).finish()
    }
}
