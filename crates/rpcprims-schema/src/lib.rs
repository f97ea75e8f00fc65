//! Parameter validation for rpcprims methods.
//!
//! Validators are keyed by method path and run against a call's argument
//! list before the method itself is resolved. Paths without a validator are
//! never checked.
//!
//! With the `json-schema` feature, `SchemaRegistry` compiles JSON Schema
//! 2020-12 documents into validators for services that would rather declare
//! their contracts than code them.

#[cfg(feature = "json-schema")]
pub mod config;
#[cfg(feature = "json-schema")]
pub mod error;
#[cfg(feature = "json-schema")]
pub mod registry;
pub mod validators;

#[cfg(feature = "json-schema")]
pub use config::RegistryConfig;
#[cfg(feature = "json-schema")]
pub use error::{Result, SchemaError, SCHEMA_ERROR};
#[cfg(feature = "json-schema")]
pub use registry::SchemaRegistry;
pub use validators::{ParameterValidators, ValidatorFn};
