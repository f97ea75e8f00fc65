use rpcprims_protocol::{ErrorClass, MethodPath, Throwable, CUSTOM_ERROR};

/// Type of every schema failure reported to a caller.
pub static SCHEMA_ERROR: ErrorClass = ErrorClass::extends("SchemaError", &CUSTOM_ERROR);

/// Errors raised while loading schemas or validating arguments against them.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A schema file could not be loaded.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// A schema could not be compiled.
    #[error("failed to compile schema for {method}: {message}")]
    CompileFailed { method: MethodPath, message: String },

    /// The arguments do not satisfy the method's schema.
    #[error("validation failed for {method}: {message}")]
    ValidationFailed { method: MethodPath, message: String },

    /// A schema document is not valid JSON.
    #[error("schema is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// No schema registered for the method.
    #[error("no schema registered for {0}")]
    NoSchema(MethodPath),

    /// A converted registry was asked to validate a method it has no schema for.
    #[error("method has no registered schema")]
    Unregistered,
}

impl Throwable for SchemaError {
    fn class(&self) -> &'static ErrorClass {
        &SCHEMA_ERROR
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
