use crate::class::{
    ErrorClass, INTERNAL_ERROR, METHOD_NOT_AVAILABLE, PARAMETER_VALIDATION_ERROR, VERSION_MISMATCH,
};
use crate::exception::Throwable;

/// Errors raised while building or parsing protocol values locally.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A version string is not `<major>.<minor>.<patch>`.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// A method path has no segments.
    #[error("method path must have at least one segment")]
    EmptyMethodPath,

    /// A batch carries no calls.
    #[error("batch must contain at least one call")]
    EmptyBatch,

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reported to callers as a plain `Error`.
impl Throwable for ProtocolError {}

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Message of the failure returned for unresolvable method paths.
pub const METHOD_NOT_AVAILABLE_MESSAGE: &str = "The method is not available.";

macro_rules! protocol_failure {
    ($(#[$meta:meta])* $name:ident => $class:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        #[error("{message}")]
        pub struct $name {
            message: String,
        }

        impl $name {
            pub fn new(message: impl Into<String>) -> Self {
                Self {
                    message: message.into(),
                }
            }

            pub fn message(&self) -> &str {
                &self.message
            }
        }

        impl Throwable for $name {
            fn class(&self) -> &'static ErrorClass {
                &$class
            }
        }
    };
}

protocol_failure!(
    /// The server's version does not satisfy the client's expected range.
    VersionMismatch => VERSION_MISMATCH
);

protocol_failure!(
    /// The method path does not resolve to a callable.
    MethodNotAvailable => METHOD_NOT_AVAILABLE
);

protocol_failure!(
    /// A parameter validator rejected the arguments.
    ParameterValidationError => PARAMETER_VALIDATION_ERROR
);

protocol_failure!(
    /// The dispatch machinery itself failed.
    InternalError => INTERNAL_ERROR
);

impl Default for MethodNotAvailable {
    fn default() -> Self {
        Self::new(METHOD_NOT_AVAILABLE_MESSAGE)
    }
}
