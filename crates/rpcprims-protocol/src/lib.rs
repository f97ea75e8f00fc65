//! Wire model for rpcprims.
//!
//! This is the lowest layer of rpcprims. It defines:
//! - Single and batch request/response envelopes
//! - The error codec that carries exception type identity across a transport
//! - Caret-range version negotiation between client and server
//!
//! Nothing here performs I/O. Moving envelopes between processes is the
//! integrator's job.

pub mod class;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod exception;
pub mod guards;
pub mod method;
pub mod version;

pub use class::{
    ErrorClass, CUSTOM_ERROR, ERROR, INTERNAL_ERROR, METHOD_NOT_AVAILABLE,
    PARAMETER_VALIDATION_ERROR, VERSION_MISMATCH,
};
pub use codec::{hydrate, normalize, normalize_throwable, ErrorRecord, ErrorRegistry};
pub use envelope::{
    BatchBody, BatchCall, BatchRequest, BatchResponse, Outcome, Request, Response, PROTOCOL,
    PROTOCOL_VERSION,
};
pub use error::{
    InternalError, MethodNotAvailable, ParameterValidationError, ProtocolError, Result,
    VersionMismatch, METHOD_NOT_AVAILABLE_MESSAGE,
};
pub use exception::{panic_message, Exception, RemoteError, Throwable};
pub use guards::{
    is_batch_request, is_batch_response, is_error, is_request, is_response, is_result,
};
pub use method::{IntoMethodPath, MethodPath};
pub use version::{negotiate, Version};
