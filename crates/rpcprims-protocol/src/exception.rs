//! Type-erased errors that keep their type identity across the wire.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;

use crate::class::{ErrorClass, ERROR};

/// An error that can be raised by a method and reported to the caller.
///
/// Implementors declare their place in the error hierarchy through
/// [`Throwable::class`]. The name and ancestor chain default to the class's.
///
/// ```
/// use rpcprims_protocol::{ErrorClass, Exception, Throwable, CUSTOM_ERROR};
///
/// static NOT_FOUND: ErrorClass = ErrorClass::extends("NotFound", &CUSTOM_ERROR);
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("no such key: {0}")]
/// struct NotFound(String);
///
/// impl Throwable for NotFound {
///     fn class(&self) -> &'static ErrorClass {
///         &NOT_FOUND
///     }
/// }
///
/// let err = Exception::from(NotFound("a".into()));
/// assert_eq!(err.name(), "NotFound");
/// assert!(err.is("CustomError"));
/// ```
pub trait Throwable: StdError + Send + Sync + 'static {
    /// Declared type of this error. Defaults to the root `Error` type.
    fn class(&self) -> &'static ErrorClass {
        &ERROR
    }

    /// Most-derived type name.
    fn name(&self) -> &str {
        self.class().name()
    }

    /// Ancestor type names, closest first.
    fn ancestors(&self) -> Vec<String> {
        self.class().ancestors()
    }

    /// Stack text recorded somewhere else, if this error carries one.
    fn stack(&self) -> Option<&str> {
        None
    }
}

trait AnyThrowable: Throwable {
    fn as_any(&self) -> &dyn Any;
    fn as_std(&self) -> &(dyn StdError + 'static);
}

impl<T: Throwable> AnyThrowable for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_std(&self) -> &(dyn StdError + 'static) {
        self
    }
}

/// Owned, type-erased [`Throwable`] plus the identity it is reported under.
///
/// This is what handlers return on failure and what clients receive after
/// hydration. Matching works two ways: structurally by type name with
/// [`Exception::is`], or nominally with [`Exception::downcast_ref`] when the
/// concrete type is known locally.
pub struct Exception {
    inner: Box<dyn AnyThrowable>,
    name: String,
    message: Option<String>,
    ancestors: Vec<String>,
    stack: String,
}

impl Exception {
    /// Wrap a throwable, capturing stack text at this point unless the error
    /// already carries its own.
    pub fn new<T: Throwable>(error: T) -> Self {
        let name = error.name().to_string();
        let ancestors = error.ancestors();
        let stack = match error.stack() {
            Some(stack) => stack.to_string(),
            None => capture_stack(&name, &error.to_string()),
        };
        Self {
            inner: Box::new(error),
            name,
            message: None,
            ancestors,
            stack,
        }
    }

    /// A plain `Error` carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Replace the reported identity with the one recorded on the wire.
    ///
    /// The recorded message wins over the concrete error's `Display`.
    pub(crate) fn with_identity(
        mut self,
        name: impl Into<String>,
        message: impl Into<String>,
        ancestors: Vec<String>,
        stack: impl Into<String>,
    ) -> Self {
        self.name = name.into();
        self.message = Some(message.into());
        self.ancestors = ancestors;
        self.stack = stack.into();
        self
    }

    /// Most-derived type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable message.
    pub fn message(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => self.inner.to_string(),
        }
    }

    /// Stack text, either captured at creation or carried over the wire.
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Ancestor type names, closest first.
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    /// True if `name` is this error's type or one of its ancestors.
    ///
    /// Every exception is an `Error`, whatever chain its sender reported.
    pub fn is(&self, name: &str) -> bool {
        name == ERROR.name()
            || self.name == name
            || self.ancestors.iter().any(|ancestor| ancestor == name)
    }

    /// True if this error is an instance of `class`.
    pub fn is_class(&self, class: &ErrorClass) -> bool {
        self.is(class.name())
    }

    /// Borrow the concrete error if it is a `T`.
    pub fn downcast_ref<T: Throwable>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }
}

impl<T: Throwable> From<T> for Exception {
    fn from(error: T) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.name, message),
            None => write!(f, "{}: {}", self.name, self.inner),
        }
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exception")
            .field("name", &self.name)
            .field("message", &self.message())
            .field("ancestors", &self.ancestors)
            .finish()
    }
}

impl StdError for Exception {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.inner.as_std())
    }
}

/// Generic stand-in for an error whose concrete type is unknown locally.
///
/// Carries the remote name, message, stack and ancestors verbatim so
/// structural matching keeps working.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    name: String,
    message: String,
    stack: String,
    ancestors: Vec<String>,
}

impl RemoteError {
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        stack: impl Into<String>,
        ancestors: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: stack.into(),
            ancestors,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for RemoteError {}

impl Throwable for RemoteError {
    fn name(&self) -> &str {
        &self.name
    }

    fn ancestors(&self) -> Vec<String> {
        self.ancestors.clone()
    }

    fn stack(&self) -> Option<&str> {
        Some(&self.stack)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

impl Throwable for Message {}

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

fn capture_stack(name: &str, message: &str) -> String {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => format!("{name}: {message}\n{backtrace}"),
        _ => format!("{name}: {message}"),
    }
}
