//! Error type hierarchy shared by both ends of a call.
//!
//! Every error that crosses the wire names its concrete type and the chain
//! of types it derives from. The chain is declared once per type as a
//! static [`ErrorClass`]:
//!
//! ```
//! use rpcprims_protocol::{ErrorClass, CUSTOM_ERROR};
//!
//! static QUOTA_EXCEEDED: ErrorClass = ErrorClass::extends("QuotaExceeded", &CUSTOM_ERROR);
//!
//! assert_eq!(QUOTA_EXCEEDED.ancestors(), vec!["CustomError", "Error"]);
//! ```

/// A named error type and its parent.
#[derive(Debug, PartialEq, Eq)]
pub struct ErrorClass {
    name: &'static str,
    parent: Option<&'static ErrorClass>,
}

impl ErrorClass {
    /// Declare a root type with no parent.
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Declare a type deriving from `parent`.
    pub const fn extends(name: &'static str, parent: &'static ErrorClass) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// Type name as it appears on the wire.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Direct parent, if any.
    pub fn parent(&self) -> Option<&'static ErrorClass> {
        self.parent
    }

    /// Parent type names, closest first. Empty for a root type.
    pub fn ancestors(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = self.parent;
        while let Some(class) = current {
            names.push(class.name.to_string());
            current = class.parent;
        }
        names
    }

    /// True if `name` is this type or one of its ancestors.
    pub fn is(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.name == name {
                return true;
            }
            current = class.parent;
        }
        false
    }
}

/// Base type of every error.
pub static ERROR: ErrorClass = ErrorClass::root("Error");

/// Base type of every non-builtin error, including the protocol's own.
pub static CUSTOM_ERROR: ErrorClass = ErrorClass::extends("CustomError", &ERROR);

/// The server's version does not satisfy the client's expected range.
pub static VERSION_MISMATCH: ErrorClass = ErrorClass::extends("VersionMismatch", &CUSTOM_ERROR);

/// The method path does not resolve to a callable.
pub static METHOD_NOT_AVAILABLE: ErrorClass =
    ErrorClass::extends("MethodNotAvailable", &CUSTOM_ERROR);

/// A parameter validator rejected the call's arguments.
pub static PARAMETER_VALIDATION_ERROR: ErrorClass =
    ErrorClass::extends("ParameterValidationError", &CUSTOM_ERROR);

/// The dispatch machinery failed for a reason not attributable to user code.
pub static INTERNAL_ERROR: ErrorClass = ErrorClass::extends("InternalError", &CUSTOM_ERROR);

#[cfg(test)]
mod tests {
    use super::*;

    static LEAF: ErrorClass = ErrorClass::extends("Leaf", &MIDDLE);
    static MIDDLE: ErrorClass = ErrorClass::extends("Middle", &CUSTOM_ERROR);

    #[test]
    fn root_has_no_ancestors() {
        assert!(ERROR.ancestors().is_empty());
        assert!(ERROR.parent().is_none());
    }

    #[test]
    fn ancestors_are_closest_first() {
        assert_eq!(LEAF.ancestors(), vec!["Middle", "CustomError", "Error"]);
        assert_eq!(
            METHOD_NOT_AVAILABLE.ancestors(),
            vec!["CustomError", "Error"]
        );
    }

    #[test]
    fn is_matches_self_and_ancestors() {
        assert!(LEAF.is("Leaf"));
        assert!(LEAF.is("Middle"));
        assert!(LEAF.is("Error"));
        assert!(!LEAF.is("VersionMismatch"));
        assert!(!MIDDLE.is("Leaf"));
    }
}
