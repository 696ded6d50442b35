//! Error types for the reflection system

use core::fmt;
use thiserror::Error;

/// Result type for reflection operations
pub type Result<T> = core::result::Result<T, Error>;

/// Kind of a reflection failure
///
/// Kinds form a small refinement tree: `InvalidProperty` and
/// `InvalidFunction` are `InvalidMember`s, which together with
/// `InvalidQualifier` are `InvalidType`s. Use [`ErrorKind::is`] to test
/// against a coarser kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Argument at the given index is missing or has the wrong type
    InvalidParam(usize),
    /// Value has the wrong type for the operation
    InvalidType,
    /// Value has the right type but the wrong mutability
    InvalidQualifier,
    /// Requested member does not exist
    InvalidMember,
    /// Requested property does not exist or cannot be written
    InvalidProperty,
    /// Requested function does not exist or no overload matches
    InvalidFunction,
    /// Operation requires a reference `Any`
    ExpectedRefAny,
    /// Operation requires a non-empty `Any`
    UnexpectedEmptyAny,
    /// Type has no copy constructor
    NotCopyable,
    /// Parent cast reaches more than one distinct sub-object
    AmbiguousCast,
}

impl ErrorKind {
    /// The coarser kind this one refines, if any
    pub const fn parent(self) -> Option<ErrorKind> {
        match self {
            ErrorKind::InvalidQualifier | ErrorKind::InvalidMember => Some(ErrorKind::InvalidType),
            ErrorKind::InvalidProperty | ErrorKind::InvalidFunction => Some(ErrorKind::InvalidMember),
            ErrorKind::AmbiguousCast => Some(ErrorKind::InvalidType),
            _ => None,
        }
    }

    /// Check whether this kind is `other` or one of its refinements
    pub fn is(self, other: ErrorKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Parameter index for `InvalidParam`
    pub const fn param_index(self) -> Option<usize> {
        match self {
            ErrorKind::InvalidParam(index) => Some(index),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidParam(index) => write!(f, "invalid parameter {}", index),
            ErrorKind::InvalidType => write!(f, "invalid type"),
            ErrorKind::InvalidQualifier => write!(f, "invalid qualifier"),
            ErrorKind::InvalidMember => write!(f, "invalid member"),
            ErrorKind::InvalidProperty => write!(f, "invalid property"),
            ErrorKind::InvalidFunction => write!(f, "invalid function"),
            ErrorKind::ExpectedRefAny => write!(f, "expected reference any"),
            ErrorKind::UnexpectedEmptyAny => write!(f, "unexpected empty any"),
            ErrorKind::NotCopyable => write!(f, "not copyable"),
            ErrorKind::AmbiguousCast => write!(f, "ambiguous cast"),
        }
    }
}

/// A reflection failure with its kind and a human-readable message
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    /// Create an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an `InvalidParam` error for an argument index
    pub fn invalid_param(index: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParam(index), message)
    }

    /// Create an `InvalidType` error naming the expected and found types
    pub fn invalid_type(expected: &str, found: &str) -> Self {
        Self::new(
            ErrorKind::InvalidType,
            format!("expected '{}', found '{}'", expected, found),
        )
    }

    /// Create an `UnexpectedEmptyAny` error
    pub fn empty_any(operation: &str) -> Self {
        Self::new(
            ErrorKind::UnexpectedEmptyAny,
            format!("cannot {} an empty any", operation),
        )
    }

    /// Get the error kind
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the message
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check whether this error's kind is `kind` or one of its refinements
    #[inline]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind.is(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_refinement() {
        assert!(ErrorKind::InvalidProperty.is(ErrorKind::InvalidMember));
        assert!(ErrorKind::InvalidProperty.is(ErrorKind::InvalidType));
        assert!(ErrorKind::InvalidQualifier.is(ErrorKind::InvalidType));
        assert!(!ErrorKind::InvalidType.is(ErrorKind::InvalidMember));
        assert!(!ErrorKind::ExpectedRefAny.is(ErrorKind::InvalidType));
    }

    #[test]
    fn test_param_index() {
        let err = Error::invalid_param(2, "bad argument");
        assert_eq!(err.kind().param_index(), Some(2));
        assert!(err.is(ErrorKind::InvalidParam(2)));
        assert_eq!(err.to_string(), "invalid parameter 2: bad argument");
    }
}
