//! Unified error handling for the eddy backend
//!
//! One error enum covers the whole failure taxonomy so the gateway can map
//! each outcome to a distinct, stable outward status: "retry with better
//! credentials" (`Unauthenticated`/`Unauthorized`) is distinguishable from
//! "this resource is gone" (`NotFound`) and from "you are not allowed"
//! (`Forbidden`).

use thiserror::Error;

/// Unified error type for eddy operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EddyError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Unknown document, policy, or invite (an exhausted invite is
    /// indistinguishable from an absent one)
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// No credential was supplied
    #[error("Unauthenticated: {message}")]
    Unauthenticated {
        /// Error message describing the missing credential
        message: String,
    },

    /// A credential was supplied but does not resolve to an actor
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error message describing the rejected credential
        message: String,
    },

    /// The document's policy explicitly denied the operation
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Error message describing the denial
        message: String,
    },

    /// Transactional constraint violation (e.g. duplicate actor)
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message describing the conflicting state
        message: String,
    },

    /// Storage operation failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Internal system error (policy evaluation failure, unexpected store
    /// failure); never silently mapped to allow or deny
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl EddyError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an unauthenticated error
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Standard Result type for eddy operations
pub type Result<T> = std::result::Result<T, EddyError>;

impl From<std::io::Error> for EddyError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::storage(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_produce_matching_variants() {
        let err = EddyError::not_found("invite gone");
        assert!(matches!(err, EddyError::NotFound { .. }));
        assert_eq!(err.to_string(), "Not found: invite gone");
    }

    #[test]
    fn io_not_found_maps_to_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        assert!(matches!(EddyError::from(io_err), EddyError::NotFound { .. }));
    }

    #[test]
    fn io_other_maps_to_storage() {
        let io_err = std::io::Error::other("disk on fire");
        assert!(matches!(EddyError::from(io_err), EddyError::Storage { .. }));
    }
}
