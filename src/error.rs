//! Domain error taxonomy.
//!
//! A small, stable set of error kinds surfaced to callers in place of raw
//! storage-engine exception types. Classification from driver errors lives in
//! [`crate::db::translate`]; this module only defines the taxonomy.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Uniqueness violation on the identity-bearing field.
    #[error("{field} already exists")]
    Conflict { field: String },

    /// A referenced entity does not exist.
    #[error("{reference} doesn't exist")]
    ForeignKeyViolation { reference: String },

    /// Any other integrity violation. Coarse by design.
    #[error("{message}")]
    Forbidden { message: String },

    /// Transient operational failure (connectivity, pool exhaustion).
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("unexpected storage failure: {message}")]
    Unknown { message: String },
}

impl DomainError {
    pub fn conflict(field: impl Into<String>) -> Self {
        Self::Conflict {
            field: field.into(),
        }
    }

    pub fn foreign_key(reference: impl Into<String>) -> Self {
        Self::ForeignKeyViolation {
            reference: reference.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Stable kind tag for transport-layer status mapping.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Conflict { .. } => "conflict",
            Self::ForeignKeyViolation { .. } => "foreign_key_violation",
            Self::Forbidden { .. } => "forbidden",
            Self::Unavailable { .. } => "unavailable",
            Self::Unknown { .. } => "unknown",
        }
    }

    /// Whether retrying the operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Result type alias for persistence operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message() {
        let err = DomainError::conflict("email");
        assert_eq!(err.to_string(), "email already exists");
        assert_eq!(err.kind(), "conflict");
    }

    #[test]
    fn test_foreign_key_message() {
        let err = DomainError::foreign_key("city_id");
        assert_eq!(err.to_string(), "city_id doesn't exist");
    }

    #[test]
    fn test_transient_classification() {
        assert!(DomainError::unavailable("pool closed").is_transient());
        assert!(!DomainError::forbidden("db exception").is_transient());
        assert!(!DomainError::conflict("email").is_transient());
    }
}
