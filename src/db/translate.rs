//! Storage failure classification.
//!
//! The single cross-cutting wrapper applied to every dispatcher operation.
//! Classification prefers the driver's structured signals (error kind,
//! SQLSTATE, constraint name) and falls back to message text only when no
//! structured signal exists. Raw engine text never reaches the caller; it
//! goes to the log instead.

use crate::error::DomainError;
use crate::models::Schema;
use sqlx::error::{DatabaseError, ErrorKind};
use tracing::warn;

#[derive(Debug, Clone)]
struct ReferenceTarget {
    column: String,
    referenced_table: String,
}

#[derive(Debug, Clone)]
pub struct ErrorTranslator {
    identity_field: String,
    references: Vec<ReferenceTarget>,
}

impl ErrorTranslator {
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            identity_field: schema.identity_column.to_string(),
            references: schema
                .references
                .iter()
                .map(|r| ReferenceTarget {
                    column: r.column.to_string(),
                    referenced_table: r.referenced_table.to_string(),
                })
                .collect(),
        }
    }

    /// Map a driver failure into the domain taxonomy.
    pub fn translate(&self, err: sqlx::Error) -> DomainError {
        match err {
            sqlx::Error::Database(db) => self.classify(db.as_ref()),
            sqlx::Error::Io(e) => {
                warn!(error = %e, "i/o failure reaching storage");
                DomainError::unavailable("i/o failure reaching storage")
            }
            sqlx::Error::PoolTimedOut => {
                DomainError::unavailable("connection pool acquire timed out")
            }
            sqlx::Error::PoolClosed => DomainError::unavailable("connection pool is closed"),
            sqlx::Error::Tls(e) => {
                warn!(error = %e, "tls failure reaching storage");
                DomainError::unavailable("tls failure reaching storage")
            }
            sqlx::Error::Protocol(e) => {
                warn!(error = %e, "protocol failure");
                DomainError::unavailable("protocol failure")
            }
            other => {
                warn!(error = %other, "unclassified storage failure");
                DomainError::unknown("unclassified storage failure")
            }
        }
    }

    fn classify(&self, db: &dyn DatabaseError) -> DomainError {
        match db.kind() {
            ErrorKind::UniqueViolation => {
                if self.names_identity(db) {
                    DomainError::conflict(&self.identity_field)
                } else {
                    warn!(
                        constraint = ?db.constraint(),
                        message = %db.message(),
                        "uniqueness violation outside the identity field"
                    );
                    DomainError::forbidden("db exception")
                }
            }
            ErrorKind::ForeignKeyViolation => {
                DomainError::foreign_key(self.referenced_column(db))
            }
            ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                warn!(message = %db.message(), "integrity violation");
                DomainError::forbidden("db exception")
            }
            _ => self.classify_by_text(db),
        }
    }

    // Fallback for drivers that expose no structured kind.
    fn classify_by_text(&self, db: &dyn DatabaseError) -> DomainError {
        let message = db.message().to_ascii_lowercase();
        if message.contains("unique") && message.contains(&self.identity_field) {
            return DomainError::conflict(&self.identity_field);
        }
        if message.contains("foreign key") {
            return DomainError::foreign_key(self.referenced_column(db));
        }
        if message.contains("constraint") {
            warn!(message = %db.message(), "integrity violation");
            return DomainError::forbidden("db exception");
        }
        warn!(code = ?db.code(), message = %db.message(), "unclassified database error");
        DomainError::unknown("unclassified storage failure")
    }

    fn names_identity(&self, db: &dyn DatabaseError) -> bool {
        db.constraint()
            .is_some_and(|c| c.contains(&self.identity_field))
            || db
                .message()
                .to_ascii_lowercase()
                .contains(&self.identity_field)
    }

    fn referenced_column(&self, db: &dyn DatabaseError) -> String {
        let message = db.message().to_ascii_lowercase();
        for r in &self.references {
            let in_constraint = db.constraint().is_some_and(|c| c.contains(&r.column));
            if in_constraint || message.contains(&r.column) || message.contains(&r.referenced_table)
            {
                return r.column.clone();
            }
        }
        // SQLite names no target in its message; with a single registered
        // reference the culprit is unambiguous.
        if let [only] = self.references.as_slice() {
            return only.column.clone();
        }
        warn!(message = %db.message(), "referential violation with unknown target");
        "reference".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        message: String,
        kind: ErrorKind,
        constraint: Option<String>,
    }

    impl TestDbError {
        fn new(kind: ErrorKind, message: &str, constraint: Option<&str>) -> sqlx::Error {
            sqlx::Error::Database(Box::new(Self {
                message: message.to_string(),
                kind,
                constraint: constraint.map(String::from),
            }))
        }
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.message)
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &str {
            &self.message
        }

        fn kind(&self) -> ErrorKind {
            match self.kind {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::NotNullViolation => ErrorKind::NotNullViolation,
                ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint.as_deref()
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }
    }

    fn translator() -> ErrorTranslator {
        ErrorTranslator::from_schema(&Schema::directory())
    }

    #[test]
    fn test_unique_violation_on_identity_is_conflict() {
        // PostgreSQL shape: constraint name carries the column
        let err = TestDbError::new(
            ErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"users_email_key\"",
            Some("users_email_key"),
        );
        assert_eq!(translator().translate(err), DomainError::conflict("email"));
    }

    #[test]
    fn test_unique_violation_from_message_only() {
        // SQLite shape: no constraint name, column only in the message
        let err = TestDbError::new(
            ErrorKind::UniqueViolation,
            "UNIQUE constraint failed: users.email",
            None,
        );
        assert_eq!(translator().translate(err), DomainError::conflict("email"));
    }

    #[test]
    fn test_unique_violation_elsewhere_is_forbidden() {
        let err = TestDbError::new(
            ErrorKind::UniqueViolation,
            "UNIQUE constraint failed: city.name",
            Some("city_name_key"),
        );
        assert_eq!(
            translator().translate(err),
            DomainError::forbidden("db exception")
        );
    }

    #[test]
    fn test_foreign_key_violation_names_column() {
        let err = TestDbError::new(
            ErrorKind::ForeignKeyViolation,
            "insert or update on table \"users\" violates foreign key constraint \"users_city_id_fkey\"",
            Some("users_city_id_fkey"),
        );
        assert_eq!(
            translator().translate(err),
            DomainError::foreign_key("city_id")
        );
    }

    #[test]
    fn test_foreign_key_violation_without_target_uses_sole_reference() {
        // SQLite reports no column at all
        let err = TestDbError::new(
            ErrorKind::ForeignKeyViolation,
            "FOREIGN KEY constraint failed",
            None,
        );
        assert_eq!(
            translator().translate(err),
            DomainError::foreign_key("city_id")
        );
    }

    #[test]
    fn test_not_null_violation_is_forbidden() {
        let err = TestDbError::new(
            ErrorKind::NotNullViolation,
            "null value in column \"password_hash\"",
            None,
        );
        assert_eq!(
            translator().translate(err),
            DomainError::forbidden("db exception")
        );
    }

    #[test]
    fn test_text_fallback_when_kind_is_other() {
        let err = TestDbError::new(
            ErrorKind::Other,
            "UNIQUE constraint violated on users.email",
            None,
        );
        assert_eq!(translator().translate(err), DomainError::conflict("email"));
    }

    #[test]
    fn test_operational_failures_are_unavailable() {
        let t = translator();
        assert!(t.translate(sqlx::Error::PoolTimedOut).is_transient());
        assert!(t.translate(sqlx::Error::PoolClosed).is_transient());
    }

    #[test]
    fn test_unrecognized_errors_are_unknown() {
        let err = TestDbError::new(ErrorKind::Other, "syntax error at or near \"FORM\"", None);
        assert_eq!(translator().translate(err).kind(), "unknown");
    }

    #[test]
    fn test_no_raw_engine_text_leaks() {
        let raw = "syntax error at or near \"FORM\"";
        let err = TestDbError::new(ErrorKind::Other, raw, None);
        let translated = translator().translate(err);
        assert!(!translated.to_string().contains("FORM"));
    }
}
