//! Structured error types for repository operations
//!
//! Session backends report failures as [`RepositoryError`] values carrying
//! the operation that was running, an error category, and optional entity
//! context. The facade returns these to the caller unchanged — it never
//! inspects, wraps, or retries them.
//!
//! # Example
//!
//! ```rust
//! use unirepo::error::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::not_found("User", "usr_123");
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert!(!error.is_retriable());
//! ```

use std::fmt;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Crate-level result type
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for construction and configuration paths
///
/// Repository operations themselves return [`RepositoryError`]; this enum
/// only appears where configuration is loaded or a backend is wired up.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or extraction failed
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration was loaded but is not usable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A repository operation failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Finding a single entity by identity
    FindById,
    /// Finding a single entity by filter
    FindOne,
    /// Finding multiple entities
    FindAll,
    /// Creating one or more entities
    Insert,
    /// Updating one or more entities
    Update,
    /// Deleting entities (hard delete)
    Delete,
    /// Marking entities as deleted without removing them
    SoftDelete,
    /// Permanently removing entities regardless of tombstone state
    HardDelete,
    /// Clearing tombstone state
    Restore,
    /// Listing tombstoned entities
    GetTrashed,
    /// Transaction control (begin, commit, rollback)
    Transaction,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindById => write!(f, "find_by_id"),
            Self::FindOne => write!(f, "find_one"),
            Self::FindAll => write!(f, "find_all"),
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::SoftDelete => write!(f, "soft_delete"),
            Self::HardDelete => write!(f, "hard_delete"),
            Self::Restore => write!(f, "restore"),
            Self::GetTrashed => write!(f, "get_trashed"),
            Self::Transaction => write!(f, "transaction"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Entity was not found
    NotFound,
    /// Entity already exists (duplicate key)
    AlreadyExists,
    /// Backend constraint violation
    ConstraintViolation,
    /// Failed to reach the backend
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// The call context was cancelled before the operation completed
    Cancelled,
    /// Transaction could not be started, committed, or rolled back
    TransactionFailed,
    /// Underlying backend error
    BackendError,
    /// Serialization or deserialization error
    SerializationError,
    /// Other unclassified error
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::TransactionFailed => write!(f, "transaction_failed"),
            Self::BackendError => write!(f, "backend_error"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured repository error with operation context
///
/// # Example
///
/// ```rust
/// use unirepo::error::{RepositoryError, RepositoryOperation};
///
/// let error = RepositoryError::backend_error(RepositoryOperation::Insert, "duplicate slug")
///     .with_entity("Article", "art_42");
/// assert!(error.to_string().contains("[Article: art_42]"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The type of entity involved (e.g., "User", "Order")
    pub entity_type: Option<String>,
    /// The identity of the entity involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a "not found" error with entity context
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            operation: RepositoryOperation::FindById,
            kind: RepositoryErrorKind::NotFound,
            message: "Entity not found".to_string(),
            entity_type: Some(entity_type.into()),
            entity_id: Some(entity_id.into()),
        }
    }

    /// Create an "already exists" error with entity context
    pub fn already_exists(entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            operation: RepositoryOperation::Insert,
            kind: RepositoryErrorKind::AlreadyExists,
            message: "Entity already exists".to_string(),
            entity_type: Some(entity_type.into()),
            entity_id: Some(identifier.into()),
        }
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self {
            operation: RepositoryOperation::FindById,
            kind: RepositoryErrorKind::ConnectionFailed,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind: RepositoryErrorKind::Timeout,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: RepositoryOperation) -> Self {
        Self {
            operation,
            kind: RepositoryErrorKind::Cancelled,
            message: "Call context was cancelled".to_string(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a transaction error
    pub fn transaction_failed(message: impl Into<String>) -> Self {
        Self {
            operation: RepositoryOperation::Transaction,
            kind: RepositoryErrorKind::TransactionFailed,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a backend error
    pub fn backend_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind: RepositoryErrorKind::BackendError,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a serialization error
    pub fn serialization_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind: RepositoryErrorKind::SerializationError,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is retriable (transient errors that may succeed on retry)
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(ref entity_type), Some(ref entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(format!("{}", RepositoryOperation::FindById), "find_by_id");
        assert_eq!(format!("{}", RepositoryOperation::SoftDelete), "soft_delete");
        assert_eq!(format!("{}", RepositoryOperation::Transaction), "transaction");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(format!("{}", RepositoryErrorKind::NotFound), "not_found");
        assert_eq!(
            format!("{}", RepositoryErrorKind::TransactionFailed),
            "transaction_failed"
        );
        assert_eq!(format!("{}", RepositoryErrorKind::Cancelled), "cancelled");
    }

    #[test]
    fn test_not_found_convenience() {
        let error = RepositoryError::not_found("User", "usr_123");
        assert_eq!(error.operation, RepositoryOperation::FindById);
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
        assert_eq!(error.entity_type, Some("User".to_string()));
        assert_eq!(error.entity_id, Some("usr_123".to_string()));
    }

    #[test]
    fn test_with_entity_and_operation() {
        let error = RepositoryError::backend_error(RepositoryOperation::Update, "stale row")
            .with_entity("Order", "ord_456")
            .with_operation(RepositoryOperation::Delete);

        assert_eq!(error.operation, RepositoryOperation::Delete);
        assert_eq!(error.entity_type, Some("Order".to_string()));
    }

    #[test]
    fn test_is_retriable() {
        assert!(RepositoryError::connection_failed("refused").is_retriable());
        assert!(RepositoryError::timeout(RepositoryOperation::FindAll, "30s").is_retriable());
        assert!(!RepositoryError::not_found("User", "123").is_retriable());
        assert!(!RepositoryError::cancelled(RepositoryOperation::FindAll).is_retriable());
        assert!(!RepositoryError::transaction_failed("no open transaction").is_retriable());
    }

    #[test]
    fn test_display_with_entity() {
        let error = RepositoryError::not_found("User", "usr_123");
        let display = format!("{}", error);
        assert!(display.contains("not_found"));
        assert!(display.contains("find_by_id"));
        assert!(display.contains("[User: usr_123]"));
    }

    #[test]
    fn test_error_conversion() {
        let repo_err = RepositoryError::not_found("User", "1");
        let err: Error = repo_err.clone().into();
        assert_eq!(err.to_string(), repo_err.to_string());
    }
}
