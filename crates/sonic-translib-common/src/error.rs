//! Error types for translib operations.
//!
//! Two layers of errors exist:
//!
//! - [`DbError`]: what a [`ConfigDb`](crate::ConfigDb) store reports
//! - [`TranslibError`]: what an application returns to the request dispatcher
//!
//! All errors implement `std::error::Error` via `thiserror`.

use thiserror::Error;

/// Result type alias for store operations.
pub type DbResult<T> = Result<T, DbError>;

/// Result type alias for request processing.
pub type TranslibResult<T> = Result<T, TranslibError>;

/// Errors reported by a CONFIG_DB store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DbError {
    /// The requested entry does not exist.
    #[error("Entry not found: {table}|{key}")]
    NotFound {
        /// The table name.
        table: String,
        /// The key, joined with the table separator.
        key: String,
    },

    /// An entry with this key already exists (create only).
    #[error("Entry already exists: {table}|{key}")]
    AlreadyExists {
        /// The table name.
        table: String,
        /// The key, joined with the table separator.
        key: String,
    },

    /// The backend failed to carry out the operation.
    #[error("Database operation failed: {operation}: {message}")]
    Backend {
        /// The operation that failed (e.g., "hgetall", "del").
        operation: String,
        /// Error message.
        message: String,
    },
}

impl DbError {
    /// Creates a not-found error.
    pub fn not_found(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Creates an already-exists error.
    pub fn already_exists(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Creates a backend error.
    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns true if the entry was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

/// Coarse error classification returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Referenced resource or path is absent.
    NotFound,
    /// Malformed request payload or path variable.
    InvalidArgs,
    /// Duplicate create.
    AlreadyExists,
    /// Unknown path template or disallowed operation.
    Unsupported,
    /// Opaque store failure.
    Db,
    /// Failure inside the application itself.
    Internal,
}

impl ErrorKind {
    /// Returns the kind name as used in responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::InvalidArgs => "invalid-args",
            ErrorKind::AlreadyExists => "already-exists",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Db => "db",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Errors returned by translib applications.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslibError {
    /// Referenced resource is absent.
    #[error("Resource not found: {resource}")]
    NotFound {
        /// The missing resource (e.g., "Vlan10").
        resource: String,
    },

    /// Request payload or path variable could not be parsed.
    #[error("Invalid arguments: {message}")]
    InvalidArgs {
        /// What was wrong with the request.
        message: String,
    },

    /// The store refused a duplicate create.
    #[error("Resource already exists: {table}|{key}")]
    AlreadyExists {
        /// The table name.
        table: String,
        /// The duplicate key.
        key: String,
    },

    /// Unknown path or operation not allowed on it.
    #[error("Unsupported: {message}")]
    Unsupported {
        /// Error message.
        message: String,
    },

    /// Any other store failure, propagated opaquely.
    #[error(transparent)]
    Db(DbError),

    /// Response could not be produced.
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl TranslibError {
    /// Creates a not-found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs {
            message: message.into(),
        }
    }

    /// Creates an unsupported error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslibError::NotFound { .. } => ErrorKind::NotFound,
            TranslibError::InvalidArgs { .. } => ErrorKind::InvalidArgs,
            TranslibError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            TranslibError::Unsupported { .. } => ErrorKind::Unsupported,
            TranslibError::Db(_) => ErrorKind::Db,
            TranslibError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Returns true if this error reports an absent resource.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<DbError> for TranslibError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::AlreadyExists { table, key } => TranslibError::AlreadyExists { table, key },
            other => TranslibError::Db(other),
        }
    }
}
