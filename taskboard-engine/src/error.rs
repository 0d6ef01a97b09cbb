//! Error types for the board engine

use crate::optimistic::UpdateId;
use thiserror::Error;

/// Result type for board store operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Result type for sync gateway operations
pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Errors raised by the in-memory board store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// No board has been loaded into the store
    #[error("no board loaded")]
    NotLoaded,

    /// Task not found (optionally within a specific column)
    #[error("task not found: {id}{}", .column.as_deref().map(|c| format!(" in column {c}")).unwrap_or_default())]
    TaskNotFound { id: String, column: Option<String> },

    /// Column not found
    #[error("column not found: {id}")]
    ColumnNotFound { id: String },

    /// Column has tasks and there is no other column to move them to
    #[error("column '{id}' has {count} tasks and is the last column on the board")]
    ColumnNotEmpty { id: String, count: usize },

    /// A source index does not address an existing task
    #[error("index {index} out of range for column {column} with {len} tasks")]
    IndexOutOfRange {
        column: String,
        index: usize,
        len: usize,
    },

    /// Duplicate ID
    #[error("duplicate {item_type} ID: {id}")]
    DuplicateId { item_type: String, id: String },

    /// Invalid field value
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// A positional invariant does not hold
    #[error("board invariant violated: {message}")]
    InvariantViolation { message: String },
}

impl BoardError {
    /// Create a task-not-found error
    pub fn task_not_found(id: impl ToString) -> Self {
        Self::TaskNotFound {
            id: id.to_string(),
            column: None,
        }
    }

    /// Create a task-not-found error scoped to a column
    pub fn task_not_in_column(id: impl ToString, column: impl ToString) -> Self {
        Self::TaskNotFound {
            id: id.to_string(),
            column: Some(column.to_string()),
        }
    }

    /// Create a column-not-found error
    pub fn column_not_found(id: impl ToString) -> Self {
        Self::ColumnNotFound { id: id.to_string() }
    }

    /// Create a duplicate ID error
    pub fn duplicate_id(item_type: impl Into<String>, id: impl ToString) -> Self {
        Self::DuplicateId {
            item_type: item_type.into(),
            id: id.to_string(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }
}

/// Errors raised by the drag state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragError {
    /// `start_drag` while another drag is in progress
    #[error("cannot start a drag while {phase}")]
    NotIdle { phase: &'static str },

    /// The call needs an activated drag
    #[error("drag is not active ({phase})")]
    NotActive { phase: &'static str },

    /// No drag in progress
    #[error("no drag in progress")]
    NotDragging,

    /// The dragged task could not be resolved in the store
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Errors reported by a [`BoardBackend`](crate::sync::BoardBackend)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Network-level failure (connection refused, reset, DNS)
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Request did not complete in time
    #[error("request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// Backend answered with a non-success status
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Backend state conflicts with the request (another client won)
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Entity does not exist on the backend
    #[error("{resource} not found on backend: {id}")]
    NotFound { resource: String, id: String },

    /// Response could not be mapped to board types
    #[error("invalid backend response: {message}")]
    InvalidResponse { message: String },
}

impl BackendError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Whether re-issuing the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Whether the backend's state disagrees with ours
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Errors raised by the sync gateway
#[derive(Debug, PartialEq, Error)]
pub enum SyncError {
    /// A persist call failed; the log entry is marked failed and kept
    #[error("persisting {update} failed: {source}")]
    Backend {
        update: UpdateId,
        #[source]
        source: BackendError,
    },

    /// Refetching the board failed; local state is unchanged
    #[error("resync of board {board} failed: {source}")]
    Resync {
        board: String,
        #[source]
        source: BackendError,
    },

    /// Deleting an orphaned server copy failed
    #[error("discarding server copy {remote} failed: {source}")]
    Discard {
        remote: String,
        #[source]
        source: BackendError,
    },

    /// The referenced optimistic update is not in the log
    #[error("unknown optimistic update: {id}")]
    UnknownUpdate { id: UpdateId },

    /// Folding a result into the store failed
    #[error(transparent)]
    Board(#[from] BoardError),
}

impl SyncError {
    /// The backend error behind this failure, if any
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::Backend { source, .. } | Self::Resync { source, .. } | Self::Discard { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether the caller could reasonably retry
    pub fn is_retryable(&self) -> bool {
        self.backend_error().is_some_and(BackendError::is_retryable)
    }
}

/// Errors raised by [`BoardSession`](crate::session::BoardSession)
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Drag(#[from] DragError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment could not extract the configuration
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// A value was present but unusable
    #[error("invalid configuration value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}
