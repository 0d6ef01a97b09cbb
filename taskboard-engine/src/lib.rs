//! # Taskboard Engine
//!
//! Client-side state engine for kanban boards: canonical in-memory board
//! state, pointer-driven drag-and-drop, optimistic updates and reconciliation
//! with a remote backend.
//!
//! ## Architecture
//!
//! - **Store**: [`BoardStateStore`] owns columns and tasks; array order is the
//!   only source of `position`
//! - **Drag**: [`DragSession`] is an `Idle -> Pending -> Active` state machine
//!   that proposes a [`DragCommit`] and never touches the board itself
//! - **Optimistic log**: [`OptimisticUpdateLog`] keeps each unconfirmed
//!   mutation with the state needed to undo it
//! - **Sync**: [`SyncGateway`] turns updates into owned [`SyncRequest`]s,
//!   defers calls that would need a local identity and folds each
//!   [`SyncResponse`] back in, swapping identities on confirm
//! - **Session**: [`BoardSession`] wires the three together for one board and
//!   queues requests in an outbox so no intent waits on the network
//!
//! ## Identities
//!
//! Entities created on the client carry [`Identity::Local`] until the backend
//! confirms them, at which point the local key is replaced everywhere in one
//! step. A local identity is never sent to the backend.
//!
//! ## Example
//!
//! ```ignore
//! use taskboard_engine::{BoardSession, BoardId, ColumnKey, TaskDraft};
//!
//! let mut session = BoardSession::new(backend);
//! session.load(&BoardId::from("roadmap")).await?;
//! let (task, _) = session.create_task(&ColumnKey::from("todo"), TaskDraft::new("Write docs"))?;
//! for result in session.flush().await {
//!     result?;
//! }
//! ```

pub mod auto_color;
pub mod config;
pub mod drag;
pub mod error;
pub mod optimistic;
pub mod session;
pub mod store;
pub mod sync;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::SyncConfig;
pub use drag::{DragCommit, DragPhase, DragSession, DragState, DropTarget, PointerOffset};
pub use error::{BackendError, BoardError, ConfigError, DragError, Result, SessionError, SyncError, SyncResult};
pub use optimistic::{
    MutationKind, OptimisticUpdate, OptimisticUpdateLog, PriorState, Subject, UpdateId, UpdateStatus,
};
pub use session::BoardSession;
pub use store::{group_by_column, BoardStateStore, ColumnRemoval, MoveReceipt};
pub use sync::{
    Applied, BoardBackend, BoardSnapshot, DeferredOp, Dispatch, Rollback, SyncGateway, SyncOutcome, SyncReply,
    SyncRequest, SyncResponse,
};
pub use types::{
    AssigneeRef, Board, BoardId, Column, ColumnDraft, ColumnId, ColumnKey, ColumnPatch, Identity, LocalId, Task,
    TaskDraft, TaskFilter, TaskId, TaskKey, TaskPatch, TaskPriority, TaskStatus, ViewMode,
};
