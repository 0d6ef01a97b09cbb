//! Persistence of optimistic updates
//!
//! [`BoardBackend`] is the seam to whatever stores the board remotely.
//! [`SyncGateway`] decides what to send: it turns recorded updates into
//! owned [`SyncRequest`]s, defers the ones that would need a local identity
//! and folds each [`SyncResponse`] back into the store. Sending happens
//! outside the gateway, so the store is never borrowed across a network
//! call and responses may come back in any order.

mod backend;
mod gateway;
mod request;

pub use backend::{BoardBackend, BoardSnapshot};
pub use gateway::{Applied, DeferredOp, Dispatch, Rollback, SyncGateway};
pub use request::{SyncReply, SyncRequest, SyncResponse};

use crate::types::{Column, ColumnKey, Task, TaskKey};

/// What happened to a persist call
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// A request was queued for sending; its result arrives later
    Queued,
    /// Backend agreed; the entry is cleared
    Confirmed,
    /// Held back until a local identity is confirmed
    Deferred,
    /// Backend applied the move but placed the task elsewhere. The entry is
    /// cleared; resync to adopt the server's order.
    Diverged {
        task: TaskKey,
        server_column: ColumnKey,
        server_position: usize,
    },
    /// The subject is gone locally; nothing more to do
    Cancelled,
    /// Task create confirmed under its server identity
    Created { task: Task },
    /// Column create confirmed under its server identity
    ColumnCreated { column: Column },
    /// A server copy whose local entity was removed before its create was
    /// confirmed has been deleted
    Discarded { remote: String },
    /// The board was refetched and replaced local state
    Resynced,
}
