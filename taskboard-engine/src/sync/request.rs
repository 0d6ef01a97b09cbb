//! Backend calls as owned values
//!
//! A [`SyncRequest`] carries everything its backend call needs by value and
//! borrows nothing from the store or the gateway, so it can be sent from a
//! spawned task while the board keeps taking edits. The [`SyncResponse`] is
//! folded back in later with [`SyncGateway::apply`](super::SyncGateway::apply).

use super::backend::{BoardBackend, BoardSnapshot};
use crate::error::BackendError;
use crate::optimistic::UpdateId;
use crate::types::{BoardId, Column, ColumnDraft, ColumnId, LocalId, Task, TaskDraft, TaskId, TaskPatch};
use tracing::debug;

/// One call to send to the backend
#[derive(Debug, Clone, PartialEq)]
pub enum SyncRequest {
    /// Refetch the whole board (server wins)
    FetchBoard { board: BoardId },
    MoveTask {
        update: UpdateId,
        task: TaskId,
        column: ColumnId,
        position: usize,
    },
    /// Create the task that is `local` on this client
    CreateTask {
        update: UpdateId,
        local: LocalId,
        column: ColumnId,
        draft: TaskDraft,
    },
    CreateColumn {
        update: UpdateId,
        local: LocalId,
        board: BoardId,
        draft: ColumnDraft,
    },
    UpdateTask {
        update: UpdateId,
        task: TaskId,
        patch: TaskPatch,
    },
    DeleteTask { update: UpdateId, task: TaskId },
    /// Delete a server task whose local copy was removed before its create
    /// was confirmed
    DiscardTask { task: TaskId },
    /// Delete a server column whose local copy was removed before its create
    /// was confirmed
    DiscardColumn { column: ColumnId },
}

impl SyncRequest {
    /// The optimistic update this call persists, if any
    pub fn update(&self) -> Option<&UpdateId> {
        match self {
            Self::MoveTask { update, .. }
            | Self::CreateTask { update, .. }
            | Self::CreateColumn { update, .. }
            | Self::UpdateTask { update, .. }
            | Self::DeleteTask { update, .. } => Some(update),
            Self::FetchBoard { .. } | Self::DiscardTask { .. } | Self::DiscardColumn { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::FetchBoard { .. } => "fetch_board",
            Self::MoveTask { .. } => "move_task",
            Self::CreateTask { .. } => "create_task",
            Self::CreateColumn { .. } => "create_column",
            Self::UpdateTask { .. } => "update_task",
            Self::DeleteTask { .. } => "delete_task",
            Self::DiscardTask { .. } => "discard_task",
            Self::DiscardColumn { .. } => "discard_column",
        }
    }

    /// Issue the call. Only the backend is borrowed.
    pub async fn send<B: BoardBackend + ?Sized>(self, backend: &B) -> SyncResponse {
        debug!(request = self.name(), "sending");
        let result = match &self {
            Self::FetchBoard { board } => backend.fetch_board(board).await.map(SyncReply::Board),
            Self::MoveTask {
                task, column, position, ..
            } => backend.move_task(task, column, *position).await.map(SyncReply::Task),
            Self::CreateTask { column, draft, .. } => backend.create_task(column, draft).await.map(SyncReply::Task),
            Self::CreateColumn { board, draft, .. } => {
                backend.create_column(board, draft).await.map(SyncReply::Column)
            }
            Self::UpdateTask { task, patch, .. } => backend.update_task(task, patch).await.map(SyncReply::Task),
            Self::DeleteTask { task, .. } | Self::DiscardTask { task } => {
                backend.delete_task(task).await.map(|()| SyncReply::Done)
            }
            Self::DiscardColumn { column } => backend.delete_column(column).await.map(|()| SyncReply::Done),
        };
        SyncResponse { request: self, result }
    }
}

/// What the backend answered
#[derive(Debug, Clone, PartialEq)]
pub enum SyncReply {
    Board(BoardSnapshot),
    Task(Task),
    Column(Column),
    Done,
}

/// A sent request paired with its result
#[derive(Debug, Clone, PartialEq)]
pub struct SyncResponse {
    pub request: SyncRequest,
    pub result: Result<SyncReply, BackendError>,
}

impl SyncResponse {
    pub fn new(request: SyncRequest, result: Result<SyncReply, BackendError>) -> Self {
        Self { request, result }
    }
}
