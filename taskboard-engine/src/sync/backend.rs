//! The backend seam: anything that can persist board mutations

use crate::error::BackendError;
use crate::types::{Board, BoardId, Column, ColumnDraft, ColumnId, ColumnKey, Task, TaskDraft, TaskId, TaskPatch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything needed to (re)load a board into the store
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub board: Board,
    pub columns: Vec<Column>,
    pub tasks_by_column: HashMap<ColumnKey, Vec<Task>>,
}

/// Remote persistence for one board.
///
/// Implementations only ever see server identities: the gateway holds back
/// any call that would need a local one.
#[async_trait]
pub trait BoardBackend: Send + Sync {
    /// Fetch the board with its columns and tasks
    async fn fetch_board(&self, board: &BoardId) -> Result<BoardSnapshot, BackendError>;

    /// Place a task at `position` of `column`; returns the server's record
    async fn move_task(&self, task: &TaskId, column: &ColumnId, position: usize) -> Result<Task, BackendError>;

    async fn create_task(&self, column: &ColumnId, draft: &TaskDraft) -> Result<Task, BackendError>;

    async fn create_column(&self, board: &BoardId, draft: &ColumnDraft) -> Result<Column, BackendError>;

    async fn update_task(&self, task: &TaskId, patch: &TaskPatch) -> Result<Task, BackendError>;

    async fn delete_task(&self, task: &TaskId) -> Result<(), BackendError>;

    /// Remove a column; only used to discard a column whose local copy is gone
    async fn delete_column(&self, column: &ColumnId) -> Result<(), BackendError>;
}

#[async_trait]
impl<B: BoardBackend + ?Sized> BoardBackend for Arc<B> {
    async fn fetch_board(&self, board: &BoardId) -> Result<BoardSnapshot, BackendError> {
        (**self).fetch_board(board).await
    }

    async fn move_task(&self, task: &TaskId, column: &ColumnId, position: usize) -> Result<Task, BackendError> {
        (**self).move_task(task, column, position).await
    }

    async fn create_task(&self, column: &ColumnId, draft: &TaskDraft) -> Result<Task, BackendError> {
        (**self).create_task(column, draft).await
    }

    async fn create_column(&self, board: &BoardId, draft: &ColumnDraft) -> Result<Column, BackendError> {
        (**self).create_column(board, draft).await
    }

    async fn update_task(&self, task: &TaskId, patch: &TaskPatch) -> Result<Task, BackendError> {
        (**self).update_task(task, patch).await
    }

    async fn delete_task(&self, task: &TaskId) -> Result<(), BackendError> {
        (**self).delete_task(task).await
    }

    async fn delete_column(&self, column: &ColumnId) -> Result<(), BackendError> {
        (**self).delete_column(column).await
    }
}
