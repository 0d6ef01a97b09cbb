//! In-memory [`BoardBackend`] for tests
//!
//! Behaves like a well-mannered server: issues `srv-task-N` / `srv-col-N`
//! identities, keeps positions dense and records every call it receives.
//! Failures and placement disagreements can be scripted one call ahead, and
//! the next call can be held open until a test releases it.

use crate::error::BackendError;
use crate::sync::{BoardBackend, BoardSnapshot};
use crate::types::{
    Board, BoardId, Column, ColumnDraft, ColumnId, ColumnKey, Task, TaskDraft, TaskId, TaskKey, TaskPatch,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct State {
    board: Option<Board>,
    columns: Vec<Column>,
    tasks: HashMap<ColumnId, Vec<Task>>,
    next_id: u32,
    calls: Vec<String>,
    fail_next: Option<BackendError>,
    force_next_move: Option<(ColumnId, usize)>,
    hold: Option<Arc<Notify>>,
}

impl State {
    fn take_failure(&mut self) -> Result<(), BackendError> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("srv-{}-{}", prefix, self.next_id)
    }

    fn find_task(&self, task: &TaskId) -> Option<(ColumnId, usize)> {
        let key = TaskKey::Remote(task.clone());
        self.tasks.iter().find_map(|(column, list)| {
            list.iter()
                .position(|t| t.id == key)
                .map(|index| (column.clone(), index))
        })
    }

    fn relabel(&mut self, column: &ColumnId) {
        if let Some(list) = self.tasks.get_mut(column) {
            for (index, task) in list.iter_mut().enumerate() {
                task.position = index;
                task.column_id = ColumnKey::Remote(column.clone());
            }
        }
    }
}

/// Scriptable in-memory backend
#[derive(Debug)]
pub struct MemoryBackend {
    board_id: BoardId,
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new(board: impl Into<BoardId>) -> Self {
        let board_id = board.into();
        let state = State {
            board: Some(Board::new(board_id.clone(), "Board")),
            ..Default::default()
        };
        Self {
            board_id,
            state: Mutex::new(state),
        }
    }

    /// Add a column (name = id) at the end
    pub fn with_column(self, id: &str) -> Self {
        {
            let mut state = self.state();
            let position = state.columns.len();
            state
                .columns
                .push(Column::new(id, self.board_id.clone(), id).at(position));
            state.tasks.insert(ColumnId::from(id), Vec::new());
        }
        self
    }

    /// Append a task to an existing column
    pub fn with_task(self, id: &str, column: &str, title: &str) -> Self {
        {
            let mut state = self.state();
            let column_id = ColumnId::from(column);
            let list = state.tasks.entry(column_id.clone()).or_default();
            list.push(Task::new(id, column, title).at(list.len()));
            state.relabel(&column_id);
        }
        self
    }

    /// Every call received so far, e.g. `"move_task t1 B 0"`
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Fail the next call with `err`
    pub fn fail_next(&self, err: BackendError) {
        self.state().fail_next = Some(err);
    }

    /// Report the next move as landing at `column`/`position` regardless of
    /// what was asked
    pub fn force_next_move(&self, column: &str, position: usize) {
        self.state().force_next_move = Some((ColumnId::from(column), position));
    }

    /// Hold the next call open until the returned gate is notified
    pub fn hold_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().hold = Some(Arc::clone(&gate));
        gate
    }

    /// Task ids of a column in server order
    pub fn task_ids(&self, column: &str) -> Vec<String> {
        self.state()
            .tasks
            .get(&ColumnId::from(column))
            .map(|list| list.iter().map(|t| t.id.to_string()).collect())
            .unwrap_or_default()
    }

    /// Column ids in server order
    pub fn column_ids(&self) -> Vec<String> {
        self.state().columns.iter().map(|c| c.id.to_string()).collect()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn wait_for_release(&self) {
        let gate = self.state().hold.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn call(&self, call: String) -> MutexGuard<'_, State> {
        let mut state = self.state();
        state.calls.push(call);
        state
    }

    fn snapshot(&self, board: &BoardId) -> Result<BoardSnapshot, BackendError> {
        let mut state = self.call(format!("fetch_board {}", board));
        state.take_failure()?;
        if board != &self.board_id {
            return Err(BackendError::not_found("board", board));
        }
        let mut snapshot_board = state
            .board
            .clone()
            .unwrap_or_else(|| Board::new(board.clone(), "Board"));
        snapshot_board.columns = state.columns.iter().map(|c| c.id.clone()).collect();
        let tasks_by_column = state
            .tasks
            .iter()
            .map(|(column, list)| (ColumnKey::Remote(column.clone()), list.clone()))
            .collect();
        Ok(BoardSnapshot {
            board: snapshot_board,
            columns: state.columns.clone(),
            tasks_by_column,
        })
    }

    fn apply_move(&self, task: &TaskId, column: &ColumnId, position: usize) -> Result<Task, BackendError> {
        let mut state = self.call(format!("move_task {} {} {}", task, column, position));
        state.take_failure()?;
        if !state.tasks.contains_key(column) {
            return Err(BackendError::not_found("column", column));
        }
        let (from, index) = state
            .find_task(task)
            .ok_or_else(|| BackendError::not_found("task", task))?;
        let moving = state
            .tasks
            .get_mut(&from)
            .map(|list| list.remove(index))
            .ok_or_else(|| BackendError::not_found("column", &from))?;
        let dest = state.tasks.entry(column.clone()).or_default();
        let at = position.min(dest.len());
        dest.insert(at, moving);
        state.relabel(&from);
        state.relabel(column);

        let mut record = state.tasks[column][at].clone();
        if let Some((forced_column, forced_position)) = state.force_next_move.take() {
            record.column_id = ColumnKey::Remote(forced_column);
            record.position = forced_position;
        }
        Ok(record)
    }

    fn apply_create_task(&self, column: &ColumnId, draft: &TaskDraft) -> Result<Task, BackendError> {
        let mut state = self.call(format!("create_task {}", column));
        state.take_failure()?;
        if !state.tasks.contains_key(column) {
            return Err(BackendError::not_found("column", column));
        }
        let id = state.next_id("task");
        let list = state.tasks.entry(column.clone()).or_default();
        let task = Task::from_draft(
            TaskKey::Remote(TaskId::from(id)),
            ColumnKey::Remote(column.clone()),
            list.len(),
            draft,
        );
        list.push(task.clone());
        Ok(task)
    }

    fn apply_create_column(&self, board: &BoardId, draft: &ColumnDraft) -> Result<Column, BackendError> {
        let mut state = self.call(format!("create_column {}", board));
        state.take_failure()?;
        let id = ColumnId::from(state.next_id("col"));
        let column = Column::from_draft(
            ColumnKey::Remote(id.clone()),
            board.clone(),
            state.columns.len(),
            draft,
        );
        state.columns.push(column.clone());
        state.tasks.insert(id, Vec::new());
        Ok(column)
    }

    fn apply_update(&self, task: &TaskId, patch: &TaskPatch) -> Result<Task, BackendError> {
        let mut state = self.call(format!("update_task {}", task));
        state.take_failure()?;
        let (column, index) = state
            .find_task(task)
            .ok_or_else(|| BackendError::not_found("task", task))?;
        let slot = state
            .tasks
            .get_mut(&column)
            .and_then(|list| list.get_mut(index))
            .ok_or_else(|| BackendError::not_found("task", task))?;
        patch.apply(slot);
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    fn apply_delete(&self, task: &TaskId) -> Result<(), BackendError> {
        let mut state = self.call(format!("delete_task {}", task));
        state.take_failure()?;
        let (column, index) = state
            .find_task(task)
            .ok_or_else(|| BackendError::not_found("task", task))?;
        if let Some(list) = state.tasks.get_mut(&column) {
            list.remove(index);
        }
        state.relabel(&column);
        Ok(())
    }

    fn apply_delete_column(&self, column: &ColumnId) -> Result<(), BackendError> {
        let mut state = self.call(format!("delete_column {}", column));
        state.take_failure()?;
        let key = ColumnKey::Remote(column.clone());
        let before = state.columns.len();
        state.columns.retain(|c| c.id != key);
        if state.columns.len() == before {
            return Err(BackendError::not_found("column", column));
        }
        state.tasks.remove(column);
        Ok(())
    }
}

#[async_trait]
impl BoardBackend for MemoryBackend {
    async fn fetch_board(&self, board: &BoardId) -> Result<BoardSnapshot, BackendError> {
        self.wait_for_release().await;
        self.snapshot(board)
    }

    async fn move_task(&self, task: &TaskId, column: &ColumnId, position: usize) -> Result<Task, BackendError> {
        self.wait_for_release().await;
        self.apply_move(task, column, position)
    }

    async fn create_task(&self, column: &ColumnId, draft: &TaskDraft) -> Result<Task, BackendError> {
        self.wait_for_release().await;
        self.apply_create_task(column, draft)
    }

    async fn create_column(&self, board: &BoardId, draft: &ColumnDraft) -> Result<Column, BackendError> {
        self.wait_for_release().await;
        self.apply_create_column(board, draft)
    }

    async fn update_task(&self, task: &TaskId, patch: &TaskPatch) -> Result<Task, BackendError> {
        self.wait_for_release().await;
        self.apply_update(task, patch)
    }

    async fn delete_task(&self, task: &TaskId) -> Result<(), BackendError> {
        self.wait_for_release().await;
        self.apply_delete(task)
    }

    async fn delete_column(&self, column: &ColumnId) -> Result<(), BackendError> {
        self.wait_for_release().await;
        self.apply_delete_column(column)
    }
}
