//! BoardStateStore - canonical in-memory state of one board
//!
//! The store owns every positional invariant. Array order is the single
//! source of truth: each mutation edits the column/task arrays and then
//! re-derives `position` (and a task's `column_id`) from where the entity
//! sits. Nothing else writes those fields.
//!
//! All operations are synchronous and run to completion. Network work lives
//! in [`SyncGateway`](crate::sync::SyncGateway) and never blocks the store.

use crate::error::{BoardError, Result};
use crate::types::{
    Board, Column, ColumnDraft, ColumnKey, ColumnPatch, LocalId, Task, TaskDraft,
    TaskFilter, TaskKey, TaskPatch, ViewMode,
};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Where a task was and where it ended up after a move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReceipt {
    pub task: TaskKey,
    pub from_column: ColumnKey,
    pub from_index: usize,
    pub to_column: ColumnKey,
    pub to_index: usize,
}

impl MoveReceipt {
    /// Whether the task ended where it started
    pub fn is_noop(&self) -> bool {
        self.from_column == self.to_column && self.from_index == self.to_index
    }
}

/// What `delete_column` removed and where its tasks went
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRemoval {
    pub column: Column,
    /// Former left-to-right index of the column
    pub index: usize,
    /// Column that received the deleted column's tasks
    pub fallback: Option<ColumnKey>,
    /// Tasks relocated to the fallback column, in their original order
    pub relocated: Vec<TaskKey>,
}

/// In-memory state of one board.
///
/// Create one per board screen (or test). `load_board` replaces the state
/// wholesale and `reset` returns to the empty store.
#[derive(Debug, Default)]
pub struct BoardStateStore {
    board: Option<Board>,
    columns: Vec<Column>,
    tasks: HashMap<ColumnKey, Vec<Task>>,
    selected: Option<TaskKey>,
}

impl BoardStateStore {
    /// Create an empty store with no board loaded
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Replace the whole state with a freshly fetched board.
    ///
    /// Input is coerced rather than rejected: columns and tasks are stably
    /// sorted by their incoming `position` and relabeled densely, tasks get
    /// `column_id` set to the column they are filed under, tasks filed under
    /// an unknown column are dropped and a task key seen twice keeps its first
    /// occurrence.
    pub fn load_board(
        &mut self,
        mut board: Board,
        mut columns: Vec<Column>,
        mut tasks_by_column: HashMap<ColumnKey, Vec<Task>>,
    ) {
        columns.sort_by_key(|c| c.position);
        let mut seen_columns = HashSet::new();
        columns.retain(|c| {
            let fresh = seen_columns.insert(c.id.clone());
            if !fresh {
                warn!(column = %c.id, "dropping duplicate column on load");
            }
            fresh
        });
        for column in columns.iter_mut() {
            column.board_id = board.id.clone();
        }
        relabel_columns(&mut columns);

        let mut tasks = HashMap::with_capacity(columns.len());
        let mut seen_tasks = HashSet::new();
        for column in &columns {
            let mut list = tasks_by_column.remove(&column.id).unwrap_or_default();
            list.sort_by_key(|t| t.position);
            list.retain(|t| {
                let fresh = seen_tasks.insert(t.id.clone());
                if !fresh {
                    warn!(task = %t.id, column = %column.id, "dropping duplicate task on load");
                }
                fresh
            });
            relabel_tasks(&mut list, &column.id);
            tasks.insert(column.id.clone(), list);
        }
        for (column, orphans) in tasks_by_column {
            if !orphans.is_empty() {
                warn!(column = %column, count = orphans.len(), "dropping tasks filed under an unknown column");
            }
        }

        board.columns = columns.iter().map(|c| c.id.clone()).collect();
        info!(
            board = %board.id,
            columns = columns.len(),
            tasks = seen_tasks.len(),
            "board loaded"
        );

        self.board = Some(board);
        self.columns = columns;
        self.tasks = tasks;
        if let Some(selected) = self.selected.take() {
            if seen_tasks.contains(&selected) {
                self.selected = Some(selected);
            }
        }
    }

    /// Drop all state
    pub fn reset(&mut self) {
        debug!("board store reset");
        *self = Self::default();
    }

    pub fn is_loaded(&self) -> bool {
        self.board.is_some()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    /// Columns in left-to-right order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == key)
    }

    /// Tasks of a column in top-to-bottom order (empty for unknown columns)
    pub fn tasks(&self, column: &ColumnKey) -> &[Task] {
        self.tasks.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn task(&self, key: &TaskKey) -> Option<&Task> {
        self.locate(key)
            .and_then(|(column, index)| self.tasks.get(&column).and_then(|l| l.get(index)))
    }

    /// Column and index currently holding `key`
    pub fn locate(&self, key: &TaskKey) -> Option<(ColumnKey, usize)> {
        self.columns.iter().find_map(|column| {
            self.tasks
                .get(&column.id)
                .and_then(|list| list.iter().position(|t| &t.id == key))
                .map(|index| (column.id.clone(), index))
        })
    }

    /// Total number of tasks on the board
    pub fn task_count(&self) -> usize {
        self.tasks.values().map(Vec::len).sum()
    }

    /// Tasks of a column that pass the board filter, in position order
    pub fn visible_tasks(&self, column: &ColumnKey) -> Vec<&Task> {
        let filter = self.board.as_ref().and_then(|b| b.filter.as_ref());
        self.tasks(column)
            .iter()
            .filter(|t| filter.is_none_or(|f| f.matches(t)))
            .collect()
    }

    /// The task shown in the detail view, read live so moves and edits are
    /// always reflected
    pub fn selected_task(&self) -> Option<&Task> {
        self.selected.as_ref().and_then(|key| self.task(key))
    }

    pub fn selected_key(&self) -> Option<&TaskKey> {
        self.selected.as_ref()
    }

    pub fn select_task(&mut self, key: &TaskKey) -> Result<()> {
        if self.locate(key).is_none() {
            return Err(BoardError::task_not_found(key));
        }
        self.selected = Some(key.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // =========================================================================
    // Board settings
    // =========================================================================

    pub fn set_view_mode(&mut self, view_mode: ViewMode) -> Result<()> {
        self.board_mut()?.view_mode = view_mode;
        Ok(())
    }

    pub fn set_filter(&mut self, filter: Option<TaskFilter>) -> Result<()> {
        self.board_mut()?.filter = filter;
        Ok(())
    }

    // =========================================================================
    // Task mutations
    // =========================================================================

    /// Move a task to `target_index` of `target`, clamped to
    /// `[0, target length]`. Same source and target is a pure reorder.
    pub fn move_task(
        &mut self,
        task: &TaskKey,
        source: &ColumnKey,
        target: &ColumnKey,
        target_index: usize,
    ) -> Result<MoveReceipt> {
        if !self.tasks.contains_key(source) {
            return Err(BoardError::column_not_found(source));
        }
        if !self.tasks.contains_key(target) {
            return Err(BoardError::column_not_found(target));
        }

        let (from_index, to_index) = if source == target {
            let Some(list) = self.tasks.get_mut(source) else {
                return Err(BoardError::column_not_found(source));
            };
            let from_index = index_of(list, task, source)?;
            let moving = list.remove(from_index);
            let to_index = target_index.min(list.len());
            list.insert(to_index, moving);
            relabel_tasks(list, source);
            (from_index, to_index)
        } else {
            let [Some(src), Some(dst)] = self.tasks.get_disjoint_mut([source, target]) else {
                return Err(BoardError::column_not_found(target));
            };
            let from_index = index_of(src, task, source)?;
            let moving = src.remove(from_index);
            let to_index = target_index.min(dst.len());
            dst.insert(to_index, moving);
            relabel_tasks(src, source);
            relabel_tasks(dst, target);
            (from_index, to_index)
        };

        if target_index != to_index {
            debug!(task = %task, requested = target_index, clamped = to_index, "clamped move target index");
        }
        debug!(task = %task, from = %source, to = %target, from_index, to_index, "task moved");

        Ok(MoveReceipt {
            task: task.clone(),
            from_column: source.clone(),
            from_index,
            to_column: target.clone(),
            to_index,
        })
    }

    /// Move the task at `from_index` of `column` to `to_index` of the same
    /// column. `to_index` is clamped; `from_index` must address a task.
    pub fn reorder_within_column(
        &mut self,
        column: &ColumnKey,
        from_index: usize,
        to_index: usize,
    ) -> Result<MoveReceipt> {
        let list = self
            .tasks
            .get(column)
            .ok_or_else(|| BoardError::column_not_found(column))?;
        let task = list
            .get(from_index)
            .map(|t| t.id.clone())
            .ok_or_else(|| BoardError::IndexOutOfRange {
                column: column.to_string(),
                index: from_index,
                len: list.len(),
            })?;
        self.move_task(&task, column, column, to_index)
    }

    /// Append a task built from `draft` with a fresh local identity
    pub fn add_task(&mut self, column: &ColumnKey, draft: &TaskDraft) -> Result<Task> {
        let list = self
            .tasks
            .get_mut(column)
            .ok_or_else(|| BoardError::column_not_found(column))?;
        let task = Task::from_draft(TaskKey::local(), column.clone(), list.len(), draft);
        list.push(task.clone());
        relabel_tasks(list, column);
        debug!(task = %task.id, column = %column, position = task.position, "task added");
        Ok(task)
    }

    /// Merge `patch` into a task and touch `updated_at`. Returns the task as
    /// it was before the merge.
    pub fn update_task(&mut self, task: &TaskKey, column: &ColumnKey, patch: &TaskPatch) -> Result<Task> {
        let list = self
            .tasks
            .get_mut(column)
            .ok_or_else(|| BoardError::column_not_found(column))?;
        let index = index_of(list, task, column)?;
        let slot = &mut list[index];
        let previous = slot.clone();
        patch.apply(slot);
        slot.updated_at = Utc::now();
        debug!(task = %task, "task updated");
        Ok(previous)
    }

    /// Remove a task. Returns the removed task and the index it held.
    pub fn delete_task(&mut self, task: &TaskKey, column: &ColumnKey) -> Result<(Task, usize)> {
        let list = self
            .tasks
            .get_mut(column)
            .ok_or_else(|| BoardError::column_not_found(column))?;
        let index = index_of(list, task, column)?;
        let removed = list.remove(index);
        relabel_tasks(list, column);
        if self.selected.as_ref() == Some(task) {
            self.selected = None;
        }
        debug!(task = %task, column = %column, index, "task deleted");
        Ok((removed, index))
    }

    /// Put a previously removed task back at `index` (clamped). Used to
    /// compensate a failed delete.
    pub fn reinsert_task(&mut self, column: &ColumnKey, index: usize, mut task: Task) -> Result<usize> {
        if self.locate(&task.id).is_some() {
            return Err(BoardError::duplicate_id("task", &task.id));
        }
        let list = self
            .tasks
            .get_mut(column)
            .ok_or_else(|| BoardError::column_not_found(column))?;
        let index = index.min(list.len());
        task.column_id = column.clone();
        list.insert(index, task);
        relabel_tasks(list, column);
        Ok(index)
    }

    /// Restore every mutable field of a task from `snapshot`, including
    /// `updated_at`. Column and position stay where the task currently is.
    pub fn restore_task_fields(&mut self, snapshot: &Task) -> Result<()> {
        let (column, index) = self
            .locate(&snapshot.id)
            .ok_or_else(|| BoardError::task_not_found(&snapshot.id))?;
        if let Some(slot) = self.tasks.get_mut(&column).and_then(|l| l.get_mut(index)) {
            TaskPatch::snapshot(snapshot).apply(slot);
            slot.updated_at = snapshot.updated_at;
        }
        Ok(())
    }

    /// Swap a local task identity for the backend's record.
    ///
    /// The authoritative record replaces the local one wholesale except for
    /// column and position, which stay where the user has the task now. The
    /// selection follows the new identity.
    pub fn replace_task_identity(&mut self, local: LocalId, authoritative: Task) -> Result<TaskKey> {
        let old = TaskKey::Local(local);
        let new = authoritative.id.clone();
        if new.is_local() {
            return Err(BoardError::invalid_value(
                "task.id",
                "authoritative record must carry a server identity",
            ));
        }
        if self.locate(&new).is_some() {
            return Err(BoardError::duplicate_id("task", &new));
        }
        let (column, index) = self.locate(&old).ok_or_else(|| BoardError::task_not_found(&old))?;
        if let Some(slot) = self.tasks.get_mut(&column).and_then(|l| l.get_mut(index)) {
            let mut merged = authoritative;
            merged.column_id = slot.column_id.clone();
            merged.position = slot.position;
            *slot = merged;
        }
        if self.selected.as_ref() == Some(&old) {
            self.selected = Some(new.clone());
        }
        info!(local = %old, remote = %new, "task identity confirmed");
        Ok(new)
    }

    // =========================================================================
    // Column mutations
    // =========================================================================

    /// Append a column built from `draft` with a fresh local identity
    pub fn add_column(&mut self, draft: &ColumnDraft) -> Result<Column> {
        let board_id = self.board.as_ref().ok_or(BoardError::NotLoaded)?.id.clone();
        let column = Column::from_draft(ColumnKey::local(), board_id, self.columns.len(), draft);
        self.tasks.insert(column.id.clone(), Vec::new());
        self.columns.push(column.clone());
        self.sync_column_order();
        debug!(column = %column.id, position = column.position, "column added");
        Ok(column)
    }

    /// Merge `patch` into a column. Returns the column as it was before.
    pub fn update_column(&mut self, column: &ColumnKey, patch: &ColumnPatch) -> Result<Column> {
        let slot = self
            .columns
            .iter_mut()
            .find(|c| &c.id == column)
            .ok_or_else(|| BoardError::column_not_found(column))?;
        let previous = slot.clone();
        patch.apply(slot);
        debug!(column = %column, "column updated");
        Ok(previous)
    }

    /// Move a column to `to_index` (clamped). Returns `(from, to)`.
    pub fn move_column(&mut self, column: &ColumnKey, to_index: usize) -> Result<(usize, usize)> {
        let from = self
            .columns
            .iter()
            .position(|c| &c.id == column)
            .ok_or_else(|| BoardError::column_not_found(column))?;
        let moving = self.columns.remove(from);
        let to = to_index.min(self.columns.len());
        self.columns.insert(to, moving);
        self.sync_column_order();
        debug!(column = %column, from, to, "column moved");
        Ok((from, to))
    }

    /// Delete a column.
    ///
    /// Its tasks are never dropped: they are appended, in order, to the
    /// fallback column (the first remaining column). Deleting the last column
    /// while it still holds tasks fails with `ColumnNotEmpty`.
    pub fn delete_column(&mut self, column: &ColumnKey) -> Result<ColumnRemoval> {
        let index = self
            .columns
            .iter()
            .position(|c| &c.id == column)
            .ok_or_else(|| BoardError::column_not_found(column))?;
        let count = self.tasks(column).len();
        if self.columns.len() == 1 && count > 0 {
            return Err(BoardError::ColumnNotEmpty {
                id: column.to_string(),
                count,
            });
        }

        let removed = self.columns.remove(index);
        let orphans = self.tasks.remove(column).unwrap_or_default();
        self.sync_column_order();

        let fallback = self.columns.first().map(|c| c.id.clone());
        let mut relocated = Vec::with_capacity(orphans.len());
        if let Some(fallback_key) = &fallback {
            if let Some(dest) = self.tasks.get_mut(fallback_key) {
                relocated.extend(orphans.iter().map(|t| t.id.clone()));
                dest.extend(orphans);
                relabel_tasks(dest, fallback_key);
            }
        }

        info!(
            column = %column,
            relocated = relocated.len(),
            fallback = ?fallback.as_ref().map(ToString::to_string),
            "column deleted"
        );
        Ok(ColumnRemoval {
            column: removed,
            index,
            fallback,
            relocated,
        })
    }

    /// Swap a local column identity for the backend's record everywhere it
    /// appears: column list, board order, task map and each task's column.
    pub fn replace_column_identity(&mut self, local: LocalId, authoritative: Column) -> Result<ColumnKey> {
        let old = ColumnKey::Local(local);
        let new = authoritative.id.clone();
        if new.is_local() {
            return Err(BoardError::invalid_value(
                "column.id",
                "authoritative record must carry a server identity",
            ));
        }
        if self.tasks.contains_key(&new) {
            return Err(BoardError::duplicate_id("column", &new));
        }
        let slot = self
            .columns
            .iter_mut()
            .find(|c| c.id == old)
            .ok_or_else(|| BoardError::column_not_found(&old))?;
        let position = slot.position;
        let board_id = slot.board_id.clone();
        *slot = authoritative;
        slot.position = position;
        slot.board_id = board_id;

        let mut list = self.tasks.remove(&old).unwrap_or_default();
        relabel_tasks(&mut list, &new);
        self.tasks.insert(new.clone(), list);
        self.sync_column_order();
        info!(local = %old, remote = %new, "column identity confirmed");
        Ok(new)
    }

    // =========================================================================
    // Invariants
    // =========================================================================

    /// Verify every positional invariant. Intended for tests and debugging.
    pub fn check_invariants(&self) -> Result<()> {
        if self.tasks.len() != self.columns.len() {
            return Err(BoardError::invariant(format!(
                "{} task lists for {} columns",
                self.tasks.len(),
                self.columns.len()
            )));
        }
        let mut seen = HashSet::new();
        for (index, column) in self.columns.iter().enumerate() {
            if column.position != index {
                return Err(BoardError::invariant(format!(
                    "column {} has position {} at index {}",
                    column.id, column.position, index
                )));
            }
            let list = self
                .tasks
                .get(&column.id)
                .ok_or_else(|| BoardError::invariant(format!("column {} has no task list", column.id)))?;
            for (index, task) in list.iter().enumerate() {
                if task.position != index {
                    return Err(BoardError::invariant(format!(
                        "task {} has position {} at index {}",
                        task.id, task.position, index
                    )));
                }
                if task.column_id != column.id {
                    return Err(BoardError::invariant(format!(
                        "task {} claims column {} but sits in {}",
                        task.id, task.column_id, column.id
                    )));
                }
                if !seen.insert(task.id.clone()) {
                    return Err(BoardError::invariant(format!("task {} appears twice", task.id)));
                }
            }
        }
        if let Some(board) = &self.board {
            let order: Vec<&ColumnKey> = self.columns.iter().map(|c| &c.id).collect();
            if board.columns.iter().collect::<Vec<_>>() != order {
                return Err(BoardError::invariant("board column order out of sync"));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn board_mut(&mut self) -> Result<&mut Board> {
        self.board.as_mut().ok_or(BoardError::NotLoaded)
    }

    /// Relabel column positions and mirror the order onto the board
    fn sync_column_order(&mut self) {
        relabel_columns(&mut self.columns);
        if let Some(board) = self.board.as_mut() {
            board.columns = self.columns.iter().map(|c| c.id.clone()).collect();
        }
    }
}

fn index_of(list: &[Task], task: &TaskKey, column: &ColumnKey) -> Result<usize> {
    list.iter()
        .position(|t| &t.id == task)
        .ok_or_else(|| BoardError::task_not_in_column(task, column))
}

fn relabel_tasks(list: &mut [Task], column: &ColumnKey) {
    for (index, task) in list.iter_mut().enumerate() {
        task.position = index;
        if &task.column_id != column {
            task.column_id = column.clone();
        }
    }
}

fn relabel_columns(columns: &mut [Column]) {
    for (index, column) in columns.iter_mut().enumerate() {
        column.position = index;
    }
}

/// Convenience for building `load_board` input from a flat task list
pub fn group_by_column(tasks: impl IntoIterator<Item = Task>) -> HashMap<ColumnKey, Vec<Task>> {
    let mut grouped: HashMap<ColumnKey, Vec<Task>> = HashMap::new();
    for task in tasks {
        grouped.entry(task.column_id.clone()).or_default().push(task);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TaskPriority, TaskStatus};

    fn col(id: &str) -> ColumnKey {
        ColumnKey::from(id)
    }

    fn key(id: &str) -> TaskKey {
        TaskKey::from(id)
    }

    /// Board with columns `A:[t1,t2]` and `B:[]`
    fn two_column_store() -> BoardStateStore {
        let mut store = BoardStateStore::new();
        store.load_board(
            Board::new("b1", "Test"),
            vec![Column::new("A", "b1", "A").at(0), Column::new("B", "b1", "B").at(1)],
            group_by_column(vec![
                Task::new("t1", "A", "one").at(0),
                Task::new("t2", "A", "two").at(1),
            ]),
        );
        store
    }

    fn ids(store: &BoardStateStore, column: &str) -> Vec<String> {
        store.tasks(&col(column)).iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn test_load_board_normalizes_gaps() {
        let mut store = BoardStateStore::new();
        store.load_board(
            Board::new("b1", "Test"),
            vec![Column::new("B", "b1", "B").at(7), Column::new("A", "b1", "A").at(3)],
            group_by_column(vec![
                Task::new("t2", "A", "two").at(10),
                Task::new("t1", "A", "one").at(4),
                Task::new("t3", "B", "three").at(99),
            ]),
        );

        assert_eq!(store.columns()[0].id, col("A"));
        assert_eq!(store.columns()[0].position, 0);
        assert_eq!(store.columns()[1].position, 1);
        assert_eq!(ids(&store, "A"), vec!["t1", "t2"]);
        assert_eq!(store.tasks(&col("B"))[0].position, 0);
        assert_eq!(store.board().unwrap().columns, vec![col("A"), col("B")]);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_load_board_coerces_malformed_input() {
        let mut store = BoardStateStore::new();
        let mut tasks = HashMap::new();
        // t1 claims column B but is filed under A; t1 also appears in B
        tasks.insert(col("A"), vec![Task::new("t1", "B", "one")]);
        tasks.insert(col("B"), vec![Task::new("t1", "B", "dup"), Task::new("t2", "B", "two")]);
        tasks.insert(col("ghost"), vec![Task::new("t9", "ghost", "lost")]);
        store.load_board(
            Board::new("b1", "Test"),
            vec![Column::new("A", "b1", "A").at(0), Column::new("B", "b1", "B").at(1)],
            tasks,
        );

        assert_eq!(store.task(&key("t1")).unwrap().column_id, col("A"));
        assert_eq!(ids(&store, "B"), vec!["t2"]);
        assert!(store.task(&key("t9")).is_none());
        assert_eq!(store.task_count(), 2);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_move_across_columns() {
        let mut store = two_column_store();
        let receipt = store.move_task(&key("t1"), &col("A"), &col("B"), 0).unwrap();

        assert_eq!(receipt.from_index, 0);
        assert_eq!(receipt.to_index, 0);
        assert_eq!(ids(&store, "A"), vec!["t2"]);
        assert_eq!(ids(&store, "B"), vec!["t1"]);
        assert_eq!(store.task(&key("t2")).unwrap().position, 0);
        let moved = store.task(&key("t1")).unwrap();
        assert_eq!(moved.position, 0);
        assert_eq!(moved.column_id, col("B"));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_move_clamps_target_index() {
        let mut store = two_column_store();
        let receipt = store.move_task(&key("t1"), &col("A"), &col("B"), 42).unwrap();
        assert_eq!(receipt.to_index, 0);

        let receipt = store.move_task(&key("t2"), &col("A"), &col("B"), 42).unwrap();
        assert_eq!(receipt.to_index, 1);
        assert_eq!(ids(&store, "B"), vec!["t1", "t2"]);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_move_to_same_slot_is_noop() {
        let mut store = two_column_store();
        let before: Vec<Task> = store.tasks(&col("A")).to_vec();
        let receipt = store.move_task(&key("t2"), &col("A"), &col("A"), 1).unwrap();
        assert!(receipt.is_noop());
        assert_eq!(store.tasks(&col("A")), before.as_slice());
    }

    #[test]
    fn test_move_and_back_restores_order() {
        let mut store = two_column_store();
        let a_before = ids(&store, "A");
        let receipt = store.move_task(&key("t1"), &col("A"), &col("B"), 0).unwrap();
        store
            .move_task(&key("t1"), &col("B"), &col("A"), receipt.from_index)
            .unwrap();
        assert_eq!(ids(&store, "A"), a_before);
        assert!(ids(&store, "B").is_empty());
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_move_errors() {
        let mut store = two_column_store();
        assert!(matches!(
            store.move_task(&key("t1"), &col("B"), &col("A"), 0),
            Err(BoardError::TaskNotFound { .. })
        ));
        assert!(matches!(
            store.move_task(&key("t1"), &col("A"), &col("Z"), 0),
            Err(BoardError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            store.move_task(&key("nope"), &col("A"), &col("A"), 0),
            Err(BoardError::TaskNotFound { .. })
        ));
        // Nothing was lost on the failed calls
        assert_eq!(ids(&store, "A"), vec!["t1", "t2"]);
    }

    #[test]
    fn test_reorder_within_column() {
        let mut store = two_column_store();
        store.reorder_within_column(&col("A"), 0, 1).unwrap();
        assert_eq!(ids(&store, "A"), vec!["t2", "t1"]);

        assert!(matches!(
            store.reorder_within_column(&col("A"), 5, 0),
            Err(BoardError::IndexOutOfRange { index: 5, len: 2, .. })
        ));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_add_task_assigns_local_identity() {
        let mut store = two_column_store();
        let task = store.add_task(&col("A"), &TaskDraft::new("x")).unwrap();
        assert!(task.id.is_local());
        assert_eq!(task.position, 2);
        assert_eq!(store.tasks(&col("A"))[2].id, task.id);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_add_then_delete_leaves_column_unchanged() {
        let mut store = two_column_store();
        let before: Vec<Task> = store.tasks(&col("A")).to_vec();
        let task = store.add_task(&col("A"), &TaskDraft::new("x")).unwrap();
        store.delete_task(&task.id, &col("A")).unwrap();
        assert_eq!(store.tasks(&col("A")), before.as_slice());
    }

    #[test]
    fn test_update_task_merges_fields() {
        let mut store = two_column_store();
        let before = store.task(&key("t1")).unwrap().updated_at;
        let previous = store
            .update_task(
                &key("t1"),
                &col("A"),
                &TaskPatch::new()
                    .with_title("renamed")
                    .with_priority(TaskPriority::Urgent),
            )
            .unwrap();

        assert_eq!(previous.title, "one");
        let task = store.task(&key("t1")).unwrap();
        assert_eq!(task.title, "renamed");
        assert_eq!(task.priority, TaskPriority::Urgent);
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.position, 0);
        assert!(task.updated_at >= before);
    }

    #[test]
    fn test_delete_task_clears_selection() {
        let mut store = two_column_store();
        store.select_task(&key("t1")).unwrap();
        let (removed, index) = store.delete_task(&key("t1"), &col("A")).unwrap();
        assert_eq!(removed.title, "one");
        assert_eq!(index, 0);
        assert!(store.selected_task().is_none());
        assert_eq!(store.task(&key("t2")).unwrap().position, 0);
    }

    #[test]
    fn test_selection_follows_moves() {
        let mut store = two_column_store();
        store.select_task(&key("t2")).unwrap();
        store.move_task(&key("t2"), &col("A"), &col("B"), 0).unwrap();
        let selected = store.selected_task().unwrap();
        assert_eq!(selected.column_id, col("B"));
        assert_eq!(selected.position, 0);
    }

    #[test]
    fn test_reinsert_task_restores_position() {
        let mut store = two_column_store();
        let (removed, index) = store.delete_task(&key("t1"), &col("A")).unwrap();
        store.reinsert_task(&col("A"), index, removed).unwrap();
        assert_eq!(ids(&store, "A"), vec!["t1", "t2"]);

        let copy = store.task(&key("t1")).unwrap().clone();
        assert!(matches!(
            store.reinsert_task(&col("B"), 0, copy),
            Err(BoardError::DuplicateId { .. })
        ));
    }

    #[test]
    fn test_replace_task_identity_swaps_everything() {
        let mut store = two_column_store();
        let temp = store.add_task(&col("A"), &TaskDraft::new("x")).unwrap();
        store.select_task(&temp.id).unwrap();
        let local = temp.id.as_local().unwrap();

        let server = Task::new("srv1", "A", "x").at(0);
        let new = store.replace_task_identity(local, server).unwrap();

        assert_eq!(new, key("srv1"));
        assert_eq!(ids(&store, "A"), vec!["t1", "t2", "srv1"]);
        assert_eq!(store.task(&new).unwrap().position, 2);
        assert!(store.task(&temp.id).is_none());
        assert_eq!(store.selected_key(), Some(&new));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_replace_task_identity_rejects_local_record() {
        let mut store = two_column_store();
        let temp = store.add_task(&col("A"), &TaskDraft::new("x")).unwrap();
        let bogus = Task::new(TaskKey::local(), col("A"), "x");
        assert!(matches!(
            store.replace_task_identity(temp.id.as_local().unwrap(), bogus),
            Err(BoardError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_add_and_move_column() {
        let mut store = two_column_store();
        let column = store.add_column(&ColumnDraft::new("C")).unwrap();
        assert!(column.id.is_local());
        assert_eq!(column.position, 2);
        assert!(store.tasks(&column.id).is_empty());

        let (from, to) = store.move_column(&column.id, 0).unwrap();
        assert_eq!((from, to), (2, 0));
        assert_eq!(store.columns()[0].id, column.id);
        assert_eq!(store.board().unwrap().columns[0], column.id);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_add_column_requires_board() {
        let mut store = BoardStateStore::new();
        assert_eq!(
            store.add_column(&ColumnDraft::new("C")),
            Err(BoardError::NotLoaded)
        );
    }

    #[test]
    fn test_update_column() {
        let mut store = two_column_store();
        let previous = store
            .update_column(&col("B"), &ColumnPatch::new().with_name("Done").with_wip_limit(Some(3)))
            .unwrap();
        assert_eq!(previous.name, "B");
        let column = store.column(&col("B")).unwrap();
        assert_eq!(column.name, "Done");
        assert_eq!(column.wip_limit, Some(3));
        assert_eq!(column.position, 1);
    }

    #[test]
    fn test_delete_column_relocates_tasks_to_fallback() {
        let mut store = two_column_store();
        store.move_task(&key("t1"), &col("A"), &col("B"), 0).unwrap();
        store.move_task(&key("t2"), &col("A"), &col("B"), 1).unwrap();
        store.add_task(&col("A"), &TaskDraft::new("stays")).unwrap();

        let removal = store.delete_column(&col("B")).unwrap();

        assert_eq!(removal.fallback, Some(col("A")));
        assert_eq!(removal.relocated, vec![key("t1"), key("t2")]);
        assert_eq!(store.board().unwrap().columns, vec![col("A")]);
        let titles: Vec<&str> = store.tasks(&col("A")).iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["stays", "one", "two"]);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_delete_last_column_with_tasks_is_refused() {
        let mut store = two_column_store();
        store.delete_column(&col("B")).unwrap();
        assert!(matches!(
            store.delete_column(&col("A")),
            Err(BoardError::ColumnNotEmpty { count: 2, .. })
        ));
        assert_eq!(store.task_count(), 2);
    }

    #[test]
    fn test_replace_column_identity() {
        let mut store = two_column_store();
        let column = store.add_column(&ColumnDraft::new("C")).unwrap();
        let task = store.add_task(&column.id, &TaskDraft::new("in C")).unwrap();
        let local = column.id.as_local().unwrap();

        let server = Column::new("srvC", "b1", "C").at(99);
        let new = store.replace_column_identity(local, server).unwrap();

        assert_eq!(store.columns()[2].id, new);
        assert_eq!(store.columns()[2].position, 2);
        assert_eq!(store.task(&task.id).unwrap().column_id, new);
        assert!(store.tasks(&column.id).is_empty());
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_visible_tasks_applies_filter() {
        let mut store = two_column_store();
        store.set_filter(Some(TaskFilter::query("two"))).unwrap();
        let visible: Vec<&str> = store
            .visible_tasks(&col("A"))
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(visible, vec!["two"]);
        // Filtering never relabels
        assert_eq!(store.task(&key("t2")).unwrap().position, 1);
    }

    #[test]
    fn test_reload_keeps_surviving_selection() {
        let mut store = two_column_store();
        store.select_task(&key("t2")).unwrap();
        store.load_board(
            Board::new("b1", "Test"),
            vec![Column::new("A", "b1", "A")],
            group_by_column(vec![Task::new("t2", "A", "two")]),
        );
        assert_eq!(store.selected_key(), Some(&key("t2")));

        store.load_board(Board::new("b1", "Test"), vec![Column::new("A", "b1", "A")], HashMap::new());
        assert!(store.selected_key().is_none());
    }
}
