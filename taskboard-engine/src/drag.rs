//! Drag-and-drop state machine
//!
//! ```text
//!   Idle --start_drag--> Pending --activate--> Active
//!    ^                      |                    |
//!    +------ end/cancel ----+------ end/cancel --+
//! ```
//!
//! `Pending` covers the gap between pointer-down and the activation threshold
//! (a few pixels of travel). Releasing while pending is a click, not a move,
//! so it ends the drag without a commit. Only an `Active` drag with a drop
//! target that differs from the origin yields a [`DragCommit`].
//!
//! The machine never mutates the board. The caller applies the commit through
//! [`BoardStateStore::move_task`](crate::store::BoardStateStore::move_task).

use crate::error::DragError;
use crate::store::BoardStateStore;
use crate::types::{ColumnKey, Task, TaskKey};
use std::mem;
use tracing::{debug, trace};

/// Pointer offset of the drag overlay relative to where the drag started
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerOffset {
    pub x: f32,
    pub y: f32,
}

impl PointerOffset {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Slot the dragged task is hovering over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub column: ColumnKey,
    pub index: usize,
}

impl DropTarget {
    pub fn new(column: ColumnKey, index: usize) -> Self {
        Self { column, index }
    }
}

/// Everything known about the drag in progress
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    /// Snapshot of the task when the drag started, for the overlay
    pub task: Task,
    pub source_column: ColumnKey,
    pub source_index: usize,
    pub drop_target: Option<DropTarget>,
    pub offset: PointerOffset,
}

impl DragState {
    pub fn task_key(&self) -> &TaskKey {
        &self.task.id
    }
}

/// Phase of the drag state machine
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragPhase {
    #[default]
    Idle,
    Pending(DragState),
    Active(DragState),
}

impl DragPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending(_) => "pending",
            Self::Active(_) => "active",
        }
    }
}

/// A completed drag that should be applied as a move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragCommit {
    pub task: TaskKey,
    pub source_column: ColumnKey,
    pub source_index: usize,
    pub target_column: ColumnKey,
    pub target_index: usize,
}

/// Tracks one pointer-driven drag at a time
#[derive(Debug, Default)]
pub struct DragSession {
    phase: DragPhase,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, DragPhase::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, DragPhase::Active(_))
    }

    /// State of the drag in progress, pending or active
    pub fn state(&self) -> Option<&DragState> {
        match &self.phase {
            DragPhase::Idle => None,
            DragPhase::Pending(state) | DragPhase::Active(state) => Some(state),
        }
    }

    /// Begin a drag of `task` out of `column`.
    ///
    /// The task is resolved against the store so the overlay snapshot and the
    /// recorded origin are what the board shows right now.
    pub fn start_drag(
        &mut self,
        store: &BoardStateStore,
        task: &TaskKey,
        column: &ColumnKey,
    ) -> Result<(), DragError> {
        if !self.is_idle() {
            return Err(DragError::NotIdle {
                phase: self.phase.name(),
            });
        }
        let source_index = store
            .tasks(column)
            .iter()
            .position(|t| &t.id == task)
            .ok_or_else(|| crate::error::BoardError::task_not_in_column(task, column))?;
        let snapshot = store.tasks(column)[source_index].clone();

        debug!(task = %task, column = %column, index = source_index, "drag pending");
        self.phase = DragPhase::Pending(DragState {
            task: snapshot,
            source_column: column.clone(),
            source_index,
            drop_target: None,
            offset: PointerOffset::default(),
        });
        Ok(())
    }

    /// Pointer crossed the activation threshold
    pub fn activate(&mut self) -> Result<(), DragError> {
        self.phase = match mem::take(&mut self.phase) {
            DragPhase::Pending(state) => {
                debug!(task = %state.task.id, "drag active");
                DragPhase::Active(state)
            }
            active @ DragPhase::Active(_) => active,
            DragPhase::Idle => return Err(DragError::NotDragging),
        };
        Ok(())
    }

    /// Track the pointer. Ignored while pending; returns whether it applied.
    pub fn update_position(&mut self, offset: PointerOffset) -> Result<bool, DragError> {
        match &mut self.phase {
            DragPhase::Active(state) => {
                state.offset = offset;
                trace!(x = offset.x, y = offset.y, "drag moved");
                Ok(true)
            }
            DragPhase::Pending(_) => Ok(false),
            DragPhase::Idle => Err(DragError::NotActive { phase: "idle" }),
        }
    }

    /// Record the slot the pointer is over
    pub fn set_drop_target(&mut self, column: ColumnKey, index: usize) -> Result<(), DragError> {
        let state = self.active_state_mut()?;
        trace!(column = %column, index, "drop target");
        state.drop_target = Some(DropTarget::new(column, index));
        Ok(())
    }

    /// Pointer left every droppable area
    pub fn clear_drop_target(&mut self) -> Result<(), DragError> {
        self.active_state_mut()?.drop_target = None;
        Ok(())
    }

    /// Release the pointer.
    ///
    /// Always returns to idle. Yields a commit only for an active drag whose
    /// target differs from its origin.
    pub fn end_drag(&mut self) -> Result<Option<DragCommit>, DragError> {
        match mem::take(&mut self.phase) {
            DragPhase::Idle => Err(DragError::NotDragging),
            DragPhase::Pending(state) => {
                debug!(task = %state.task.id, "drag released before activation");
                Ok(None)
            }
            DragPhase::Active(state) => {
                let Some(target) = state.drop_target else {
                    debug!(task = %state.task.id, "drag ended without a target");
                    return Ok(None);
                };
                if target.column == state.source_column && target.index == state.source_index {
                    debug!(task = %state.task.id, "drag ended on its origin");
                    return Ok(None);
                }
                debug!(
                    task = %state.task.id,
                    to = %target.column,
                    index = target.index,
                    "drag committed"
                );
                Ok(Some(DragCommit {
                    task: state.task.id,
                    source_column: state.source_column,
                    source_index: state.source_index,
                    target_column: target.column,
                    target_index: target.index,
                }))
            }
        }
    }

    /// Abort any drag in progress. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        let previous = mem::take(&mut self.phase);
        let was_dragging = !matches!(previous, DragPhase::Idle);
        if was_dragging {
            debug!(phase = previous.name(), "drag cancelled");
        }
        was_dragging
    }

    fn active_state_mut(&mut self) -> Result<&mut DragState, DragError> {
        match &mut self.phase {
            DragPhase::Active(state) => Ok(state),
            other => Err(DragError::NotActive { phase: other.name() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::group_by_column;
    use crate::types::{Board, Column};

    fn store() -> BoardStateStore {
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

    fn started(store: &BoardStateStore) -> DragSession {
        let mut drag = DragSession::new();
        drag.start_drag(store, &TaskKey::from("t1"), &ColumnKey::from("A"))
            .unwrap();
        drag
    }

    #[test]
    fn test_start_records_origin() {
        let store = store();
        let drag = started(&store);
        assert_eq!(drag.phase().name(), "pending");
        let state = drag.state().unwrap();
        assert_eq!(state.source_index, 0);
        assert_eq!(state.task.title, "one");
        assert!(state.drop_target.is_none());
    }

    #[test]
    fn test_start_requires_idle() {
        let store = store();
        let mut drag = started(&store);
        assert_eq!(
            drag.start_drag(&store, &TaskKey::from("t2"), &ColumnKey::from("A")),
            Err(DragError::NotIdle { phase: "pending" })
        );
    }

    #[test]
    fn test_start_unknown_task() {
        let store = store();
        let mut drag = DragSession::new();
        assert!(matches!(
            drag.start_drag(&store, &TaskKey::from("t1"), &ColumnKey::from("B")),
            Err(DragError::Board(_))
        ));
        assert!(drag.is_idle());
    }

    #[test]
    fn test_position_updates_ignored_while_pending() {
        let store = store();
        let mut drag = started(&store);
        assert_eq!(drag.update_position(PointerOffset::new(3.0, 1.0)), Ok(false));
        assert_eq!(drag.state().unwrap().offset, PointerOffset::default());

        drag.activate().unwrap();
        assert_eq!(drag.update_position(PointerOffset::new(30.0, 4.0)), Ok(true));
        assert_eq!(drag.state().unwrap().offset, PointerOffset::new(30.0, 4.0));
    }

    #[test]
    fn test_drop_target_requires_active() {
        let store = store();
        let mut drag = started(&store);
        assert_eq!(
            drag.set_drop_target(ColumnKey::from("B"), 0),
            Err(DragError::NotActive { phase: "pending" })
        );
    }

    #[test]
    fn test_active_drag_commits() {
        let store = store();
        let mut drag = started(&store);
        drag.activate().unwrap();
        drag.set_drop_target(ColumnKey::from("B"), 0).unwrap();

        let commit = drag.end_drag().unwrap().unwrap();
        assert_eq!(commit.task, TaskKey::from("t1"));
        assert_eq!(commit.source_column, ColumnKey::from("A"));
        assert_eq!(commit.target_column, ColumnKey::from("B"));
        assert_eq!(commit.target_index, 0);
        assert!(drag.is_idle());
    }

    #[test]
    fn test_release_while_pending_is_a_click() {
        let store = store();
        let mut drag = started(&store);
        assert_eq!(drag.end_drag(), Ok(None));
        assert!(drag.is_idle());
    }

    #[test]
    fn test_drop_on_origin_is_not_a_commit() {
        let store = store();
        let mut drag = started(&store);
        drag.activate().unwrap();
        drag.set_drop_target(ColumnKey::from("A"), 0).unwrap();
        assert_eq!(drag.end_drag(), Ok(None));
    }

    #[test]
    fn test_cleared_target_is_not_a_commit() {
        let store = store();
        let mut drag = started(&store);
        drag.activate().unwrap();
        drag.set_drop_target(ColumnKey::from("B"), 0).unwrap();
        drag.clear_drop_target().unwrap();
        assert_eq!(drag.end_drag(), Ok(None));
    }

    #[test]
    fn test_cancel_from_any_phase() {
        let store = store();
        let mut drag = DragSession::new();
        assert!(!drag.cancel());

        let mut drag_pending = started(&store);
        assert!(drag_pending.cancel());
        assert!(drag_pending.is_idle());

        drag = started(&store);
        drag.activate().unwrap();
        assert!(drag.cancel());
        assert!(drag.is_idle());
        assert_eq!(drag.end_drag(), Err(DragError::NotDragging));
    }

    #[test]
    fn test_activate_is_idempotent() {
        let store = store();
        let mut drag = started(&store);
        drag.activate().unwrap();
        drag.activate().unwrap();
        assert!(drag.is_active());
        assert_eq!(DragSession::new().activate(), Err(DragError::NotDragging));
    }
}
