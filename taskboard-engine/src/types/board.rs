//! Board-level types: Board, Column, ViewMode, TaskFilter

use super::ids::{BoardId, ColumnKey};
use super::task::{Task, TaskPriority, TaskStatus};
use serde::{Deserialize, Serialize};

/// How the board is presented. Cosmetic only: it never changes ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Kanban,
    List,
    Grid,
}

/// The board: identity, display name and the left-to-right column order.
///
/// `columns` mirrors the store's column array and is rewritten by the store
/// after every column mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnKey>,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<TaskFilter>,
}

impl Board {
    /// Create a new board with the given identity and name
    pub fn new(id: impl Into<BoardId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            columns: Vec::new(),
            view_mode: ViewMode::default(),
            filter: None,
        }
    }

    pub fn with_view_mode(mut self, view_mode: ViewMode) -> Self {
        self.view_mode = view_mode;
        self
    }

    pub fn with_filter(mut self, filter: TaskFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// A column defines a workflow stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnKey,
    pub name: String,
    pub board_id: BoardId,
    /// Left-to-right rank among the board's columns, derived by the store
    pub position: usize,
    /// 6-character hex color code without #
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<usize>,
}

impl Column {
    /// Create a new column with an auto-assigned color
    pub fn new(id: impl Into<ColumnKey>, board_id: impl Into<BoardId>, name: impl Into<String>) -> Self {
        let name = name.into();
        let color = crate::auto_color::auto_color(&name).to_string();
        Self {
            id: id.into(),
            name,
            board_id: board_id.into(),
            position: 0,
            color,
            wip_limit: None,
        }
    }

    /// Build a column from a creation draft
    pub fn from_draft(id: ColumnKey, board_id: BoardId, position: usize, draft: &ColumnDraft) -> Self {
        let mut column = Self::new(id, board_id, draft.name.clone());
        if let Some(color) = &draft.color {
            column.color = color.clone();
        }
        column.wip_limit = draft.wip_limit;
        column.position = position;
        column
    }

    /// Set the position (used when building load payloads)
    pub fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_wip_limit(mut self, limit: usize) -> Self {
        self.wip_limit = Some(limit);
        self
    }

    /// Whether `task_count` exceeds the WIP limit. Limits are advisory and
    /// never block a move.
    pub fn is_over_limit(&self, task_count: usize) -> bool {
        self.wip_limit.is_some_and(|limit| task_count > limit)
    }
}

/// Payload for creating a column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<usize>,
}

impl ColumnDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_wip_limit(mut self, limit: usize) -> Self {
        self.wip_limit = Some(limit);
        self
    }
}

impl From<&Column> for ColumnDraft {
    fn from(column: &Column) -> Self {
        Self {
            name: column.name.clone(),
            color: Some(column.color.clone()),
            wip_limit: column.wip_limit,
        }
    }
}

/// Partial update of a column's fields. Position changes go through
/// `move_column`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// `Some(None)` removes the limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<Option<usize>>,
}

impl ColumnPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_wip_limit(mut self, limit: Option<usize>) -> Self {
        self.wip_limit = Some(limit);
        self
    }

    pub fn apply(&self, column: &mut Column) {
        if let Some(name) = &self.name {
            column.name = name.clone();
        }
        if let Some(color) = &self.color {
            column.color = color.clone();
        }
        if let Some(limit) = self.wip_limit {
            column.wip_limit = limit;
        }
    }
}

/// Filter predicate over tasks. Filtering hides tasks from a view; it never
/// changes positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Case-insensitive substring matched against title, description and tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl TaskFilter {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if let Some(assignee) = &self.assignee {
            if !task.assignees.iter().any(|a| &a.id == assignee) {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(query) => {
                let needle = query.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task.description.to_lowercase().contains(&needle)
                    || task.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssigneeRef;

    #[test]
    fn test_board_creation() {
        let board = Board::new("b1", "Roadmap");
        assert_eq!(board.name, "Roadmap");
        assert_eq!(board.view_mode, ViewMode::Kanban);
        assert!(board.columns.is_empty());
        assert!(board.filter.is_none());
    }

    #[test]
    fn test_column_gets_auto_color() {
        let column = Column::new("todo", "b1", "To Do");
        assert_eq!(column.color, crate::auto_color::auto_color("To Do"));
        assert_eq!(column.color.len(), 6);
    }

    #[test]
    fn test_column_from_draft_prefers_explicit_color() {
        let draft = ColumnDraft::new("Review").with_color("ff0000").with_wip_limit(3);
        let column = Column::from_draft(ColumnKey::local(), BoardId::from("b1"), 2, &draft);
        assert_eq!(column.color, "ff0000");
        assert_eq!(column.wip_limit, Some(3));
        assert_eq!(column.position, 2);
    }

    #[test]
    fn test_wip_limit() {
        let column = Column::new("doing", "b1", "Doing").with_wip_limit(2);
        assert!(!column.is_over_limit(2));
        assert!(column.is_over_limit(3));
        assert!(!Column::new("todo", "b1", "To Do").is_over_limit(100));
    }

    #[test]
    fn test_column_patch_removes_limit() {
        let mut column = Column::new("doing", "b1", "Doing").with_wip_limit(2);
        ColumnPatch::new().with_name("In Progress").with_wip_limit(None).apply(&mut column);
        assert_eq!(column.name, "In Progress");
        assert!(column.wip_limit.is_none());
    }

    #[test]
    fn test_filter_matches() {
        let task = Task::new("t1", "todo", "Fix login bug")
            .with_tags(vec!["Auth".into()])
            .with_priority(TaskPriority::High)
            .with_assignees(vec![AssigneeRef::new("u1", "Ada")]);

        assert!(TaskFilter::default().matches(&task));
        assert!(TaskFilter::query("LOGIN").matches(&task));
        assert!(TaskFilter::query("auth").matches(&task));
        assert!(!TaskFilter::query("billing").matches(&task));
        assert!(TaskFilter::default().with_assignee("u1").matches(&task));
        assert!(!TaskFilter::default().with_assignee("u2").matches(&task));
        assert!(!TaskFilter::default()
            .with_priority(TaskPriority::Low)
            .matches(&task));
        assert!(!TaskFilter::default()
            .with_status(TaskStatus::Done)
            .matches(&task));
    }
}
