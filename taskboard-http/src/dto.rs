//! Wire representations of board entities
//!
//! The REST API speaks camelCase JSON and plain string ids. These types are
//! converted to and from the engine's types at the edge; local identities
//! never appear here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskboard_engine::{
    AssigneeRef, Board, BoardId, BoardSnapshot, Column, ColumnDraft, ColumnId, ColumnKey, Task, TaskDraft, TaskId,
    TaskKey, TaskPatch, TaskPriority, TaskStatus, ViewMode,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeDto {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignees: Vec<AssigneeDto>,
    pub column_id: String,
    pub position: usize,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attachment_count: u32,
    #[serde(default)]
    pub comment_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskDto> for Task {
    fn from(dto: TaskDto) -> Self {
        Task {
            id: TaskKey::Remote(TaskId::from(dto.id)),
            title: dto.title,
            description: dto.description.unwrap_or_default(),
            status: dto.status,
            priority: dto.priority,
            due_date: dto.due_date,
            assignees: dto
                .assignees
                .into_iter()
                .map(|a| AssigneeRef::new(a.id, a.name))
                .collect(),
            column_id: ColumnKey::Remote(ColumnId::from(dto.column_id)),
            position: dto.position,
            tags: dto.tags,
            attachment_count: dto.attachment_count,
            comment_count: dto.comment_count,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub board_id: Option<String>,
    pub position: usize,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub wip_limit: Option<usize>,
}

impl ColumnDto {
    /// Convert, filling the board id when the server omits it
    pub fn into_column(self, board: &BoardId) -> Column {
        let board_id = self.board_id.map(BoardId::from).unwrap_or_else(|| board.clone());
        let mut column = Column::new(ColumnKey::Remote(ColumnId::from(self.id)), board_id, self.name).at(self.position);
        if let Some(color) = self.color {
            column.color = color;
        }
        column.wip_limit = self.wip_limit;
        column
    }
}

/// `GET /boards/{id}` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub columns: Vec<ColumnDto>,
    #[serde(default)]
    pub tasks: Vec<TaskDto>,
}

impl From<BoardDto> for BoardSnapshot {
    fn from(dto: BoardDto) -> Self {
        let board_id = BoardId::from(dto.id);
        let board = Board::new(board_id.clone(), dto.name).with_view_mode(dto.view_mode);
        let columns = dto
            .columns
            .into_iter()
            .map(|c| c.into_column(&board_id))
            .collect();
        let mut tasks_by_column: HashMap<ColumnKey, Vec<Task>> = HashMap::new();
        for task in dto.tasks.into_iter().map(Task::from) {
            tasks_by_column
                .entry(task.column_id.clone())
                .or_default()
                .push(task);
        }
        BoardSnapshot {
            board,
            columns,
            tasks_by_column,
        }
    }
}

/// `PATCH /tasks/{id}` body for a move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTaskRequest<'a> {
    pub column_id: &'a str,
    pub position: usize,
}

/// `POST /columns/{id}/tasks` body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'a str,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignee_ids: Vec<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub tags: &'a [String],
}

impl<'a> From<&'a TaskDraft> for CreateTaskRequest<'a> {
    fn from(draft: &'a TaskDraft) -> Self {
        Self {
            title: &draft.title,
            description: &draft.description,
            status: draft.status,
            priority: draft.priority,
            due_date: draft.due_date,
            assignee_ids: draft.assignees.iter().map(|a| a.id.as_str()).collect(),
            tags: &draft.tags,
        }
    }
}

/// `POST /boards/{id}/columns` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateColumnRequest<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<usize>,
}

impl<'a> From<&'a ColumnDraft> for CreateColumnRequest<'a> {
    fn from(draft: &'a ColumnDraft) -> Self {
        Self {
            name: &draft.name,
            color: draft.color.as_deref(),
            wip_limit: draft.wip_limit,
        }
    }
}

/// `PATCH /tasks/{id}` body for a field edit. Absent fields are left alone;
/// `dueDate: null` clears the due date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a [String]>,
}

impl<'a> From<&'a TaskPatch> for UpdateTaskRequest<'a> {
    fn from(patch: &'a TaskPatch) -> Self {
        Self {
            title: patch.title.as_deref(),
            description: patch.description.as_deref(),
            status: patch.status,
            priority: patch.priority,
            due_date: patch.due_date,
            assignee_ids: patch
                .assignees
                .as_ref()
                .map(|list| list.iter().map(|a| a.id.as_str()).collect()),
            tags: patch.tags.as_deref(),
        }
    }
}

/// Error body the API returns alongside non-success statuses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message, falling back to the raw body
    pub fn message_or(self, raw: &str) -> String {
        self.message
            .or(self.error)
            .unwrap_or_else(|| raw.trim().to_string())
    }
}
