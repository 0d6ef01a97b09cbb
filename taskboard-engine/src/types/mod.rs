//! Core types for the board engine

mod board;
mod ids;
mod task;

// Re-export all types
pub use board::{Board, Column, ColumnDraft, ColumnPatch, TaskFilter, ViewMode};
pub use ids::{BoardId, ColumnId, ColumnKey, Identity, LocalId, TaskId, TaskKey};
pub use task::{AssigneeRef, Task, TaskDraft, TaskPatch, TaskPriority, TaskStatus};
