//! Optimistic update log
//!
//! Every local mutation that still has to be confirmed by the backend gets an
//! entry carrying enough prior state to undo it. Entries are cleared on
//! confirmation and marked failed (but kept) when the backend refuses, so the
//! caller can decide between retry and rollback.

use crate::store::MoveReceipt;
use crate::types::{Column, ColumnKey, Task, TaskKey};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use ulid::Ulid;

/// Identifier of one optimistic update.
///
/// Formatted as `KIND:subject:millis:nonce`, for example
/// `MOVE_TASK:t1:1718000000000:01J...`. The nonce keeps two updates of the same
/// entity within one millisecond distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateId(String);

impl UpdateId {
    fn generate(kind: MutationKind, subject: &Subject, at: DateTime<Utc>) -> Self {
        Self(format!(
            "{}:{}:{}:{}",
            kind.as_str(),
            subject,
            at.timestamp_millis(),
            Ulid::new()
        ))
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UpdateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of local mutation an entry stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationKind {
    MoveTask,
    AddTask,
    UpdateTask,
    DeleteTask,
    AddColumn,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoveTask => "MOVE_TASK",
            Self::AddTask => "ADD_TASK",
            Self::UpdateTask => "UPDATE_TASK",
            Self::DeleteTask => "DELETE_TASK",
            Self::AddColumn => "ADD_COLUMN",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity an update is about
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Task(TaskKey),
    Column(ColumnKey),
}

impl Subject {
    pub fn task(&self) -> Option<&TaskKey> {
        match self {
            Self::Task(key) => Some(key),
            Self::Column(_) => None,
        }
    }

    pub fn column(&self) -> Option<&ColumnKey> {
        match self {
            Self::Column(key) => Some(key),
            Self::Task(_) => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(key) => write!(f, "{}", key),
            Self::Column(key) => write!(f, "{}", key),
        }
    }
}

/// State captured before a mutation, sufficient to compensate it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PriorState {
    /// Task was at `from_index` of `from_column` and was moved to `to_index`
    /// of `to_column`
    Move {
        from_column: ColumnKey,
        from_index: usize,
        to_column: ColumnKey,
        to_index: usize,
    },
    /// Task did not exist; it was appended to `column`
    Add { column: ColumnKey },
    /// Task fields before an edit
    Update { previous: Box<Task> },
    /// Task as it was before deletion, with its former slot
    Delete {
        column: ColumnKey,
        index: usize,
        task: Box<Task>,
    },
    /// Column did not exist
    AddColumn,
}

impl PriorState {
    fn rekey_task(&mut self, old: &TaskKey, new: &TaskKey) {
        match self {
            Self::Update { previous } if &previous.id == old => previous.id = new.clone(),
            Self::Delete { task, .. } if &task.id == old => task.id = new.clone(),
            _ => {}
        }
    }

    fn rekey_column(&mut self, old: &ColumnKey, new: &ColumnKey) {
        let swap = |key: &mut ColumnKey| {
            if key == old {
                *key = new.clone();
            }
        };
        match self {
            Self::Move {
                from_column,
                to_column,
                ..
            } => {
                swap(from_column);
                swap(to_column);
            }
            Self::Add { column } => swap(column),
            Self::Update { previous } => swap(&mut previous.column_id),
            Self::Delete { column, task, .. } => {
                swap(column);
                swap(&mut task.column_id);
            }
            Self::AddColumn => {}
        }
    }
}

/// Confirmation status of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UpdateStatus {
    Pending,
    Failed {
        error: String,
        failed_at: DateTime<Utc>,
    },
}

/// One unconfirmed local mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimisticUpdate {
    pub id: UpdateId,
    pub kind: MutationKind,
    pub subject: Subject,
    pub recorded_at: DateTime<Utc>,
    pub prior: PriorState,
    pub status: UpdateStatus,
}

impl OptimisticUpdate {
    fn new(kind: MutationKind, subject: Subject, prior: PriorState) -> Self {
        let recorded_at = Utc::now();
        Self {
            id: UpdateId::generate(kind, &subject, recorded_at),
            kind,
            subject,
            recorded_at,
            prior,
            status: UpdateStatus::Pending,
        }
    }

    /// Entry for a task move
    pub fn moved(receipt: &MoveReceipt) -> Self {
        Self::new(
            MutationKind::MoveTask,
            Subject::Task(receipt.task.clone()),
            PriorState::Move {
                from_column: receipt.from_column.clone(),
                from_index: receipt.from_index,
                to_column: receipt.to_column.clone(),
                to_index: receipt.to_index,
            },
        )
    }

    /// Entry for a freshly added task
    pub fn added(task: &Task) -> Self {
        Self::new(
            MutationKind::AddTask,
            Subject::Task(task.id.clone()),
            PriorState::Add {
                column: task.column_id.clone(),
            },
        )
    }

    /// Entry for an edit, given the task as it was before
    pub fn updated(previous: Task) -> Self {
        Self::new(
            MutationKind::UpdateTask,
            Subject::Task(previous.id.clone()),
            PriorState::Update {
                previous: Box::new(previous),
            },
        )
    }

    /// Entry for a deletion, given the removed task and its former slot
    pub fn deleted(column: ColumnKey, index: usize, task: Task) -> Self {
        Self::new(
            MutationKind::DeleteTask,
            Subject::Task(task.id.clone()),
            PriorState::Delete {
                column,
                index,
                task: Box::new(task),
            },
        )
    }

    /// Entry for a freshly added column
    pub fn column_added(column: &Column) -> Self {
        Self::new(
            MutationKind::AddColumn,
            Subject::Column(column.id.clone()),
            PriorState::AddColumn,
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, UpdateStatus::Failed { .. })
    }

    /// Whether the entry mentions `key` as its subject or in its prior state
    pub fn involves_column(&self, key: &ColumnKey) -> bool {
        if self.subject.column() == Some(key) {
            return true;
        }
        match &self.prior {
            PriorState::Move {
                from_column,
                to_column,
                ..
            } => from_column == key || to_column == key,
            PriorState::Add { column } | PriorState::Delete { column, .. } => column == key,
            PriorState::Update { previous } => &previous.column_id == key,
            PriorState::AddColumn => false,
        }
    }
}

/// Unconfirmed mutations in the order they were recorded
#[derive(Debug, Default)]
pub struct OptimisticUpdateLog {
    entries: Vec<OptimisticUpdate>,
}

impl OptimisticUpdateLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its id
    pub fn record(&mut self, update: OptimisticUpdate) -> UpdateId {
        let id = update.id.clone();
        debug!(update = %id, kind = %update.kind, "recorded optimistic update");
        self.entries.push(update);
        id
    }

    /// Remove an entry after confirmation or rollback
    pub fn clear(&mut self, id: &UpdateId) -> Option<OptimisticUpdate> {
        let index = self.entries.iter().position(|u| &u.id == id)?;
        debug!(update = %id, "cleared optimistic update");
        Some(self.entries.remove(index))
    }

    /// Remove every entry matching `predicate`, returning them in log order
    pub fn clear_where(&mut self, mut predicate: impl FnMut(&OptimisticUpdate) -> bool) -> Vec<OptimisticUpdate> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|u| predicate(u));
        self.entries = kept;
        removed
    }

    /// Drop every entry
    pub fn clear_all(&mut self) -> Vec<OptimisticUpdate> {
        std::mem::take(&mut self.entries)
    }

    /// Mark an entry failed. Returns false if the entry is gone.
    pub fn mark_failed(&mut self, id: &UpdateId, error: impl ToString) -> bool {
        match self.entries.iter_mut().find(|u| &u.id == id) {
            Some(update) => {
                update.status = UpdateStatus::Failed {
                    error: error.to_string(),
                    failed_at: Utc::now(),
                };
                true
            }
            None => false,
        }
    }

    /// Put a failed entry back to pending before a retry
    pub fn mark_pending(&mut self, id: &UpdateId) -> bool {
        match self.entries.iter_mut().find(|u| &u.id == id) {
            Some(update) => {
                update.status = UpdateStatus::Pending;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &UpdateId) -> Option<&OptimisticUpdate> {
        self.entries.iter().find(|u| &u.id == id)
    }

    /// Entries in record order
    pub fn iter(&self) -> impl Iterator<Item = &OptimisticUpdate> {
        self.entries.iter()
    }

    pub fn pending(&self) -> impl Iterator<Item = &OptimisticUpdate> {
        self.entries.iter().filter(|u| !u.is_failed())
    }

    pub fn failed(&self) -> impl Iterator<Item = &OptimisticUpdate> {
        self.entries.iter().filter(|u| u.is_failed())
    }

    /// Pending entries recorded more than `max_age` before `now`
    pub fn stale(&self, now: DateTime<Utc>, max_age: TimeDelta) -> Vec<&OptimisticUpdate> {
        self.pending()
            .filter(|u| now.signed_duration_since(u.recorded_at) > max_age)
            .collect()
    }

    /// Most recent entry about `subject`
    pub fn latest_for(&self, subject: &Subject) -> Option<&OptimisticUpdate> {
        self.entries.iter().rev().find(|u| &u.subject == subject)
    }

    /// Replace a task identity in every entry
    pub fn rekey_task(&mut self, old: &TaskKey, new: &TaskKey) {
        for update in &mut self.entries {
            if update.subject == Subject::Task(old.clone()) {
                update.subject = Subject::Task(new.clone());
            }
            update.prior.rekey_task(old, new);
        }
    }

    /// Replace a column identity in every entry
    pub fn rekey_column(&mut self, old: &ColumnKey, new: &ColumnKey) {
        for update in &mut self.entries {
            if update.subject == Subject::Column(old.clone()) {
                update.subject = Subject::Column(new.clone());
            }
            update.prior.rekey_column(old, new);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
