//! SyncGateway - decides what to send and folds results back
//!
//! The store is updated first (optimistically) and the gateway is told about
//! it afterwards. The gateway never awaits the backend itself: each persist
//! call returns a [`Dispatch`], either an owned [`SyncRequest`] for the
//! caller to send or an outcome settled on the spot. When the response comes
//! back, [`SyncGateway::apply`] folds it into the store in one synchronous
//! step and hands back whatever it unblocked.
//!
//! A call that would need a local identity is not sent: it is parked in the
//! deferred queue and released, in order, once the identity is confirmed.
//! Deferred operations are built from the store's *current* state, so a task
//! moved three times while its create was in flight is sent once, to where
//! it is now.

use super::backend::BoardSnapshot;
use super::request::{SyncReply, SyncRequest, SyncResponse};
use super::{BoardBackend, SyncOutcome};
use crate::config::SyncConfig;
use crate::error::{BackendError, BoardError, SyncError, SyncResult};
use crate::optimistic::{MutationKind, OptimisticUpdate, OptimisticUpdateLog, PriorState, Subject, UpdateId};
use crate::store::BoardStateStore;
use crate::types::{BoardId, Column, ColumnDraft, ColumnKey, LocalId, Task, TaskDraft, TaskId, TaskKey, TaskPatch};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, instrument, warn};

/// A persist call held back until every identity it needs is remote
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredOp {
    /// Send the task's current placement
    Move { update: UpdateId, task: TaskKey },
    /// Send a field patch
    Update {
        update: UpdateId,
        task: TaskKey,
        patch: TaskPatch,
    },
    /// Create a task whose column is still local
    Create { update: UpdateId, local: LocalId },
}

impl DeferredOp {
    pub fn update(&self) -> &UpdateId {
        match self {
            Self::Move { update, .. } | Self::Update { update, .. } | Self::Create { update, .. } => update,
        }
    }

    /// Task the operation is about
    pub fn task(&self) -> TaskKey {
        match self {
            Self::Move { task, .. } | Self::Update { task, .. } => task.clone(),
            Self::Create { local, .. } => TaskKey::Local(*local),
        }
    }

    /// Whether every identity the call needs is remote. A task that has
    /// vanished from the store counts as ready; releasing it cancels it.
    fn is_ready(&self, store: &BoardStateStore) -> bool {
        match self {
            Self::Move { task, .. } => {
                task.is_remote()
                    && store
                        .locate(task)
                        .is_none_or(|(column, _)| column.is_remote())
            }
            Self::Update { task, .. } => task.is_remote(),
            Self::Create { local, .. } => store
                .locate(&TaskKey::Local(*local))
                .is_none_or(|(column, _)| column.is_remote()),
        }
    }

    fn rekey_task(&mut self, old: &TaskKey, new: &TaskKey) {
        match self {
            Self::Move { task, .. } | Self::Update { task, .. } if task == old => *task = new.clone(),
            _ => {}
        }
    }
}

/// What a persist call asks of the caller
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Send this request and pass the response to [`SyncGateway::apply`]
    Send(SyncRequest),
    /// Nothing to send
    Settled(SyncOutcome),
}

/// Result of folding one response into the store
#[derive(Debug, PartialEq)]
pub struct Applied {
    pub outcome: SyncResult<SyncOutcome>,
    /// Requests the response unblocked, oldest first
    pub follow_up: Vec<SyncRequest>,
}

/// Result of rolling back every failed update
#[derive(Debug, Default, PartialEq)]
pub struct Rollback {
    pub rolled_back: Vec<UpdateId>,
    /// Deferred requests the rollback made sendable
    pub follow_up: Vec<SyncRequest>,
}

/// Tracks optimistic updates and turns them into backend requests
#[derive(Debug)]
pub struct SyncGateway<B> {
    backend: B,
    log: OptimisticUpdateLog,
    deferred: VecDeque<DeferredOp>,
    /// Local entities removed on purpose while their create was in flight
    abandoned: HashSet<LocalId>,
    /// Most recent move issued per task; older confirmations are superseded
    latest_moves: HashMap<TaskKey, UpdateId>,
    config: SyncConfig,
}

impl<B: BoardBackend> SyncGateway<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, SyncConfig::default())
    }

    pub fn with_config(backend: B, config: SyncConfig) -> Self {
        Self {
            backend,
            log: OptimisticUpdateLog::new(),
            deferred: VecDeque::new(),
            abandoned: HashSet::new(),
            latest_moves: HashMap::new(),
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn log(&self) -> &OptimisticUpdateLog {
        &self.log
    }

    /// Operations waiting on a local identity, oldest first
    pub fn deferred(&self) -> impl Iterator<Item = &DeferredOp> {
        self.deferred.iter()
    }

    /// Record an optimistic update before persisting it
    pub fn record(&mut self, update: OptimisticUpdate) -> UpdateId {
        self.log.record(update)
    }

    /// Pending updates older than the configured confirm timeout
    pub fn stale(&self, now: DateTime<Utc>) -> Vec<&OptimisticUpdate> {
        self.log.stale(now, self.config.confirm_timeout())
    }

    // =========================================================================
    // Persist
    // =========================================================================

    /// Persist a move the store has already applied
    pub fn persist_move(
        &mut self,
        update: UpdateId,
        task: &TaskKey,
        target_column: &ColumnKey,
        target_index: usize,
    ) -> Dispatch {
        self.latest_moves.insert(task.clone(), update.clone());
        match (task.as_remote(), target_column.as_remote()) {
            (Some(task), Some(column)) => Dispatch::Send(SyncRequest::MoveTask {
                update,
                task: task.clone(),
                column: column.clone(),
                position: target_index,
            }),
            _ => {
                debug!(update = %update, task = %task, "move deferred until identities are confirmed");
                self.defer(DeferredOp::Move {
                    update,
                    task: task.clone(),
                })
            }
        }
    }

    /// Persist a task create. The identity swap happens in [`apply`](Self::apply).
    pub fn persist_create(
        &mut self,
        update: UpdateId,
        local: LocalId,
        column: &ColumnKey,
        draft: &TaskDraft,
    ) -> Dispatch {
        match column.as_remote() {
            Some(column) => Dispatch::Send(SyncRequest::CreateTask {
                update,
                local,
                column: column.clone(),
                draft: draft.clone(),
            }),
            None => {
                debug!(update = %update, local = %local, "create deferred until column is confirmed");
                self.defer(DeferredOp::Create { update, local })
            }
        }
    }

    /// Persist a column create
    pub fn persist_column_create(
        &mut self,
        update: UpdateId,
        local: LocalId,
        board: &BoardId,
        draft: &ColumnDraft,
    ) -> Dispatch {
        Dispatch::Send(SyncRequest::CreateColumn {
            update,
            local,
            board: board.clone(),
            draft: draft.clone(),
        })
    }

    /// Persist a field edit
    pub fn persist_update(&mut self, update: UpdateId, task: &TaskKey, patch: &TaskPatch) -> Dispatch {
        match task.as_remote() {
            Some(task) => Dispatch::Send(SyncRequest::UpdateTask {
                update,
                task: task.clone(),
                patch: patch.clone(),
            }),
            None => {
                debug!(update = %update, task = %task, "update deferred until task is confirmed");
                self.defer(DeferredOp::Update {
                    update,
                    task: task.clone(),
                    patch: patch.clone(),
                })
            }
        }
    }

    /// Persist a delete.
    ///
    /// Deleting a task the backend has never seen cancels its pending create
    /// and every other entry about it; nothing is sent. If the create is
    /// already in flight, its server copy is discarded when it lands.
    pub fn persist_delete(&mut self, update: UpdateId, task: &TaskKey) -> Dispatch {
        let create_in_flight = task.as_local().is_some_and(|local| !self.is_create_deferred(local));
        self.deferred.retain(|op| &op.task() != task);
        self.latest_moves.remove(task);
        match task {
            TaskKey::Remote(id) => Dispatch::Send(SyncRequest::DeleteTask {
                update,
                task: id.clone(),
            }),
            TaskKey::Local(local) => {
                if create_in_flight {
                    self.abandoned.insert(*local);
                }
                let cancelled = self.log.clear_where(|u| u.subject == Subject::Task(task.clone()));
                debug!(cancelled = cancelled.len(), "deleted unconfirmed task; nothing to send");
                Dispatch::Settled(SyncOutcome::Cancelled)
            }
        }
    }

    // =========================================================================
    // Responses
    // =========================================================================

    /// Fold a backend response into the store.
    ///
    /// Store, log and deferred queue change together here with no await in
    /// between. Responses may arrive in any order; a response whose log entry
    /// was already cleared (by a resync, a delete or a rollback) only cleans
    /// up after itself.
    #[instrument(level = "debug", skip_all, fields(request = response.request.name()))]
    pub fn apply(&mut self, store: &mut BoardStateStore, response: SyncResponse) -> Applied {
        let SyncResponse { request, result } = response;
        let mut follow_up = Vec::new();
        let outcome = match (request, result) {
            (SyncRequest::FetchBoard { .. }, Ok(SyncReply::Board(snapshot))) => {
                self.apply_snapshot(store, snapshot);
                Ok(SyncOutcome::Resynced)
            }
            (SyncRequest::MoveTask { update, task, .. }, Ok(SyncReply::Task(server))) => {
                Ok(self.confirm_move(store, update, task, server))
            }
            (SyncRequest::CreateTask { update, local, .. }, Ok(SyncReply::Task(created))) => {
                self.confirm_create(store, update, local, created, &mut follow_up)
            }
            (SyncRequest::CreateColumn { update, local, .. }, Ok(SyncReply::Column(created))) => {
                self.confirm_column_create(store, update, local, created, &mut follow_up)
            }
            (SyncRequest::UpdateTask { update, .. }, Ok(SyncReply::Task(_))) => Ok(self.confirm(update)),
            (SyncRequest::DeleteTask { task, .. }, Ok(SyncReply::Done) | Err(BackendError::NotFound { .. })) => {
                let key = TaskKey::Remote(task);
                self.log.clear_where(|u| u.subject == Subject::Task(key.clone()));
                Ok(SyncOutcome::Confirmed)
            }
            (SyncRequest::DiscardTask { task }, Ok(SyncReply::Done) | Err(BackendError::NotFound { .. })) => {
                Ok(SyncOutcome::Discarded {
                    remote: task.to_string(),
                })
            }
            (SyncRequest::DiscardColumn { column }, Ok(SyncReply::Done) | Err(BackendError::NotFound { .. })) => {
                Ok(SyncOutcome::Discarded {
                    remote: column.to_string(),
                })
            }
            (request, result) => {
                let source = match result {
                    Err(err) => err,
                    Ok(_) => BackendError::invalid_response(format!("unexpected reply to {}", request.name())),
                };
                self.reject(request, source)
            }
        };
        follow_up.extend(self.release_ready(store));
        Applied { outcome, follow_up }
    }

    /// Server wins: replace local state with a fetched snapshot and drop
    /// every unconfirmed update and deferred operation
    pub fn apply_snapshot(&mut self, store: &mut BoardStateStore, snapshot: BoardSnapshot) {
        store.load_board(snapshot.board, snapshot.columns, snapshot.tasks_by_column);
        let dropped = self.log.clear_all().len();
        self.deferred.clear();
        self.latest_moves.clear();
        info!(dropped, "board resynced from backend");
    }

    /// Refetch the board and apply it, awaiting the backend in place.
    ///
    /// On failure local state, the log and the deferred queue are untouched.
    pub async fn resync(&mut self, store: &mut BoardStateStore, board: &BoardId) -> SyncResult<()> {
        let response = SyncRequest::FetchBoard { board: board.clone() }
            .send(&self.backend)
            .await;
        self.apply(store, response).outcome.map(|_| ())
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    /// Re-issue an update from the store's current state
    #[instrument(level = "debug", skip_all, fields(update = %update))]
    pub fn retry(&mut self, store: &BoardStateStore, update: &UpdateId) -> SyncResult<Dispatch> {
        let entry = self
            .log
            .get(update)
            .cloned()
            .ok_or_else(|| SyncError::UnknownUpdate { id: update.clone() })?;
        self.log.mark_pending(update);
        let id = entry.id.clone();
        info!(kind = %entry.kind, "retrying update");

        let dispatch = match (&entry.kind, &entry.subject) {
            (MutationKind::MoveTask, Subject::Task(task)) => match store.locate(task) {
                Some((column, index)) => self.persist_move(id, task, &column, index),
                None => Dispatch::Settled(self.cancel(id)),
            },
            (MutationKind::AddTask, Subject::Task(task)) => match (task.as_local(), store.task(task)) {
                (None, _) => Dispatch::Settled(self.confirm(id)),
                (Some(_), None) => Dispatch::Settled(self.cancel(id)),
                (Some(local), Some(current)) => {
                    let column = current.column_id.clone();
                    let draft = TaskDraft::from(current);
                    self.persist_create(id, local, &column, &draft)
                }
            },
            (MutationKind::UpdateTask, Subject::Task(task)) => match store.task(task) {
                Some(current) => {
                    let patch = TaskPatch::snapshot(current);
                    self.persist_update(id, task, &patch)
                }
                None => Dispatch::Settled(self.cancel(id)),
            },
            (MutationKind::DeleteTask, Subject::Task(task)) => self.persist_delete(id, task),
            (MutationKind::AddColumn, Subject::Column(column)) => match (column.as_local(), store.column(column)) {
                (None, _) => Dispatch::Settled(self.confirm(id)),
                (Some(_), None) => Dispatch::Settled(self.cancel(id)),
                (Some(local), Some(current)) => {
                    let board = current.board_id.clone();
                    let draft = ColumnDraft::from(current);
                    self.persist_column_create(id, local, &board, &draft)
                }
            },
            _ => return Err(SyncError::UnknownUpdate { id }),
        };
        Ok(dispatch)
    }

    /// Undo an update locally using its recorded prior state.
    ///
    /// The entry is cleared only when the compensation succeeds. Returns the
    /// deferred requests the rollback made sendable: undoing a column create
    /// moves its tasks into a confirmed column, which releases their queued
    /// creates, moves and edits.
    #[instrument(level = "debug", skip_all, fields(update = %update))]
    pub fn rollback(&mut self, store: &mut BoardStateStore, update: &UpdateId) -> SyncResult<Vec<SyncRequest>> {
        let entry = self
            .log
            .get(update)
            .cloned()
            .ok_or_else(|| SyncError::UnknownUpdate { id: update.clone() })?;

        match (&entry.prior, &entry.subject) {
            (
                PriorState::Move {
                    from_column,
                    from_index,
                    ..
                },
                Subject::Task(task),
            ) => {
                if let Some((current, _)) = store.locate(task) {
                    store.move_task(task, &current, from_column, *from_index)?;
                }
            }
            (PriorState::Add { .. }, Subject::Task(task)) => {
                if let Some((column, _)) = store.locate(task) {
                    store.delete_task(task, &column)?;
                }
                if let Some(local) = task.as_local() {
                    // A failed create has had its answer; only a pending one can still land
                    if !entry.is_failed() && !self.is_create_deferred(local) {
                        self.abandoned.insert(local);
                    }
                }
                self.latest_moves.remove(task);
                self.deferred.retain(|op| &op.task() != task);
                self.log
                    .clear_where(|u| u.id != entry.id && u.subject == Subject::Task(task.clone()));
            }
            (PriorState::Update { previous }, _) => {
                if store.locate(&previous.id).is_some() {
                    store.restore_task_fields(previous)?;
                }
            }
            (PriorState::Delete { column, index, task }, _) => {
                store.reinsert_task(column, *index, (**task).clone())?;
            }
            (PriorState::AddColumn, Subject::Column(column)) => {
                if store.column(column).is_some() {
                    let removal = store.delete_column(column)?;
                    debug!(relocated = removal.relocated.len(), "column rolled back");
                }
                if let Some(local) = column.as_local() {
                    if !entry.is_failed() {
                        self.abandoned.insert(local);
                    }
                }
            }
            _ => return Err(SyncError::UnknownUpdate { id: update.clone() }),
        }

        self.log.clear(update);
        info!(kind = %entry.kind, "rolled back update");
        Ok(self.release_ready(store))
    }

    /// Roll back every failed update, newest first. Stops at the first
    /// compensation that fails and returns its error.
    pub fn rollback_failed(&mut self, store: &mut BoardStateStore) -> SyncResult<Rollback> {
        let failed: Vec<UpdateId> = self.log.failed().map(|u| u.id.clone()).collect();
        let mut rollback = Rollback::default();
        for id in failed.into_iter().rev() {
            if self.log.get(&id).is_none() {
                continue;
            }
            let released = self.rollback(store, &id)?;
            rollback.follow_up.extend(released);
            rollback.rolled_back.push(id);
        }
        Ok(rollback)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn is_create_deferred(&self, local: LocalId) -> bool {
        self.deferred
            .iter()
            .any(|op| matches!(op, DeferredOp::Create { local: queued, .. } if *queued == local))
    }

    fn defer(&mut self, op: DeferredOp) -> Dispatch {
        if !self.deferred.iter().any(|queued| queued.update() == op.update()) {
            self.deferred.push_back(op);
        }
        Dispatch::Settled(SyncOutcome::Deferred)
    }

    /// Turn every deferred operation that has become ready into a request,
    /// oldest first. Operations whose subject is gone are cancelled.
    fn release_ready(&mut self, store: &BoardStateStore) -> Vec<SyncRequest> {
        let (ready, waiting): (Vec<DeferredOp>, Vec<DeferredOp>) =
            self.deferred.drain(..).partition(|op| op.is_ready(store));
        self.deferred = waiting.into();

        let mut requests = Vec::with_capacity(ready.len());
        for op in ready {
            debug!(update = %op.update(), "releasing deferred operation");
            match self.deferred_request(store, op) {
                Ok(request) => requests.push(request),
                Err(update) => {
                    self.cancel(update);
                }
            }
        }
        requests
    }

    /// Build the request for a ready operation from current store state, or
    /// hand back its update id when the subject is gone
    fn deferred_request(&self, store: &BoardStateStore, op: DeferredOp) -> Result<SyncRequest, UpdateId> {
        match op {
            DeferredOp::Move { update, task } => match (task.as_remote(), store.locate(&task)) {
                (Some(id), Some((ColumnKey::Remote(column), position))) => Ok(SyncRequest::MoveTask {
                    update,
                    task: id.clone(),
                    column,
                    position,
                }),
                _ => Err(update),
            },
            DeferredOp::Update { update, task, patch } => match task.as_remote() {
                Some(id) if store.locate(&task).is_some() => Ok(SyncRequest::UpdateTask {
                    update,
                    task: id.clone(),
                    patch,
                }),
                _ => Err(update),
            },
            DeferredOp::Create { update, local } => match store.task(&TaskKey::Local(local)) {
                Some(current) => match &current.column_id {
                    ColumnKey::Remote(column) => Ok(SyncRequest::CreateTask {
                        update,
                        local,
                        column: column.clone(),
                        draft: TaskDraft::from(current),
                    }),
                    ColumnKey::Local(_) => Err(update),
                },
                None => Err(update),
            },
        }
    }

    fn confirm_move(&mut self, store: &BoardStateStore, update: UpdateId, task: TaskId, server: Task) -> SyncOutcome {
        if self.log.clear(&update).is_none() {
            return SyncOutcome::Cancelled;
        }
        let key = TaskKey::Remote(task);
        if self.latest_moves.get(&key) != Some(&update) {
            debug!(task = %key, "a later move was issued; skipping placement check");
            return SyncOutcome::Confirmed;
        }
        self.latest_moves.remove(&key);

        match store.locate(&key) {
            None => SyncOutcome::Confirmed,
            Some((column, index)) if column == server.column_id && index == server.position => SyncOutcome::Confirmed,
            Some(_) => {
                warn!(
                    task = %key,
                    server_column = %server.column_id,
                    server_position = server.position,
                    "backend placed task elsewhere"
                );
                SyncOutcome::Diverged {
                    task: key,
                    server_column: server.column_id,
                    server_position: server.position,
                }
            }
        }
    }

    fn confirm_create(
        &mut self,
        store: &mut BoardStateStore,
        update: UpdateId,
        local: LocalId,
        created: Task,
        follow_up: &mut Vec<SyncRequest>,
    ) -> SyncResult<SyncOutcome> {
        let Some(remote) = created.id.as_remote().cloned() else {
            return self.reject_update(update, BackendError::invalid_response("created task carries no server id"));
        };
        let old = TaskKey::Local(local);
        if store.locate(&old).is_none() {
            self.log.clear(&update);
            if self.abandoned.remove(&local) {
                warn!(remote = %remote, "task removed before create was confirmed; discarding server copy");
                follow_up.push(SyncRequest::DiscardTask { task: remote });
            } else if let Some(board) = store.board() {
                debug!(remote = %remote, "create landed after a resync; refetching");
                follow_up.push(SyncRequest::FetchBoard { board: board.id.clone() });
            }
            return Ok(SyncOutcome::Cancelled);
        }

        let new = store.replace_task_identity(local, created)?;
        self.log.rekey_task(&old, &new);
        for op in self.deferred.iter_mut() {
            op.rekey_task(&old, &new);
        }
        if let Some(latest) = self.latest_moves.remove(&old) {
            self.latest_moves.insert(new.clone(), latest);
        }
        self.log.clear(&update);

        let task = store
            .task(&new)
            .cloned()
            .ok_or_else(|| BoardError::task_not_found(&new))?;
        Ok(SyncOutcome::Created { task })
    }

    fn confirm_column_create(
        &mut self,
        store: &mut BoardStateStore,
        update: UpdateId,
        local: LocalId,
        created: Column,
        follow_up: &mut Vec<SyncRequest>,
    ) -> SyncResult<SyncOutcome> {
        let Some(remote) = created.id.as_remote().cloned() else {
            return self.reject_update(update, BackendError::invalid_response("created column carries no server id"));
        };
        let old = ColumnKey::Local(local);
        if store.column(&old).is_none() {
            self.log.clear(&update);
            if self.abandoned.remove(&local) {
                warn!(remote = %remote, "column removed before create was confirmed; discarding server copy");
                follow_up.push(SyncRequest::DiscardColumn { column: remote });
            } else if let Some(board) = store.board() {
                debug!(remote = %remote, "column create landed after a resync; refetching");
                follow_up.push(SyncRequest::FetchBoard { board: board.id.clone() });
            }
            return Ok(SyncOutcome::Cancelled);
        }

        let new = store.replace_column_identity(local, created)?;
        self.log.rekey_column(&old, &new);
        self.log.clear(&update);

        let column = store
            .column(&new)
            .cloned()
            .ok_or_else(|| BoardError::column_not_found(&new))?;
        Ok(SyncOutcome::ColumnCreated { column })
    }

    fn reject(&mut self, request: SyncRequest, source: BackendError) -> SyncResult<SyncOutcome> {
        match request {
            SyncRequest::FetchBoard { board } => Err(SyncError::Resync {
                board: board.to_string(),
                source,
            }),
            SyncRequest::DiscardTask { task } => Err(discard_failed(task.to_string(), source)),
            SyncRequest::DiscardColumn { column } => Err(discard_failed(column.to_string(), source)),
            SyncRequest::MoveTask { update, .. }
            | SyncRequest::CreateTask { update, .. }
            | SyncRequest::CreateColumn { update, .. }
            | SyncRequest::UpdateTask { update, .. }
            | SyncRequest::DeleteTask { update, .. } => self.reject_update(update, source),
        }
    }

    /// Mark an entry failed. An entry that is already gone needs nothing.
    fn reject_update(&mut self, update: UpdateId, source: BackendError) -> SyncResult<SyncOutcome> {
        if self.log.get(&update).is_none() {
            debug!(update = %update, error = %source, "failure for a cleared update; ignoring");
            return Ok(SyncOutcome::Cancelled);
        }
        warn!(update = %update, error = %source, "persist failed");
        self.log.mark_failed(&update, &source);
        Err(SyncError::Backend { update, source })
    }

    /// Clear an entry whose subject no longer exists locally
    fn cancel(&mut self, update: UpdateId) -> SyncOutcome {
        debug!(update = %update, "subject gone; dropping update");
        self.log.clear(&update);
        SyncOutcome::Cancelled
    }

    /// Clear an entry that needs no further work
    fn confirm(&mut self, update: UpdateId) -> SyncOutcome {
        self.log.clear(&update);
        SyncOutcome::Confirmed
    }
}

fn discard_failed(remote: String, source: BackendError) -> SyncError {
    warn!(remote = %remote, error = %source, "failed to discard orphaned server copy");
    SyncError::Discard { remote, source }
}
