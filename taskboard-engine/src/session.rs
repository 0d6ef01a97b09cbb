//! BoardSession - one board screen's worth of engine
//!
//! Owns the store, the drag machine and the gateway, and runs each user
//! intent through them in the fixed order: mutate the store, record the
//! optimistic update, queue the backend call. Intents never wait on the
//! network. Queued calls sit in the outbox until the host sends them, either
//! one at a time with [`next_request`](BoardSession::next_request) and
//! [`complete`](BoardSession::complete) or all at once with
//! [`flush`](BoardSession::flush). Dropping the session cancels any drag.

use crate::config::SyncConfig;
use crate::drag::{DragSession, PointerOffset};
use crate::error::{BoardError, SessionError};
use crate::optimistic::{OptimisticUpdate, UpdateId};
use crate::store::BoardStateStore;
use crate::sync::{BoardBackend, Dispatch, SyncGateway, SyncOutcome, SyncRequest, SyncResponse};
use crate::types::{BoardId, ColumnDraft, ColumnKey, TaskDraft, TaskKey, TaskPatch};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

pub struct BoardSession<B> {
    store: BoardStateStore,
    drag: DragSession,
    gateway: SyncGateway<B>,
    outbox: VecDeque<SyncRequest>,
}

impl<B: BoardBackend> BoardSession<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, SyncConfig::default())
    }

    pub fn with_config(backend: B, config: SyncConfig) -> Self {
        Self {
            store: BoardStateStore::new(),
            drag: DragSession::new(),
            gateway: SyncGateway::with_config(backend, config),
            outbox: VecDeque::new(),
        }
    }

    pub fn store(&self) -> &BoardStateStore {
        &self.store
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn gateway(&self) -> &SyncGateway<B> {
        &self.gateway
    }

    pub fn backend(&self) -> &B {
        self.gateway.backend()
    }

    /// Fetch a board and make it the session's state
    pub async fn load(&mut self, board: &BoardId) -> Result<()> {
        self.drag.cancel();
        let response = SyncRequest::FetchBoard { board: board.clone() }
            .send(self.gateway.backend())
            .await;
        self.complete(response)?;
        Ok(())
    }

    /// Refetch the loaded board, discarding unconfirmed local changes
    pub async fn resync(&mut self) -> Result<()> {
        let board = self.board_id()?;
        self.load(&board).await
    }

    pub fn select_task(&mut self, task: &TaskKey) -> Result<()> {
        Ok(self.store.select_task(task)?)
    }

    pub fn clear_selection(&mut self) {
        self.store.clear_selection();
    }

    // =========================================================================
    // Drag
    // =========================================================================

    pub fn drag_start(&mut self, task: &TaskKey, column: &ColumnKey) -> Result<()> {
        Ok(self.drag.start_drag(&self.store, task, column)?)
    }

    pub fn drag_activate(&mut self) -> Result<()> {
        Ok(self.drag.activate()?)
    }

    pub fn drag_update(&mut self, offset: PointerOffset) -> Result<bool> {
        Ok(self.drag.update_position(offset)?)
    }

    pub fn drag_over(&mut self, column: ColumnKey, index: usize) -> Result<()> {
        Ok(self.drag.set_drop_target(column, index)?)
    }

    pub fn drag_cancel(&mut self) -> bool {
        self.drag.cancel()
    }

    /// Finish the drag. A committed drag is applied to the store and its move
    /// queued; `None` means nothing moved.
    pub fn drag_end(&mut self) -> Result<Option<SyncOutcome>> {
        let Some(commit) = self.drag.end_drag()? else {
            return Ok(None);
        };
        let receipt = self.store.move_task(
            &commit.task,
            &commit.source_column,
            &commit.target_column,
            commit.target_index,
        )?;
        if receipt.is_noop() {
            debug!(task = %commit.task, "drop resolved to the original slot");
            return Ok(None);
        }

        let update = self.gateway.record(OptimisticUpdate::moved(&receipt));
        let dispatch = self
            .gateway
            .persist_move(update, &receipt.task, &receipt.to_column, receipt.to_index);
        Ok(Some(self.dispatch(dispatch)))
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Add a task optimistically and queue its create. The returned key is
    /// local until the create is confirmed.
    pub fn create_task(&mut self, column: &ColumnKey, draft: TaskDraft) -> Result<(TaskKey, SyncOutcome)> {
        let task = self.store.add_task(column, &draft)?;
        let local = task.id.as_local().ok_or_else(|| {
            BoardError::invariant(format!("new task {} has a server identity", task.id))
        })?;
        let update = self.gateway.record(OptimisticUpdate::added(&task));
        let dispatch = self.gateway.persist_create(update, local, column, &draft);
        Ok((task.id, self.dispatch(dispatch)))
    }

    /// Add a column optimistically and queue its create
    pub fn create_column(&mut self, draft: ColumnDraft) -> Result<(ColumnKey, SyncOutcome)> {
        let board = self.board_id()?;
        let column = self.store.add_column(&draft)?;
        let local = column.id.as_local().ok_or_else(|| {
            BoardError::invariant(format!("new column {} has a server identity", column.id))
        })?;
        let update = self.gateway.record(OptimisticUpdate::column_added(&column));
        let dispatch = self.gateway.persist_column_create(update, local, &board, &draft);
        Ok((column.id, self.dispatch(dispatch)))
    }

    pub fn edit_task(&mut self, task: &TaskKey, patch: TaskPatch) -> Result<SyncOutcome> {
        let (column, _) = self
            .store
            .locate(task)
            .ok_or_else(|| BoardError::task_not_found(task))?;
        let previous = self.store.update_task(task, &column, &patch)?;
        let update = self.gateway.record(OptimisticUpdate::updated(previous));
        let dispatch = self.gateway.persist_update(update, task, &patch);
        Ok(self.dispatch(dispatch))
    }

    pub fn remove_task(&mut self, task: &TaskKey) -> Result<SyncOutcome> {
        let (column, _) = self
            .store
            .locate(task)
            .ok_or_else(|| BoardError::task_not_found(task))?;
        if self.drag.state().is_some_and(|s| s.task_key() == task) {
            self.drag.cancel();
        }
        let (removed, index) = self.store.delete_task(task, &column)?;
        let update = self
            .gateway
            .record(OptimisticUpdate::deleted(column, index, removed));
        let dispatch = self.gateway.persist_delete(update, task);
        Ok(self.dispatch(dispatch))
    }

    // =========================================================================
    // Outbox
    // =========================================================================

    /// Calls waiting to be sent, oldest first
    pub fn outbox(&self) -> impl Iterator<Item = &SyncRequest> {
        self.outbox.iter()
    }

    /// Take the oldest unsent call. Its response goes to
    /// [`complete`](Self::complete).
    pub fn next_request(&mut self) -> Option<SyncRequest> {
        self.outbox.pop_front()
    }

    /// Take every unsent call, e.g. to send them concurrently
    pub fn take_requests(&mut self) -> Vec<SyncRequest> {
        self.outbox.drain(..).collect()
    }

    /// Fold a response into the board. Whatever it unblocks joins the
    /// outbox. When the backend placed a moved task elsewhere a refetch is
    /// queued so the server's order wins, and `Diverged` is still reported.
    pub fn complete(&mut self, response: SyncResponse) -> Result<SyncOutcome> {
        let applied = self.gateway.apply(&mut self.store, response);
        self.outbox.extend(applied.follow_up);
        let outcome = applied.outcome?;
        if let SyncOutcome::Diverged { task, .. } = &outcome {
            info!(task = %task, "server placement differs; queueing resync");
            self.request_resync()?;
        }
        Ok(outcome)
    }

    /// Send every queued call in order, including any the responses release,
    /// and return each result
    pub async fn flush(&mut self) -> Vec<Result<SyncOutcome>> {
        let mut results = Vec::new();
        while let Some(request) = self.outbox.pop_front() {
            let response = request.send(self.gateway.backend()).await;
            results.push(self.complete(response));
        }
        results
    }

    /// Queue a refetch of the loaded board
    pub fn request_resync(&mut self) -> Result<()> {
        let board = self.board_id()?;
        let fetch = SyncRequest::FetchBoard { board };
        if !self.outbox.contains(&fetch) {
            self.outbox.push_back(fetch);
        }
        Ok(())
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    pub fn retry(&mut self, update: &UpdateId) -> Result<SyncOutcome> {
        let dispatch = self.gateway.retry(&self.store, update)?;
        Ok(self.dispatch(dispatch))
    }

    pub fn rollback(&mut self, update: &UpdateId) -> Result<()> {
        let released = self.gateway.rollback(&mut self.store, update)?;
        self.outbox.extend(released);
        Ok(())
    }

    pub fn rollback_failed(&mut self) -> Result<Vec<UpdateId>> {
        let rollback = self.gateway.rollback_failed(&mut self.store)?;
        self.outbox.extend(rollback.follow_up);
        Ok(rollback.rolled_back)
    }

    fn dispatch(&mut self, dispatch: Dispatch) -> SyncOutcome {
        match dispatch {
            Dispatch::Send(request) => {
                debug!(request = request.name(), "queued");
                self.outbox.push_back(request);
                SyncOutcome::Queued
            }
            Dispatch::Settled(outcome) => outcome,
        }
    }

    fn board_id(&self) -> Result<BoardId> {
        self.store
            .board()
            .map(|b| b.id.clone())
            .ok_or_else(|| BoardError::NotLoaded.into())
    }
}

impl<B> Drop for BoardSession<B> {
    fn drop(&mut self) {
        self.drag.cancel();
    }
}
