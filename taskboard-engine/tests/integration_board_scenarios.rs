//! Integration tests for the board scenarios a UI relies on

use std::sync::Arc;
use taskboard_engine::{
    group_by_column, test_support::MemoryBackend, Board, BoardStateStore, Column, ColumnKey, Dispatch, DragSession,
    OptimisticUpdate, SyncGateway, SyncOutcome, Task, TaskDraft, TaskKey,
};

fn col(id: &str) -> ColumnKey {
    ColumnKey::from(id)
}

fn placement(store: &BoardStateStore, column: &str) -> Vec<(String, usize)> {
    store
        .tasks(&col(column))
        .iter()
        .map(|t| (t.id.to_string(), t.position))
        .collect()
}

fn board(columns: &[&str], tasks: Vec<Task>) -> BoardStateStore {
    let mut store = BoardStateStore::new();
    store.load_board(
        Board::new("b1", "Scenarios"),
        columns
            .iter()
            .enumerate()
            .map(|(i, id)| Column::new(*id, "b1", *id).at(i))
            .collect(),
        group_by_column(tasks),
    );
    store
}

#[test]
fn test_move_first_task_to_empty_column() {
    let mut store = board(
        &["A", "B"],
        vec![Task::new("t1", "A", "one").at(0), Task::new("t2", "A", "two").at(1)],
    );

    store
        .move_task(&TaskKey::from("t1"), &col("A"), &col("B"), 0)
        .unwrap();

    assert_eq!(placement(&store, "A"), vec![("t2".to_string(), 0)]);
    assert_eq!(placement(&store, "B"), vec![("t1".to_string(), 0)]);
    store.check_invariants().unwrap();
}

#[tokio::test]
async fn test_add_then_confirm_leaves_no_trace_of_local_identity() {
    let backend = Arc::new(
        MemoryBackend::new("b1")
            .with_column("A")
            .with_task("t1", "A", "one"),
    );
    let mut gateway = SyncGateway::new(backend);
    let mut store = board(&["A"], vec![Task::new("t1", "A", "one")]);

    let draft = TaskDraft::new("x");
    let temp = store.add_task(&col("A"), &draft).unwrap();
    assert!(temp.id.is_local());
    assert_eq!(temp.position, 1);

    let update = gateway.record(OptimisticUpdate::added(&temp));
    let Dispatch::Send(request) = gateway.persist_create(update, temp.id.as_local().unwrap(), &col("A"), &draft)
    else {
        panic!("create into a confirmed column should be sent");
    };
    let response = request.send(gateway.backend()).await;
    let applied = gateway.apply(&mut store, response);

    let Ok(SyncOutcome::Created { task }) = applied.outcome else {
        panic!("expected Created, got {:?}", applied.outcome);
    };
    assert!(applied.follow_up.is_empty());
    assert_eq!(task.id, TaskKey::from("srv-task-1"));
    assert_eq!(
        placement(&store, "A"),
        vec![("t1".to_string(), 0), ("srv-task-1".to_string(), 1)]
    );
    assert!(store.task(&temp.id).is_none());
    assert!(store.tasks(&col("A")).iter().all(|t| t.id.is_remote()));
    assert!(gateway.log().is_empty());
}

#[test]
fn test_delete_column_moves_tasks_to_fallback_column() {
    let mut store = board(
        &["A", "B", "C"],
        vec![
            Task::new("a1", "A", "a1"),
            Task::new("b1", "B", "b1").at(0),
            Task::new("b2", "B", "b2").at(1),
        ],
    );

    let removal = store.delete_column(&col("B")).unwrap();

    let order: Vec<&ColumnKey> = store.board().unwrap().columns.iter().collect();
    assert_eq!(order, vec![&col("A"), &col("C")]);
    assert!(store.column(&col("B")).is_none());

    // Former B tasks land, in order, at the end of the first remaining column
    assert_eq!(removal.fallback, Some(col("A")));
    assert_eq!(
        placement(&store, "A"),
        vec![("a1".to_string(), 0), ("b1".to_string(), 1), ("b2".to_string(), 2)]
    );
    assert_eq!(store.task(&TaskKey::from("b2")).unwrap().column_id, col("A"));
    assert_eq!(store.column(&col("C")).unwrap().position, 1);
    store.check_invariants().unwrap();
}

#[test]
fn test_delete_first_column_falls_back_to_next() {
    let mut store = board(&["A", "B"], vec![Task::new("a1", "A", "a1")]);
    let removal = store.delete_column(&col("A")).unwrap();
    assert_eq!(removal.fallback, Some(col("B")));
    assert_eq!(placement(&store, "B"), vec![("a1".to_string(), 0)]);
}

#[test]
fn test_delete_empty_last_column_is_allowed() {
    let mut store = board(&["A"], vec![]);
    let removal = store.delete_column(&col("A")).unwrap();
    assert!(removal.fallback.is_none());
    assert!(store.columns().is_empty());
    store.check_invariants().unwrap();
}

#[test]
fn test_round_trip_move_restores_both_columns() {
    let mut store = board(
        &["A", "B"],
        vec![
            Task::new("t1", "A", "one").at(0),
            Task::new("t2", "A", "two").at(1),
            Task::new("t3", "A", "three").at(2),
            Task::new("u1", "B", "u1").at(0),
            Task::new("u2", "B", "u2").at(1),
        ],
    );
    let a_before = placement(&store, "A");
    let b_before = placement(&store, "B");

    let receipt = store
        .move_task(&TaskKey::from("t2"), &col("A"), &col("B"), 1)
        .unwrap();
    store
        .move_task(&TaskKey::from("t2"), &col("B"), &col("A"), receipt.from_index)
        .unwrap();

    assert_eq!(placement(&store, "A"), a_before);
    assert_eq!(placement(&store, "B"), b_before);
}

#[test]
fn test_drag_never_left_active() {
    let store = board(&["A", "B"], vec![Task::new("t1", "A", "one")]);
    let mut drag = DragSession::new();

    drag.start_drag(&store, &TaskKey::from("t1"), &col("A"))
        .unwrap();
    drag.activate().unwrap();
    for index in 0..25 {
        let column = if index % 2 == 0 { "A" } else { "B" };
        drag.set_drop_target(col(column), index).unwrap();
    }
    drag.end_drag().unwrap();
    assert!(drag.is_idle());

    drag.start_drag(&store, &TaskKey::from("t1"), &col("A"))
        .unwrap();
    drag.activate().unwrap();
    drag.set_drop_target(col("B"), 0).unwrap();
    drag.cancel();
    assert!(drag.is_idle());
    assert!(drag.state().is_none());
}
