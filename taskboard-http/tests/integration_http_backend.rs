//! Integration tests for the REST backend against a mock server

use serde_json::{json, Value};
use std::time::Duration;
use taskboard_engine::{
    BackendError, BoardBackend, BoardId, BoardSession, BoardStateStore, ColumnDraft, ColumnId, ColumnKey, Dispatch,
    OptimisticUpdate, SyncConfig, SyncGateway, SyncOutcome, TaskDraft, TaskId, TaskKey, TaskPatch,
};
use taskboard_http::HttpBoardBackend;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> SyncConfig {
    SyncConfig {
        base_url: format!("{}/api/", server.uri()),
        request_timeout_ms: 2_000,
        user_agent: "taskboard-tests".to_string(),
        ..SyncConfig::default()
    }
}

fn backend(server: &MockServer) -> HttpBoardBackend {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    HttpBoardBackend::new(&config(server)).unwrap()
}

fn task_json(id: &str, column: &str, position: usize, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "columnId": column,
        "position": position,
        "createdAt": "2024-05-01T10:00:00Z",
        "updatedAt": "2024-05-01T10:00:00Z"
    })
}

fn board_json() -> Value {
    json!({
        "id": "b1",
        "name": "Roadmap",
        "columns": [
            {"id": "A", "name": "To Do", "position": 0},
            {"id": "B", "name": "Done", "position": 1}
        ],
        "tasks": [
            task_json("t2", "A", 5, "two"),
            task_json("t1", "A", 2, "one")
        ]
    })
}

#[tokio::test]
async fn test_fetch_board_loads_normalized_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/boards/b1"))
        .and(header("user-agent", "taskboard-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(board_json()))
        .expect(1)
        .mount(&server)
        .await;

    let mut gateway = SyncGateway::new(backend(&server));
    let mut store = BoardStateStore::new();
    gateway
        .resync(&mut store, &BoardId::from("b1"))
        .await
        .unwrap();

    assert_eq!(store.board().unwrap().name, "Roadmap");
    let titles: Vec<(&str, usize)> = store
        .tasks(&ColumnKey::from("A"))
        .iter()
        .map(|t| (t.title.as_str(), t.position))
        .collect();
    assert_eq!(titles, vec![("one", 0), ("two", 1)]);
    store.check_invariants().unwrap();
}

#[tokio::test]
async fn test_move_sends_column_and_position() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/tasks/t1"))
        .and(body_json(json!({"columnId": "B", "position": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json("t1", "B", 0, "one")))
        .expect(1)
        .mount(&server)
        .await;

    let task = backend(&server)
        .move_task(&TaskId::from("t1"), &ColumnId::from("B"), 0)
        .await
        .unwrap();
    assert_eq!(task.column_id, ColumnKey::from("B"));
    assert_eq!(task.position, 0);
}

#[tokio::test]
async fn test_update_sends_only_patched_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/tasks/t1"))
        .and(body_json(json!({"title": "renamed", "dueDate": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json("t1", "A", 0, "renamed")))
        .expect(1)
        .mount(&server)
        .await;

    let patch = TaskPatch::new().with_title("renamed").with_due_date(None);
    let task = backend(&server)
        .update_task(&TaskId::from("t1"), &patch)
        .await
        .unwrap();
    assert_eq!(task.title, "renamed");
}

#[tokio::test]
async fn test_create_column_posts_draft() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/boards/b1/columns"))
        .and(body_json(json!({"name": "Review", "wipLimit": 3})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "c9",
            "name": "Review",
            "position": 2,
            "wipLimit": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let column = backend(&server)
        .create_column(&BoardId::from("b1"), &ColumnDraft::new("Review").with_wip_limit(3))
        .await
        .unwrap();
    assert_eq!(column.id, ColumnKey::from("c9"));
    assert_eq!(column.board_id, BoardId::from("b1"));
    assert_eq!(column.wip_limit, Some(3));
}

#[tokio::test]
async fn test_delete_accepts_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/t1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server)
        .delete_task(&TaskId::from("t1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_status_codes_map_to_backend_errors() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/tasks/t1"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "task was moved"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/boards/b1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let backend = backend(&server);

    let err = backend.delete_task(&TaskId::from("gone")).await.unwrap_err();
    assert_eq!(err, BackendError::not_found("task", "gone"));

    let err = backend
        .move_task(&TaskId::from("t1"), &ColumnId::from("B"), 0)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BackendError::Conflict {
            message: "task was moved".into()
        }
    );

    let err = backend.fetch_board(&BoardId::from("b1")).await.unwrap_err();
    assert_eq!(
        err,
        BackendError::Rejected {
            status: 503,
            message: "maintenance".into()
        }
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/boards/b1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let err = backend(&server)
        .fetch_board(&BoardId::from("b1"))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/boards/b1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(board_json())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = SyncConfig {
        request_timeout_ms: 50,
        ..config(&server)
    };
    let err = HttpBoardBackend::new(&config)
        .unwrap()
        .fetch_board(&BoardId::from("b1"))
        .await
        .unwrap_err();
    assert_eq!(err, BackendError::Timeout { elapsed_ms: 50 });
}

#[tokio::test]
async fn test_create_through_gateway_swaps_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/boards/b1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(board_json()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/columns/B/tasks"))
        .and(body_json(json!({"title": "x", "status": "todo", "priority": "medium"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(task_json("srv1", "B", 0, "x")))
        .expect(1)
        .mount(&server)
        .await;

    let mut gateway = SyncGateway::new(backend(&server));
    let mut store = BoardStateStore::new();
    gateway
        .resync(&mut store, &BoardId::from("b1"))
        .await
        .unwrap();

    let column = ColumnKey::from("B");
    let draft = TaskDraft::new("x");
    let temp = store.add_task(&column, &draft).unwrap();
    let update = gateway.record(OptimisticUpdate::added(&temp));
    let Dispatch::Send(request) = gateway.persist_create(update, temp.id.as_local().unwrap(), &column, &draft) else {
        panic!("create into a confirmed column should be sent");
    };
    let response = request.send(gateway.backend()).await;
    let applied = gateway.apply(&mut store, response);

    assert!(matches!(applied.outcome, Ok(SyncOutcome::Created { .. })));
    let ids: Vec<TaskKey> = store.tasks(&column).iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids, vec![TaskKey::from("srv1")]);
    assert!(gateway.log().is_empty());
}

#[tokio::test]
async fn test_session_drag_persists_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/boards/b1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(board_json()))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/tasks/t1"))
        .and(body_json(json!({"columnId": "B", "position": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json("t1", "B", 0, "one")))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = BoardSession::with_config(backend(&server), config(&server));
    session.load(&BoardId::from("b1")).await.unwrap();

    let t1 = TaskKey::from("t1");
    session.drag_start(&t1, &ColumnKey::from("A")).unwrap();
    session.drag_activate().unwrap();
    session.drag_over(ColumnKey::from("B"), 0).unwrap();
    assert_eq!(session.drag_end().unwrap(), Some(SyncOutcome::Queued));

    let results = session.flush().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_ref().unwrap(), &SyncOutcome::Confirmed);
    assert_eq!(session.store().locate(&t1), Some((ColumnKey::from("B"), 0)));
    assert!(session.gateway().log().is_empty());
}
