//! reqwest-backed [`BoardBackend`]

use crate::dto::{
    BoardDto, ColumnDto, CreateColumnRequest, CreateTaskRequest, ErrorBody, MoveTaskRequest, TaskDto,
    UpdateTaskRequest,
};
use crate::error::HttpClientError;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use taskboard_engine::{
    BackendError, BoardBackend, BoardId, BoardSnapshot, Column, ColumnDraft, ColumnId, SyncConfig, Task, TaskDraft,
    TaskId, TaskPatch,
};
use tracing::{debug, instrument, warn};
use url::Url;

/// Talks to the board REST API.
///
/// Endpoints are resolved relative to `base_url`:
///
/// | Operation       | Request                       |
/// |-----------------|-------------------------------|
/// | fetch board     | `GET boards/{id}`             |
/// | move task       | `PATCH tasks/{id}`            |
/// | create task     | `POST columns/{id}/tasks`     |
/// | create column   | `POST boards/{id}/columns`    |
/// | update task     | `PATCH tasks/{id}`            |
/// | delete task     | `DELETE tasks/{id}`           |
/// | delete column   | `DELETE columns/{id}`         |
#[derive(Debug, Clone)]
pub struct HttpBoardBackend {
    client: Client,
    base_url: Url,
    timeout_ms: u64,
}

impl HttpBoardBackend {
    /// Build a backend from loaded configuration
    pub fn new(config: &SyncConfig) -> Result<Self, HttpClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| HttpClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(HttpClientError::NotABase(config.base_url.clone()));
        }
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(&config.user_agent)
            .build()?;
        debug!(base_url = %base_url, timeout_ms = config.request_timeout_ms, "http board backend ready");
        Ok(Self {
            client,
            base_url,
            timeout_ms: config.request_timeout_ms,
        })
    }

    /// Build a backend from `taskboard.toml` and `TASKBOARD_*` variables
    pub fn from_env() -> Result<Self, HttpClientError> {
        Self::new(&SyncConfig::load()?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve path segments under the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client.request(method, self.endpoint(segments))
    }

    /// Send and map transport failures and non-success statuses
    async fn send(&self, request: RequestBuilder, resource: &str, id: &str) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        debug!(%status, resource, id, "backend responded");
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&raw)
            .unwrap_or_default()
            .message_or(&raw);
        warn!(%status, resource, id, message = %message, "backend rejected request");
        Err(match status {
            StatusCode::NOT_FOUND => BackendError::not_found(resource, id),
            StatusCode::CONFLICT => BackendError::Conflict { message },
            _ => BackendError::Rejected {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
        id: &str,
    ) -> Result<T, BackendError> {
        let response = self.send(request, resource, id).await?;
        let body = response.bytes().await.map_err(|e| self.map_transport(e))?;
        serde_json::from_slice(&body)
            .map_err(|e| BackendError::invalid_response(format!("{} {}: {}", resource, id, e)))
    }

    fn map_transport(&self, error: reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout {
                elapsed_ms: self.timeout_ms,
            }
        } else {
            BackendError::transport(error.to_string())
        }
    }
}

#[async_trait]
impl BoardBackend for HttpBoardBackend {
    #[instrument(skip_all, fields(board = %board))]
    async fn fetch_board(&self, board: &BoardId) -> Result<BoardSnapshot, BackendError> {
        let request = self.request(Method::GET, &["boards", board.as_str()]);
        let dto: BoardDto = self.send_json(request, "board", board.as_str()).await?;
        Ok(BoardSnapshot::from(dto))
    }

    #[instrument(skip_all, fields(task = %task, column = %column))]
    async fn move_task(&self, task: &TaskId, column: &ColumnId, position: usize) -> Result<Task, BackendError> {
        let request = self
            .request(Method::PATCH, &["tasks", task.as_str()])
            .json(&MoveTaskRequest {
                column_id: column.as_str(),
                position,
            });
        let dto: TaskDto = self.send_json(request, "task", task.as_str()).await?;
        Ok(Task::from(dto))
    }

    #[instrument(skip_all, fields(column = %column))]
    async fn create_task(&self, column: &ColumnId, draft: &TaskDraft) -> Result<Task, BackendError> {
        let request = self
            .request(Method::POST, &["columns", column.as_str(), "tasks"])
            .json(&CreateTaskRequest::from(draft));
        let dto: TaskDto = self.send_json(request, "column", column.as_str()).await?;
        Ok(Task::from(dto))
    }

    #[instrument(skip_all, fields(board = %board))]
    async fn create_column(&self, board: &BoardId, draft: &ColumnDraft) -> Result<Column, BackendError> {
        let request = self
            .request(Method::POST, &["boards", board.as_str(), "columns"])
            .json(&CreateColumnRequest::from(draft));
        let dto: ColumnDto = self.send_json(request, "board", board.as_str()).await?;
        Ok(dto.into_column(board))
    }

    #[instrument(skip_all, fields(task = %task))]
    async fn update_task(&self, task: &TaskId, patch: &TaskPatch) -> Result<Task, BackendError> {
        let request = self
            .request(Method::PATCH, &["tasks", task.as_str()])
            .json(&UpdateTaskRequest::from(patch));
        let dto: TaskDto = self.send_json(request, "task", task.as_str()).await?;
        Ok(Task::from(dto))
    }

    #[instrument(skip_all, fields(task = %task))]
    async fn delete_task(&self, task: &TaskId) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, &["tasks", task.as_str()]);
        self.send(request, "task", task.as_str()).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(column = %column))]
    async fn delete_column(&self, column: &ColumnId) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, &["columns", column.as_str()]);
        self.send(request, "column", column.as_str()).await?;
        Ok(())
    }
}
