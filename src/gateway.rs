use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::models::{ErrorBody, NewTodo, Todo, TodoPatch};

/// Authenticated CRUD against the todo backend. No caching, no retries.
#[async_trait]
pub trait TodoGateway: Send + Sync + 'static {
    async fn list(&self, token: &str) -> Result<Vec<Todo>, GatewayError>;
    async fn create(&self, token: &str, todo: NewTodo) -> Result<Todo, GatewayError>;
    /// `Ok(None)` when the server confirms without echoing the entry.
    async fn update(
        &self,
        token: &str,
        id: &str,
        patch: TodoPatch,
    ) -> Result<Option<Todo>, GatewayError>;
    async fn delete(&self, token: &str, id: &str) -> Result<(), GatewayError>;
}

#[derive(Clone, Debug)]
pub struct HttpGateway {
    base_url: String,
    http: Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn todos_url(&self) -> String {
        format!("{}/api/v1/todos", self.base_url)
    }

    fn todo_url(&self, id: &str) -> String {
        format!("{}/api/v1/todos/{}", self.base_url, id)
    }
}

#[async_trait]
impl TodoGateway for HttpGateway {
    async fn list(&self, token: &str) -> Result<Vec<Todo>, GatewayError> {
        let res = self
            .http
            .get(self.todos_url())
            .header(AUTHORIZATION, bearer(token))
            .send()
            .await?;
        let res = check_status(res, "Failed to fetch todos", false).await?;
        let todos: Option<Vec<Todo>> = decode_optional(res).await?;
        let todos = todos.unwrap_or_default();
        debug!(count = todos.len(), "Fetched todos");
        Ok(todos)
    }

    async fn create(&self, token: &str, todo: NewTodo) -> Result<Todo, GatewayError> {
        let res = self
            .http
            .post(self.todos_url())
            .header(AUTHORIZATION, bearer(token))
            .json(&todo)
            .send()
            .await?;
        let res = check_status(res, "Failed to add todo", false).await?;
        let todo: Todo = decode(res).await?;
        debug!(id = %todo.id, "Created todo");
        Ok(todo)
    }

    async fn update(
        &self,
        token: &str,
        id: &str,
        patch: TodoPatch,
    ) -> Result<Option<Todo>, GatewayError> {
        let res = self
            .http
            .patch(self.todo_url(id))
            .header(AUTHORIZATION, bearer(token))
            .json(&patch)
            .send()
            .await?;
        let res = check_status(res, "Failed to update todo", true).await?;
        let todo = decode_optional(res).await?;
        debug!(id, echoed = todo.is_some(), "Updated todo");
        Ok(todo)
    }

    async fn delete(&self, token: &str, id: &str) -> Result<(), GatewayError> {
        let res = self
            .http
            .delete(self.todo_url(id))
            .header(AUTHORIZATION, bearer(token))
            .send()
            .await?;
        check_status(res, "Failed to delete todo", true).await?;
        debug!(id, "Deleted todo");
        Ok(())
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Maps a non-2xx response to a [`GatewayError`], using the server's error
/// message when it sent one and `fallback` otherwise.
///
/// A 404 becomes [`GatewayError::NotFound`] only for calls that address a
/// single todo (`by_id`); elsewhere it is a plain server error.
pub(crate) async fn check_status(
    res: Response,
    fallback: &'static str,
    by_id: bool,
) -> Result<Response, GatewayError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            warn!(%status, "Request rejected by server");
            Err(GatewayError::Unauthorized)
        }
        StatusCode::NOT_FOUND if by_id => Err(GatewayError::NotFound),
        _ => {
            let body = res.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| fallback.to_string());
            warn!(%status, %message, "Request failed");
            Err(GatewayError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }
}

pub(crate) async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, GatewayError> {
    let body = res.text().await?;
    serde_json::from_str(&body).map_err(|err| GatewayError::Decode(err.to_string()))
}

/// Like [`decode`], but an empty body or a JSON `null` yields `None`.
pub(crate) async fn decode_optional<T: DeserializeOwned>(
    res: Response,
) -> Result<Option<T>, GatewayError> {
    let body = res.text().await?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&body).map_err(|err| GatewayError::Decode(err.to_string()))
}
