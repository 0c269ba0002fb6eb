//! # HTTP Task Store
//!
//! `reqwest`-backed [`TaskStore`] implementation for the task service REST
//! API, plus its connection configuration.
//!
//! Response handling decodes success bodies from text so that transport
//! failures and malformed payloads surface as distinct error variants.
//! Non-success statuses are classified by [`SyncError::from_status`].

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{SyncError, SyncResult};
use crate::models::{NewTask, Task, TaskUpdate};

use super::TaskStore;

/// Connection settings for the task service.
///
/// # Examples
///
/// ```rust
/// use stagecheck_client::TaskStoreConfig;
///
/// let config = TaskStoreConfig::default();
/// assert_eq!(config.base_url, "http://localhost:8080");
/// assert_eq!(config.timeout_ms, 30000);
/// ```
#[derive(Debug, Clone)]
pub struct TaskStoreConfig {
    /// Base URL for the task service (e.g., "<http://localhost:8080>")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Bearer token attached to every request (if required)
    pub auth_token: Option<String>,
}

impl Default for TaskStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 30000,
            auth_token: None,
        }
    }
}

impl From<&StoreConfig> for TaskStoreConfig {
    fn from(config: &StoreConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_ms: config.timeout_ms,
            auth_token: config.auth_token.clone(),
        }
    }
}

/// HTTP client for the task service
///
/// Stateless request/response translator: one store call per method, no
/// caching and no retries. Construction validates the base URL and bakes
/// authentication into the client's default headers.
#[derive(Clone)]
pub struct HttpTaskStore {
    client: Client,
    config: TaskStoreConfig,
    base_url: Url,
}

impl std::fmt::Debug for HttpTaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTaskStore")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("auth_enabled", &self.config.auth_token.is_some())
            .finish()
    }
}

impl HttpTaskStore {
    /// Create a new task store client with the given configuration
    ///
    /// Returns a configured `HttpTaskStore` or an error if the configuration
    /// is invalid (malformed base URL or unusable auth token).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use stagecheck_client::{HttpTaskStore, TaskStoreConfig};
    ///
    /// let store = HttpTaskStore::new(TaskStoreConfig::default()).unwrap();
    /// ```
    pub fn new(config: TaskStoreConfig) -> SyncResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SyncError::config_error(format!("invalid base URL: {e}")))?;

        let mut client_builder = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("stagecheck-client/{}", env!("CARGO_PKG_VERSION")));

        if let Some(token) = &config.auth_token {
            let mut default_headers = reqwest::header::HeaderMap::new();
            default_headers.insert(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {token}")
                    .parse()
                    .map_err(|e| SyncError::config_error(format!("invalid auth token: {e}")))?,
            );
            client_builder = client_builder.default_headers(default_headers);
        }

        let client = client_builder
            .build()
            .map_err(|e| SyncError::config_error(format!("failed to create HTTP client: {e}")))?;

        info!(
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            auth_enabled = config.auth_token.is_some(),
            "Created task store client"
        );

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Check the liveness of the task service
    ///
    /// GET /health
    pub async fn health_check(&self) -> SyncResult<()> {
        let url = self
            .base_url
            .join("/health")
            .map_err(|e| SyncError::config_error(format!("failed to construct URL: {e}")))?;

        debug!(url = %url, "Performing task service health check");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            debug!("Task service health check passed");
            Ok(())
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %message, "Task service health check failed");
            Err(SyncError::from_status(status.as_u16(), message))
        }
    }

    fn collection_url(&self, project_id: Uuid) -> SyncResult<Url> {
        self.base_url
            .join(&format!("/v1/projects/{project_id}/tasks"))
            .map_err(|e| SyncError::config_error(format!("failed to construct URL: {e}")))
    }

    fn task_url(&self, project_id: Uuid, task_id: Uuid) -> SyncResult<Url> {
        self.base_url
            .join(&format!("/v1/projects/{project_id}/tasks/{task_id}"))
            .map_err(|e| SyncError::config_error(format!("failed to construct URL: {e}")))
    }

    /// Decode a response body, classifying non-success statuses.
    async fn handle_response<T: DeserializeOwned>(
        response: Response,
        context: &'static str,
    ) -> SyncResult<T> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            let parsed = serde_json::from_str::<T>(&body)?;
            Ok(parsed)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, context = %context, error = %message, "Store request failed");
            Err(SyncError::from_status(status.as_u16(), message))
        }
    }

    /// Confirm a bodyless response, classifying non-success statuses.
    async fn confirm_response(response: Response, context: &'static str) -> SyncResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, context = %context, error = %message, "Store request failed");
            Err(SyncError::from_status(status.as_u16(), message))
        }
    }
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list_tasks(&self, project_id: Uuid) -> SyncResult<Vec<Task>> {
        let url = self.collection_url(project_id)?;
        debug!(url = %url, project_id = %project_id, "Listing tasks");

        let response = self.client.get(url).send().await?;
        let tasks: Vec<Task> = Self::handle_response(response, "list_tasks").await?;

        debug!(
            project_id = %project_id,
            task_count = tasks.len(),
            "Listed tasks"
        );
        Ok(tasks)
    }

    async fn create_task(&self, project_id: Uuid, draft: &NewTask) -> SyncResult<Task> {
        let url = self.collection_url(project_id)?;
        debug!(
            url = %url,
            project_id = %project_id,
            stage = %draft.stage,
            origin = %draft.origin,
            "Creating task"
        );

        let response = self.client.post(url).json(draft).send().await?;
        let created: Task = Self::handle_response(response, "create_task").await?;

        info!(
            project_id = %project_id,
            task_id = %created.id,
            "Created task"
        );
        Ok(created)
    }

    async fn update_task(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        update: &TaskUpdate,
    ) -> SyncResult<Task> {
        let url = self.task_url(project_id, task_id)?;
        debug!(url = %url, project_id = %project_id, task_id = %task_id, "Updating task");

        let response = self.client.put(url).json(update).send().await?;
        let updated: Task = Self::handle_response(response, "update_task").await?;

        info!(
            project_id = %project_id,
            task_id = %task_id,
            "Updated task"
        );
        Ok(updated)
    }

    async fn delete_task(&self, project_id: Uuid, task_id: Uuid) -> SyncResult<()> {
        let url = self.task_url(project_id, task_id)?;
        debug!(url = %url, project_id = %project_id, task_id = %task_id, "Deleting task");

        let response = self.client.delete(url).send().await?;
        Self::confirm_response(response, "delete_task").await?;

        info!(
            project_id = %project_id,
            task_id = %task_id,
            "Deleted task"
        );
        Ok(())
    }
}
