//! HTTP implementation of the collaborator over the project REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{Collaborator, ProjectId};
use crate::core::task::{Task, TaskId};
use crate::session::SessionContext;
use crate::{plog_debug, plog_warn, Error, Result};

/// Error body convention used by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// REST client authenticated with the session's bearer token.
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    client: Client,
    base_url: String,
    session: SessionContext,
}

impl HttpCollaborator {
    pub fn new(base_url: &str, session: SessionContext, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pert/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/tasks{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::Network(format!("{}: {}", what, e)))?;
        let response = check_status(response, what).await?;
        Ok(response.json().await?)
    }
}

/// Map a non-success response to the error taxonomy.
async fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });
    plog_warn!("{} failed: HTTP {} {}", what, status.as_u16(), message);

    Err(match status {
        StatusCode::UNAUTHORIZED => Error::Unauthorized,
        StatusCode::NOT_FOUND => Error::NotFound(format!("{}: {}", what, message)),
        _ => Error::Status {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl Collaborator for HttpCollaborator {
    async fn tasks_for_project(&self, project: &ProjectId) -> Result<Vec<Task>> {
        let url = self.url(&format!("/project/{}", project));
        plog_debug!("GET {}", url);
        self.send(self.client.get(&url), "Fetch tasks").await
    }

    async fn critical_path(&self, project: &ProjectId) -> Result<Vec<TaskId>> {
        let url = self.url(&format!("/project/{}/critical-path", project));
        plog_debug!("GET {}", url);
        self.send(self.client.get(&url), "Fetch critical path").await
    }

    async fn critical_tasks(&self, project: &ProjectId) -> Result<Vec<Task>> {
        let url = self.url(&format!("/project/{}/critical-tasks", project));
        plog_debug!("GET {}", url);
        self.send(self.client.get(&url), "Fetch critical tasks").await
    }

    async fn add_dependency(&self, task: &TaskId, prerequisite: &TaskId) -> Result<Task> {
        let url = self.url(&format!("/{}/dependencies/{}", task, prerequisite));
        plog_debug!("POST {}", url);
        self.send(self.client.post(&url), "Add dependency").await
    }

    async fn remove_dependency(&self, task: &TaskId, prerequisite: &TaskId) -> Result<Task> {
        let url = self.url(&format!("/{}/dependencies/{}", task, prerequisite));
        plog_debug!("DELETE {}", url);
        self.send(self.client.delete(&url), "Remove dependency").await
    }
}
