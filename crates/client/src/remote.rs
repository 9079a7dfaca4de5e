//! [`RemoteStore`]: the project store and moderator gate over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use goodvibes_core::auth::{current_session, AuthGateway, Session};
use goodvibes_core::error::CoreError;
use goodvibes_core::project::{NewProject, Project, ProjectOrder, ProjectPatch, ProjectStatus};
use goodvibes_core::store::{ProjectStore, VoteReceipt};
use goodvibes_core::types::{DbId, DeviceId};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// `{ "data": ... }` envelope used by the API.
#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct VoteBody<'a> {
    voter_id: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// HTTP-backed [`ProjectStore`] and [`AuthGateway`].
///
/// Moderator calls carry the access token of the current session as a
/// bearer token and fail with `Unauthorized` without one.
pub struct RemoteStore {
    client: reqwest::Client,
    config: ClientConfig,
    sessions: watch::Sender<Option<Session>>,
}

/// Build a [`RemoteStore`] for `config`, applying its request timeout.
pub fn connect(config: ClientConfig) -> Result<RemoteStore, ClientError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;
    tracing::info!(api_url = %config.api_url, "Remote store configured");
    Ok(RemoteStore::with_client(client, config))
}

impl RemoteStore {
    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self {
            client,
            config,
            sessions: watch::Sender::new(None),
        }
    }

    fn bearer(&self) -> Result<String, CoreError> {
        current_session(&self.sessions)
            .map(|s| s.access_token)
            .ok_or_else(|| CoreError::Unauthorized("Not signed in".into()))
    }

    async fn list(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: Option<&str>,
    ) -> Result<Vec<Project>, CoreError> {
        let mut request = self.client.get(self.config.endpoint(path)).query(query);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(ClientError::from)?;
        let body: DataResponse<Vec<Project>> = parse_response(response).await?;
        Ok(body.data)
    }

    // ---- private helpers ----

    fn order_query(order: ProjectOrder) -> [(&'static str, &'static str); 2] {
        [
            ("order", order.column.as_str()),
            ("direction", order.direction.as_str()),
        ]
    }
}

/// Ensure the response has a success status code, or turn it into a
/// [`ClientError::Api`] carrying the status and body text.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ClientError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl ProjectStore for RemoteStore {
    async fn insert(&self, project: &NewProject) -> Result<Project, CoreError> {
        let response = self
            .client
            .post(self.config.endpoint("/projects"))
            .json(project)
            .send()
            .await
            .map_err(ClientError::from)?;
        let body: DataResponse<Project> = parse_response(response).await?;
        tracing::info!(project_id = body.data.id, "Project submitted");
        Ok(body.data)
    }

    async fn select_by_status(
        &self,
        status: ProjectStatus,
        order: ProjectOrder,
    ) -> Result<Vec<Project>, CoreError> {
        let [column, direction] = Self::order_query(order);
        self.list(
            "/projects",
            &[("status", status.as_str()), column, direction],
            None,
        )
        .await
    }

    async fn select_by_status_and_owner(
        &self,
        status: ProjectStatus,
        owner: &DeviceId,
    ) -> Result<Vec<Project>, CoreError> {
        self.list(
            "/projects",
            &[("status", status.as_str()), ("owner_id", owner.as_str())],
            None,
        )
        .await
    }

    async fn select_all(&self, order: ProjectOrder) -> Result<Vec<Project>, CoreError> {
        let token = self.bearer()?;
        let [column, direction] = Self::order_query(order);
        self.list("/admin/projects", &[column, direction], Some(&token))
            .await
    }

    async fn update(&self, id: DbId, patch: &ProjectPatch) -> Result<(), CoreError> {
        let token = self.bearer()?;
        let response = self
            .client
            .patch(self.config.endpoint(&format!("/admin/projects/{id}")))
            .bearer_auth(token)
            .json(patch)
            .send()
            .await
            .map_err(|e| ClientError::from(e).into_core(Some(id)))?;
        ensure_success(response)
            .await
            .map_err(|e| e.into_core(Some(id)))?;
        tracing::info!(project_id = id, status = %patch.status, "Project status updated");
        Ok(())
    }

    async fn delete(&self, id: DbId) -> Result<(), CoreError> {
        let token = self.bearer()?;
        let response = self
            .client
            .delete(self.config.endpoint(&format!("/admin/projects/{id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClientError::from(e).into_core(Some(id)))?;
        ensure_success(response)
            .await
            .map_err(|e| e.into_core(Some(id)))?;
        tracing::info!(project_id = id, "Project deleted");
        Ok(())
    }

    async fn increment_vote(&self, id: DbId, voter: &DeviceId) -> Result<VoteReceipt, CoreError> {
        let response = self
            .client
            .post(self.config.endpoint(&format!("/projects/{id}/votes")))
            .json(&VoteBody {
                voter_id: voter.as_str(),
            })
            .send()
            .await
            .map_err(|e| ClientError::from(e).into_core(Some(id)))?;
        let body: DataResponse<VoteReceipt> = parse_response(response)
            .await
            .map_err(|e| e.into_core(Some(id)))?;
        Ok(body.data)
    }
}

#[async_trait]
impl AuthGateway for RemoteStore {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CoreError> {
        let response = self
            .client
            .post(self.config.endpoint("/auth/login"))
            .json(&LoginBody {
                email: email.trim(),
                password,
            })
            .send()
            .await
            .map_err(ClientError::from)?;
        let session: Session = parse_response(response).await?;
        tracing::info!(email = %session.email, "Moderator signed in");
        self.sessions.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), CoreError> {
        let Some(session) = self.sessions.send_replace(None) else {
            return Ok(());
        };
        let result = self
            .client
            .post(self.config.endpoint("/auth/logout"))
            .bearer_auth(&session.access_token)
            .send()
            .await;
        // The local session is gone either way; the token simply expires.
        match result.map_err(ClientError::from) {
            Ok(response) => {
                if let Err(e) = ensure_success(response).await {
                    tracing::warn!(error = %e, "Logout request rejected");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Logout request failed"),
        }
        tracing::info!(email = %session.email, "Moderator signed out");
        Ok(())
    }

    fn session(&self) -> Option<Session> {
        current_session(&self.sessions)
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.sessions.subscribe()
    }
}
