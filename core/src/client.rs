use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AgentError;

/// Identity of the peer service terminating our calls, as a deployment's
/// mTLS layer would report it in the forwarded-cert header.
const STORE_AUDIENCE: &str = "spiffe://example.org/service/user-service";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One user record as the store returns it. `id` is opaque, server-generated,
/// and immutable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// The body of a create or full-replace update.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    pub role: String,
}

/// The five operations the router may dispatch. The HTTP client implements
/// this against the real store; tests swap in an in-memory fake.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, payload: &UserPayload) -> Result<UserRecord, AgentError>;
    async fn get_user(&self, user_id: &str) -> Result<UserRecord, AgentError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, AgentError>;
    async fn update_user(
        &self,
        user_id: &str,
        payload: &UserPayload,
    ) -> Result<UserRecord, AgentError>;
    async fn delete_user(&self, user_id: &str) -> Result<(), AgentError>;
}

/// Who this agent claims to be towards the store. Supplied by the deployment
/// at construction, never fabricated inside the client.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    uri: String,
}

impl CallerIdentity {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    fn forwarded_cert(&self) -> String {
        format!("By={STORE_AUDIENCE};URI={}", self.uri)
    }
}

/// Typed client for the user-record store. Each operation issues exactly one
/// request; 404 becomes `NotFound`, every other failure mode collapses into
/// `Transport` so callers never see reqwest.
pub struct HttpUserClient {
    http: reqwest::Client,
    base_url: String,
    identity: CallerIdentity,
}

impl HttpUserClient {
    pub fn new(
        base_url: impl Into<String>,
        identity: CallerIdentity,
        timeout: Duration,
    ) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AgentError::Transport(err.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!("User store client targets {base_url} as {}", identity.uri());
        Ok(Self { http, base_url, identity })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header("X-Forwarded-Client-Cert", self.identity.forwarded_cert())
    }

    /// Sends the request and normalizes the status. `subject` is the user id
    /// the call is about, when there is one; only those calls can surface
    /// `NotFound`.
    async fn send(
        &self,
        request: RequestBuilder,
        subject: Option<&str>,
    ) -> Result<Response, AgentError> {
        let response = request
            .send()
            .await
            .map_err(|err| AgentError::Transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match (status, subject) {
            (StatusCode::NOT_FOUND, Some(user_id)) => {
                Err(AgentError::NotFound(user_id.to_string()))
            }
            _ => Err(AgentError::Transport(format!("user store answered {status}"))),
        }
    }

    async fn json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, AgentError> {
        response
            .json()
            .await
            .map_err(|err| AgentError::Transport(format!("malformed store response: {err}")))
    }
}

#[async_trait]
impl UserStore for HttpUserClient {
    async fn create_user(&self, payload: &UserPayload) -> Result<UserRecord, AgentError> {
        let request = self.request(Method::POST, "/users").json(payload);
        let response = self.send(request, None).await?;
        Self::json(response).await
    }

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, AgentError> {
        let request = self.request(Method::GET, &format!("/users/{user_id}"));
        let response = self.send(request, Some(user_id)).await?;
        Self::json(response).await
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, AgentError> {
        let request = self.request(Method::GET, "/users");
        let response = self.send(request, None).await?;
        Self::json(response).await
    }

    async fn update_user(
        &self,
        user_id: &str,
        payload: &UserPayload,
    ) -> Result<UserRecord, AgentError> {
        let request = self
            .request(Method::PUT, &format!("/users/{user_id}"))
            .json(payload);
        let response = self.send(request, Some(user_id)).await?;
        Self::json(response).await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), AgentError> {
        let request = self.request(Method::DELETE, &format!("/users/{user_id}"));
        self.send(request, Some(user_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CallerIdentity, HttpUserClient};

    #[test]
    fn forwarded_cert_carries_both_peer_and_caller() {
        let identity = CallerIdentity::new("spiffe://example.org/agent/steward");
        assert_eq!(
            identity.forwarded_cert(),
            "By=spiffe://example.org/service/user-service;URI=spiffe://example.org/agent/steward"
        );
    }

    #[test]
    fn base_url_loses_its_trailing_slash() {
        let client = HttpUserClient::new(
            "http://localhost:8000/",
            CallerIdentity::new("spiffe://example.org/agent/steward"),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
