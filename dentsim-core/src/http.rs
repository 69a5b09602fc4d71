//! `reqwest`-backed implementation of [`Backend`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::{
    Backend, CaseStarted, ChatReply, ChatRequest, Credentials, DiagnoseRequest, DiagnoseResponse,
    ErrorBody, LoginResponse, PasswordChange, ProfileUpdate, Registration,
};
use crate::error::ApiError;
use crate::types::{DiagnosisResult, UserProfile};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP+JSON client for the DentSim backend.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    /// Creates a client rooted at `base_url` (trailing slashes are ignored).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            client: Client::new(),
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url).timeout(self.timeout);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send(&self, method: Method, path: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        debug!(%method, path, "backend request");
        let response = request.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "backend unreachable");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "backend response");
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback_message(status));
        warn!(%method, path, status = status.as_u16(), %message, "backend error");

        if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized(message))
        } else {
            Err(ApiError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn call_json<B, T>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.request(method.clone(), path, token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.send(method, path, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Same as [`call_json`](Self::call_json) but ignores the response body.
    async fn call_unit<B>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.request(method.clone(), path, token);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(method, path, request).await.map(|_| ())
    }
}

fn fallback_message(status: StatusCode) -> String {
    format!(
        "Request failed ({} {})",
        status.as_u16(),
        status.canonical_reason().unwrap_or("error")
    )
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.call_json(Method::POST, "/auth/login", None, Some(credentials))
            .await
    }

    async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        self.call_unit(Method::POST, "/auth/register", None, Some(registration))
            .await
    }

    async fn profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.call_json::<(), _>(Method::GET, "/auth/profile", Some(token), None)
            .await
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<(), ApiError> {
        self.call_unit(Method::PUT, "/auth/update-profile", Some(token), Some(update))
            .await
    }

    async fn change_password(&self, token: &str, change: &PasswordChange) -> Result<(), ApiError> {
        self.call_unit(Method::PUT, "/auth/change-password", Some(token), Some(change))
            .await
    }

    async fn start_case(&self, token: &str) -> Result<CaseStarted, ApiError> {
        self.call_json::<(), _>(Method::POST, "/chat/start/random", Some(token), None)
            .await
    }

    async fn chat(&self, token: &str, session_id: &str, message: &str) -> Result<String, ApiError> {
        let body = ChatRequest { session_id, message };
        let reply: ChatReply = self
            .call_json(Method::POST, "/chat", Some(token), Some(&body))
            .await?;
        Ok(reply.reply)
    }

    async fn diagnose(
        &self,
        token: &str,
        session_id: &str,
        diagnosis: &str,
    ) -> Result<DiagnosisResult, ApiError> {
        let body = DiagnoseRequest { session_id, diagnosis };
        let response: DiagnoseResponse = self
            .call_json(Method::POST, "/chat/diagnose", Some(token), Some(&body))
            .await?;
        Ok(response.into())
    }
}
