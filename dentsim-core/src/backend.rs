//! The backend collaborator seam.
//!
//! Everything the client asks of the server goes through [`Backend`]. The
//! production implementation is [`crate::http::HttpBackend`]; tests substitute
//! in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::types::{DiagnosisResult, UserProfile};

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Minimal user record returned alongside a login token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginUser {
    pub username: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: LoginUser,
}

/// A freshly started case.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaseStarted {
    pub session_id: String,
    /// Opening line supplied by the server, if any.
    #[serde(default, alias = "message")]
    pub greeting: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub session_id: &'a str,
    pub message: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct DiagnoseRequest<'a> {
    pub session_id: &'a str,
    pub diagnosis: &'a str,
}

/// Wire shape of `POST /chat/diagnose`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnoseResponse {
    pub correct: bool,
    #[serde(default)]
    pub xp_gained: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub correct_diagnosis: Option<String>,
}

impl From<DiagnoseResponse> for DiagnosisResult {
    fn from(r: DiagnoseResponse) -> Self {
        DiagnosisResult {
            correct: r.correct,
            xp_earned: r.xp_gained,
            feedback: r.message,
            correct_diagnosis_name: r.correct_diagnosis,
        }
    }
}

/// Body of any non-2xx response.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Operations the client needs from the server.
///
/// Token-bearing calls take the token explicitly; the implementation holds no
/// auth state of its own.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;

    async fn register(&self, registration: &Registration) -> Result<(), ApiError>;

    async fn profile(&self, token: &str) -> Result<UserProfile, ApiError>;

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<(), ApiError>;

    async fn change_password(&self, token: &str, change: &PasswordChange) -> Result<(), ApiError>;

    async fn start_case(&self, token: &str) -> Result<CaseStarted, ApiError>;

    /// Sends one student message and returns the patient's reply.
    async fn chat(&self, token: &str, session_id: &str, message: &str) -> Result<String, ApiError>;

    async fn diagnose(
        &self,
        token: &str,
        session_id: &str,
        diagnosis: &str,
    ) -> Result<DiagnosisResult, ApiError>;
}
