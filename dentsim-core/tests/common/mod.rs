//! In-memory backend shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dentsim_core::backend::{
    Backend, CaseStarted, Credentials, LoginResponse, LoginUser, PasswordChange, ProfileUpdate,
    Registration,
};
use dentsim_core::error::ApiError;
use dentsim_core::types::{DiagnosisResult, UserProfile};

/// Scripted backend: each call pops the next queued outcome for its endpoint.
#[derive(Default)]
pub struct FakeBackend {
    pub calls: AtomicUsize,
    pub chat_replies: Mutex<VecDeque<Result<String, ApiError>>>,
    pub verdicts: Mutex<VecDeque<Result<DiagnosisResult, ApiError>>>,
    pub profile: Mutex<Option<Result<UserProfile, ApiError>>>,
    pub seen_messages: Mutex<Vec<String>>,
    pub seen_diagnoses: Mutex<Vec<String>>,
    /// Milliseconds the profile endpoints wait before answering.
    pub profile_delay_ms: AtomicU64,
}

impl FakeBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queue_reply(&self, reply: Result<String, ApiError>) {
        self.chat_replies.lock().unwrap().push_back(reply);
    }

    pub fn queue_verdict(&self, verdict: Result<DiagnosisResult, ApiError>) {
        self.verdicts.lock().unwrap().push_back(verdict);
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn profile_delay(&self) {
        let ms = self.profile_delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.hit();
        if credentials.password == "parola123" {
            Ok(LoginResponse {
                token: "tok-1".into(),
                user: LoginUser {
                    username: credentials.username.clone(),
                    role: Some("Dental Student".into()),
                },
            })
        } else {
            Err(ApiError::Unauthorized("Parolă incorectă.".into()))
        }
    }

    async fn register(&self, _registration: &Registration) -> Result<(), ApiError> {
        self.hit();
        Ok(())
    }

    async fn profile(&self, _token: &str) -> Result<UserProfile, ApiError> {
        self.hit();
        self.profile_delay().await;
        self.profile
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ApiError::MissingToken))
    }

    async fn update_profile(&self, _token: &str, _update: &ProfileUpdate) -> Result<(), ApiError> {
        self.hit();
        self.profile_delay().await;
        Ok(())
    }

    async fn change_password(&self, _token: &str, _change: &PasswordChange) -> Result<(), ApiError> {
        self.hit();
        Ok(())
    }

    async fn start_case(&self, _token: &str) -> Result<CaseStarted, ApiError> {
        self.hit();
        Ok(CaseStarted {
            session_id: format!("case-{}", self.calls()),
            greeting: None,
        })
    }

    async fn chat(&self, _token: &str, _session_id: &str, message: &str) -> Result<String, ApiError> {
        self.hit();
        self.seen_messages.lock().unwrap().push(message.to_owned());
        self.chat_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("It hurts when I drink something cold.".into()))
    }

    async fn diagnose(
        &self,
        _token: &str,
        _session_id: &str,
        diagnosis: &str,
    ) -> Result<DiagnosisResult, ApiError> {
        self.hit();
        self.seen_diagnoses.lock().unwrap().push(diagnosis.to_owned());
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no verdict queued".into())))
    }
}
