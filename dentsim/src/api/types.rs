//! Messages exchanged with the API worker.
//!
//! Everything here is owned and `Send` so it can cross from the UI thread to
//! worker tasks and back. Encounter requests carry the ticket the state
//! machine issued; the response hands the same ticket back so the encounter
//! can tell a current result from a stale one.
//!
//! Session-level requests carry the sign-in generation instead. Logging out
//! moves the UI to a new generation, so replies stamped with the old one are
//! dropped on arrival and cannot write the cache.

use dentsim_core::auth::AuthSession;
use dentsim_core::backend::{CaseStarted, Credentials, PasswordChange, ProfileUpdate, Registration};
use dentsim_core::encounter::{ChatTicket, DiagnoseTicket, StartTicket};
use dentsim_core::error::ApiError;
use dentsim_core::types::{DiagnosisResult, UserProfile};

/// Commands sent from the UI thread to the API worker.
#[derive(Debug)]
pub enum ApiRequest {
    Login {
        generation: u64,
        credentials: Credentials,
    },
    Register(Registration),
    RefreshProfile {
        generation: u64,
        token: String,
    },
    UpdateProfile {
        generation: u64,
        token: String,
        current: Option<UserProfile>,
        update: ProfileUpdate,
    },
    ChangePassword {
        generation: u64,
        token: String,
        change: PasswordChange,
    },
    StartCase {
        token: String,
        ticket: StartTicket,
    },
    Chat {
        token: String,
        ticket: ChatTicket,
    },
    Diagnose {
        token: String,
        ticket: DiagnoseTicket,
    },
    /// Clears the cached credentials and ends `generation`.
    Logout {
        generation: u64,
    },
}

/// Result payload sent from the worker back to the UI thread.
///
/// Carried inside `AppEvent::ApiResult(Box<ApiResponse>)` to keep the event
/// enum small on the channel.
#[derive(Debug)]
pub enum ApiResponse {
    LoggedIn {
        generation: u64,
        outcome: Result<AuthSession, ApiError>,
    },
    Registered(Result<(), ApiError>),
    Profile {
        generation: u64,
        outcome: Result<UserProfile, ApiError>,
    },
    ProfileUpdated {
        generation: u64,
        outcome: Result<UserProfile, ApiError>,
    },
    PasswordChanged {
        generation: u64,
        outcome: Result<(), ApiError>,
    },
    CaseStarted {
        ticket: StartTicket,
        outcome: Result<CaseStarted, ApiError>,
    },
    ChatReply {
        ticket: ChatTicket,
        outcome: Result<String, ApiError>,
    },
    Verdict {
        ticket: DiagnoseTicket,
        outcome: Result<DiagnosisResult, ApiError>,
    },
    LoggedOut,
}
