use thiserror::Error;

/// Failures talking to the backend collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Server unreachable, timeout, or the connection dropped mid-request.
    #[error("Unable to connect to server: {0}")]
    Network(String),

    /// 401: the bearer token is missing server-side, invalid, or expired.
    #[error("Session expired: {0}")]
    Unauthorized(String),

    /// Any other non-2xx response. `message` is the server's `error` field when present.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// No token in the local auth session.
    #[error("No authentication token found. Please log in again.")]
    MissingToken,

    /// 2xx response whose body did not match the expected shape.
    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the client must drop its credentials and return to login.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_) | ApiError::MissingToken)
    }
}

/// Encounter transitions rejected by the state machine.
///
/// Every variant is recoverable; the UI maps them to a disabled control or a
/// transient notification.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum EncounterError {
    #[error("a case is already running")]
    AlreadyActive,
    #[error("a case is already being started")]
    StartInFlight,
    #[error("no active case")]
    NoActiveCase,
    #[error("message is empty")]
    EmptyMessage,
    #[error("waiting for the patient to reply")]
    ChatInFlight,
    #[error("choose a diagnosis first")]
    NoDiagnosisSelected,
    #[error("unknown diagnosis option")]
    UnknownDiagnosis,
    #[error("diagnosis already submitted")]
    AlreadySubmitted,
    #[error("the diagnosis view is not open")]
    NotDiagnosing,
    #[error("time is up, a diagnosis is required")]
    DiagnosisRequired,
    #[error("the chat is closed while diagnosing")]
    ChatClosed,
    #[error("no result to close")]
    NoResult,
}

/// Local cache failures.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("cached profile is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
