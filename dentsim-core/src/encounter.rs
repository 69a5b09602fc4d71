//! Client-side state machine for one clinical encounter.
//!
//! ```text
//! Idle -> Starting -> Active <-> Diagnosing -> Submitting -> ResultShown -> Idle
//! ```
//!
//! [`Encounter`] performs no I/O. Operations that need the backend return a
//! ticket describing the request; the caller performs it and feeds the outcome
//! back through the matching `complete_*` method. Every ticket carries the
//! encounter generation it was issued for. Resetting the encounter bumps the
//! generation, so a reply that lands after the case was closed is reported as
//! [`Completion::Stale`] and leaves the state untouched.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::backend::CaseStarted;
use crate::catalog;
use crate::error::{ApiError, EncounterError};
use crate::timer::CountdownTimer;
use crate::types::{ClinicalTool, DiagnosisResult, Message, MessageKind};

/// Countdown length used when the config does not override it.
pub const DEFAULT_DURATION_SECS: u32 = 300;

/// Coarse phase of the encounter, used by the UI to pick a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    /// Chat open, timer running.
    Active,
    /// Diagnosis selection open, timer paused.
    Diagnosing,
    /// Diagnosis posted, waiting for the verdict.
    Submitting,
    ResultShown,
}

/// Append-only, insertion-ordered message list.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn push(&mut self, kind: MessageKind, content: impl Into<String>) -> &Message {
        self.messages.push(Message::new(kind, content));
        // just pushed
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// The student's pending answer in the diagnosis view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosisChoice {
    /// Catalog option id.
    Option(String),
    FreeText(String),
}

impl DiagnosisChoice {
    /// Text sent to the backend: the option's display name, or the trimmed free text.
    fn submission_text(&self) -> Result<String, EncounterError> {
        match self {
            DiagnosisChoice::Option(id) => catalog::diagnosis_by_id(id)
                .map(|o| o.name.to_owned())
                .ok_or(EncounterError::UnknownDiagnosis),
            DiagnosisChoice::FreeText(text) => {
                let text = text.trim();
                if text.is_empty() {
                    Err(EncounterError::NoDiagnosisSelected)
                } else {
                    Ok(text.to_owned())
                }
            }
        }
    }
}

/// State that exists only while a case is running.
#[derive(Debug, Clone)]
pub struct ActiveCase {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub timer: CountdownTimer,
    pub log: MessageLog,
    chat_in_flight: bool,
    selection: Option<DiagnosisChoice>,
    submitted: bool,
    result: Option<DiagnosisResult>,
}

impl ActiveCase {
    fn new(session_id: String, greeting: Option<String>, duration_secs: u32) -> Self {
        let mut log = MessageLog::default();
        let greeting = greeting
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| catalog::DEFAULT_GREETING.to_owned());
        log.push(MessageKind::System, greeting);
        Self {
            session_id,
            started_at: Utc::now(),
            timer: CountdownTimer::start(duration_secs),
            log,
            chat_in_flight: false,
            selection: None,
            submitted: false,
            result: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTicket {
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTicket {
    pub generation: u64,
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnoseTicket {
    pub generation: u64,
    pub session_id: String,
    pub diagnosis: String,
}

/// What became of a backend outcome fed back into the encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The request failed; the state machine recovered and the error should
    /// be shown to the user.
    Failed(ApiError),
    /// The ticket belongs to an encounter that no longer exists. Ignored.
    Stale,
}

/// Emitted by [`Encounter::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Nothing,
    /// The countdown hit zero on this tick and the diagnosis view was forced open.
    TimeUp,
}

/// The single encounter a client can run at a time.
#[derive(Debug, Clone)]
pub struct Encounter {
    phase: Phase,
    generation: u64,
    duration_secs: u32,
    case: Option<ActiveCase>,
}

impl Default for Encounter {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_SECS)
    }
}

impl Encounter {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            phase: Phase::Idle,
            generation: 0,
            duration_secs,
            case: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn case(&self) -> Option<&ActiveCase> {
        self.case.as_ref()
    }

    /// True from a successful start until the case is closed or abandoned.
    pub fn is_active(&self) -> bool {
        self.case.is_some()
    }

    /// Messages of the running case; empty when idle.
    pub fn messages(&self) -> &[Message] {
        self.case.as_ref().map(|c| c.log.messages()).unwrap_or(&[])
    }

    pub fn time_remaining(&self) -> Option<u32> {
        self.case.as_ref().map(|c| c.timer.remaining_secs())
    }

    pub fn result(&self) -> Option<&DiagnosisResult> {
        self.case.as_ref().and_then(|c| c.result.as_ref())
    }

    pub fn selection(&self) -> Option<&DiagnosisChoice> {
        self.case.as_ref().and_then(|c| c.selection.as_ref())
    }

    pub fn chat_in_flight(&self) -> bool {
        self.case.as_ref().is_some_and(|c| c.chat_in_flight)
    }

    /// Whether the send control should be enabled.
    pub fn can_send(&self) -> bool {
        self.phase == Phase::Active && !self.chat_in_flight()
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.phase == Phase::Diagnosing
            && self
                .selection()
                .is_some_and(|s| s.submission_text().is_ok())
    }

    /// True once the countdown has run out for the current case.
    pub fn time_is_up(&self) -> bool {
        self.case.as_ref().is_some_and(|c| c.timer.is_expired())
    }

    fn case_mut(&mut self) -> Result<&mut ActiveCase, EncounterError> {
        self.case.as_mut().ok_or(EncounterError::NoActiveCase)
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.case = None;
        self.phase = Phase::Idle;
    }

    // -----------------------------------------------------------------------
    // Session initiator
    // -----------------------------------------------------------------------

    pub fn begin_start(&mut self) -> Result<StartTicket, EncounterError> {
        match self.phase {
            Phase::Idle => {}
            Phase::Starting => return Err(EncounterError::StartInFlight),
            _ => return Err(EncounterError::AlreadyActive),
        }
        self.phase = Phase::Starting;
        Ok(StartTicket {
            generation: self.generation,
        })
    }

    pub fn complete_start(
        &mut self,
        ticket: StartTicket,
        outcome: Result<CaseStarted, ApiError>,
    ) -> Completion {
        if ticket.generation != self.generation || self.phase != Phase::Starting {
            debug!(ticket = ticket.generation, current = self.generation, "stale start result dropped");
            return Completion::Stale;
        }
        match outcome {
            Ok(started) => {
                info!(session_id = %started.session_id, "case started");
                self.case = Some(ActiveCase::new(
                    started.session_id,
                    started.greeting,
                    self.duration_secs,
                ));
                self.phase = Phase::Active;
                Completion::Applied
            }
            Err(e) => {
                self.phase = Phase::Idle;
                Completion::Failed(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Chat exchange
    // -----------------------------------------------------------------------

    pub fn send_message(&mut self, text: &str) -> Result<ChatTicket, EncounterError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EncounterError::EmptyMessage);
        }
        match self.phase {
            Phase::Active => {}
            Phase::Idle | Phase::Starting => return Err(EncounterError::NoActiveCase),
            Phase::Diagnosing => return Err(EncounterError::ChatClosed),
            Phase::Submitting | Phase::ResultShown => {
                return Err(EncounterError::AlreadySubmitted)
            }
        }
        let generation = self.generation;
        let case = self.case_mut()?;
        if case.chat_in_flight {
            return Err(EncounterError::ChatInFlight);
        }
        case.log.push(MessageKind::Student, text);
        case.chat_in_flight = true;
        Ok(ChatTicket {
            generation,
            session_id: case.session_id.clone(),
            message: text.to_owned(),
        })
    }

    /// Applies a chat reply. Failures keep the student's message in the log.
    pub fn complete_chat(
        &mut self,
        ticket: &ChatTicket,
        outcome: Result<String, ApiError>,
    ) -> Completion {
        if ticket.generation != self.generation {
            debug!(ticket = ticket.generation, current = self.generation, "stale chat reply dropped");
            return Completion::Stale;
        }
        let Some(case) = self.case.as_mut() else {
            return Completion::Stale;
        };
        case.chat_in_flight = false;
        match outcome {
            Ok(reply) => {
                case.log.push(MessageKind::Patient, reply);
                Completion::Applied
            }
            Err(e) => Completion::Failed(e),
        }
    }

    // -----------------------------------------------------------------------
    // Clinician tools
    // -----------------------------------------------------------------------

    pub fn use_tool(&mut self, tool: ClinicalTool) -> Result<(), EncounterError> {
        match self.phase {
            Phase::Active => {}
            Phase::Idle | Phase::Starting => return Err(EncounterError::NoActiveCase),
            Phase::Diagnosing => return Err(EncounterError::ChatClosed),
            Phase::Submitting | Phase::ResultShown => {
                return Err(EncounterError::AlreadySubmitted)
            }
        }
        self.case_mut()?.log.push(MessageKind::System, tool.finding());
        debug!(tool = tool.id(), "clinical tool used");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Countdown
    // -----------------------------------------------------------------------

    /// Feeds elapsed wall-clock time into the countdown.
    ///
    /// When the timer expires the diagnosis view is forced open. The timer is
    /// then stopped for good, so `TimeUp` is returned at most once per case.
    pub fn tick(&mut self, elapsed: Duration) -> TickOutcome {
        let Some(case) = self.case.as_mut() else {
            return TickOutcome::Nothing;
        };
        if !case.timer.advance(elapsed) {
            return TickOutcome::Nothing;
        }
        info!(session_id = %case.session_id, "time is up");
        if self.phase == Phase::Active {
            self.phase = Phase::Diagnosing;
        }
        TickOutcome::TimeUp
    }

    // -----------------------------------------------------------------------
    // Diagnosis submitter
    // -----------------------------------------------------------------------

    /// Opens the diagnosis view and pauses the countdown.
    pub fn open_diagnosis(&mut self) -> Result<(), EncounterError> {
        match self.phase {
            Phase::Active => {}
            Phase::Diagnosing => return Ok(()),
            Phase::Idle | Phase::Starting => return Err(EncounterError::NoActiveCase),
            Phase::Submitting | Phase::ResultShown => {
                return Err(EncounterError::AlreadySubmitted)
            }
        }
        self.case_mut()?.timer.pause();
        self.phase = Phase::Diagnosing;
        Ok(())
    }

    /// Closes the diagnosis view and resumes the countdown.
    ///
    /// Refused after the timer expired: the student must submit or abandon.
    pub fn cancel_diagnosis(&mut self) -> Result<(), EncounterError> {
        if self.phase != Phase::Diagnosing {
            return Err(EncounterError::NotDiagnosing);
        }
        let case = self.case_mut()?;
        if case.timer.is_expired() {
            return Err(EncounterError::DiagnosisRequired);
        }
        case.timer.resume();
        self.phase = Phase::Active;
        Ok(())
    }

    /// Records the student's current choice. Blank free text clears it.
    pub fn select_diagnosis(&mut self, choice: DiagnosisChoice) -> Result<(), EncounterError> {
        if self.phase != Phase::Diagnosing {
            return Err(EncounterError::NotDiagnosing);
        }
        if let DiagnosisChoice::Option(id) = &choice {
            if catalog::diagnosis_by_id(id).is_none() {
                return Err(EncounterError::UnknownDiagnosis);
            }
        }
        let case = self.case_mut()?;
        case.selection = match choice {
            DiagnosisChoice::FreeText(t) if t.trim().is_empty() => None,
            other => Some(other),
        };
        Ok(())
    }

    pub fn submit_diagnosis(&mut self) -> Result<DiagnoseTicket, EncounterError> {
        match self.phase {
            Phase::Diagnosing => {}
            Phase::Idle | Phase::Starting => return Err(EncounterError::NoActiveCase),
            Phase::Active => return Err(EncounterError::NotDiagnosing),
            Phase::Submitting | Phase::ResultShown => {
                return Err(EncounterError::AlreadySubmitted)
            }
        }
        let generation = self.generation;
        let case = self.case_mut()?;
        if case.submitted {
            return Err(EncounterError::AlreadySubmitted);
        }
        let diagnosis = case
            .selection
            .as_ref()
            .ok_or(EncounterError::NoDiagnosisSelected)?
            .submission_text()?;
        case.timer.pause();
        let ticket = DiagnoseTicket {
            generation,
            session_id: case.session_id.clone(),
            diagnosis,
        };
        self.phase = Phase::Submitting;
        Ok(ticket)
    }

    /// Applies the verdict. A failure returns to the selection view with the
    /// choice kept so the student can retry by hand.
    pub fn complete_diagnosis(
        &mut self,
        ticket: &DiagnoseTicket,
        outcome: Result<DiagnosisResult, ApiError>,
    ) -> Completion {
        if ticket.generation != self.generation || self.phase != Phase::Submitting {
            debug!(ticket = ticket.generation, current = self.generation, "stale verdict dropped");
            return Completion::Stale;
        }
        let Some(case) = self.case.as_mut() else {
            return Completion::Stale;
        };
        match outcome {
            Ok(result) => {
                info!(
                    session_id = %case.session_id,
                    correct = result.correct,
                    xp = result.xp_earned,
                    "diagnosis judged"
                );
                case.submitted = true;
                case.result = Some(result);
                self.phase = Phase::ResultShown;
                Completion::Applied
            }
            Err(e) => {
                self.phase = Phase::Diagnosing;
                Completion::Failed(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Dismisses the result view and discards all case state.
    pub fn close_result(&mut self) -> Result<(), EncounterError> {
        if self.phase != Phase::ResultShown {
            return Err(EncounterError::NoResult);
        }
        self.reset();
        Ok(())
    }

    /// Leaves the case without a verdict. Any in-flight reply becomes stale.
    pub fn abandon(&mut self) {
        if self.phase != Phase::Idle {
            info!(generation = self.generation, "encounter abandoned");
            self.reset();
        }
    }
}
