//! Central application state for dentsim.
//!
//! This module owns all mutable UI state: the active screen and mode, the
//! signed-in session, the running encounter, form buffers, and the transient
//! notification. No ratatui rendering lives here. `app.rs` is read by the
//! render module and mutated by the keybinding dispatcher and by backend
//! results arriving from the API worker.

use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use dentsim_core::auth::AuthSession;
use dentsim_core::backend::{Credentials, PasswordChange, ProfileUpdate, Registration};
use dentsim_core::catalog;
use dentsim_core::encounter::{Completion, DiagnosisChoice, Encounter, Phase, TickOutcome};
use dentsim_core::error::{ApiError, EncounterError};
use dentsim_core::gamification::{capitalise, BadgeFilter};
use dentsim_core::types::{ClinicalTool, UserProfile, ROLES};
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::api::types::{ApiRequest, ApiResponse};

/// How long a notification stays in the status bar.
pub const TOAST_TTL: Duration = Duration::from_secs(3);

/// Top-level view.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    #[default]
    Login,
    Signup,
    Home,
    Encounter,
    Profile,
    Leaderboard,
    Settings,
}

impl Screen {
    /// Screens reachable with Tab once signed in, in tab-bar order.
    pub const TABS: [Screen; 4] = [
        Screen::Home,
        Screen::Profile,
        Screen::Leaderboard,
        Screen::Settings,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Screen::Login => "Login",
            Screen::Signup => "Sign Up",
            Screen::Home => "Home",
            Screen::Encounter => "Encounter",
            Screen::Profile => "Profile",
            Screen::Leaderboard => "Leaderboard",
            Screen::Settings => "Settings",
        }
    }

    /// Whether the screen is a text form that opens in Insert mode.
    pub fn has_form(self) -> bool {
        matches!(self, Screen::Login | Screen::Signup | Screen::Settings)
    }

    pub fn next_tab(self) -> Self {
        let i = Self::TABS.iter().position(|s| *s == self).unwrap_or(0);
        Self::TABS[(i + 1) % Self::TABS.len()]
    }

    pub fn prev_tab(self) -> Self {
        let i = Self::TABS.iter().position(|s| *s == self).unwrap_or(0);
        Self::TABS[(i + Self::TABS.len() - 1) % Self::TABS.len()]
    }
}

/// Input mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Keys are typed into the focused text field.
    Insert,
    HelpOverlay,
    /// Quit while a case is running.
    ConfirmQuit,
    /// Final confirmation before a diagnosis is sent.
    ConfirmSubmit,
    /// Leaving a running case forfeits it.
    ConfirmExit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

/// Transient status-bar notification.
#[derive(Debug, Clone)]
pub struct Toast {
    pub text: String,
    pub kind: ToastKind,
    expires_at: Instant,
}

/// Leaderboard period filter. The table is static, so this only changes the heading.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardPeriod {
    #[default]
    Weekly,
    Monthly,
    AllTime,
}

impl LeaderboardPeriod {
    pub fn next(self) -> Self {
        match self {
            LeaderboardPeriod::Weekly => LeaderboardPeriod::Monthly,
            LeaderboardPeriod::Monthly => LeaderboardPeriod::AllTime,
            LeaderboardPeriod::AllTime => LeaderboardPeriod::Weekly,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LeaderboardPeriod::Weekly => "This Week",
            LeaderboardPeriod::Monthly => "This Month",
            LeaderboardPeriod::AllTime => "All Time",
        }
    }
}

/// Shared field navigation for the text forms.
pub trait FormState {
    fn field_count(&self) -> usize;
    fn focused(&self) -> usize;
    fn set_focused(&mut self, field: usize);
    /// Buffer of the focused field, or `None` when it is a choice field.
    fn text_mut(&mut self) -> Option<&mut String>;
    /// Steps the focused choice field. No-op on text fields.
    fn cycle_choice(&mut self, _forward: bool) {}

    fn next_field(&mut self) {
        let next = (self.focused() + 1) % self.field_count();
        self.set_focused(next);
    }

    fn prev_field(&mut self) {
        let n = self.field_count();
        let prev = (self.focused() + n - 1) % n;
        self.set_focused(prev);
    }
}

fn step_index(index: usize, len: usize, forward: bool) -> usize {
    if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    }
}

#[derive(Debug, Default, Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub field: usize,
    pub error: Option<String>,
    pub pending: bool,
}

impl FormState for LoginForm {
    fn field_count(&self) -> usize {
        2
    }
    fn focused(&self) -> usize {
        self.field
    }
    fn set_focused(&mut self, field: usize) {
        self.field = field;
    }
    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            0 => Some(&mut self.username),
            _ => Some(&mut self.password),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    /// Index into [`ROLES`].
    pub role: usize,
    pub class_code: String,
    pub field: usize,
    pub error: Option<String>,
    pub pending: bool,
}

impl SignupForm {
    pub const ROLE_FIELD: usize = 2;
}

impl FormState for SignupForm {
    fn field_count(&self) -> usize {
        4
    }
    fn focused(&self) -> usize {
        self.field
    }
    fn set_focused(&mut self, field: usize) {
        self.field = field;
    }
    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            0 => Some(&mut self.username),
            1 => Some(&mut self.password),
            Self::ROLE_FIELD => None,
            _ => Some(&mut self.class_code),
        }
    }
    fn cycle_choice(&mut self, forward: bool) {
        if self.field == Self::ROLE_FIELD {
            self.role = step_index(self.role, ROLES.len(), forward);
        }
    }
}

/// Settings screen: profile fields on top, password change below.
#[derive(Debug, Default, Clone)]
pub struct SettingsForm {
    pub username: String,
    pub role: usize,
    pub current_password: String,
    pub new_password: String,
    pub field: usize,
    pub pending: bool,
}

impl SettingsForm {
    pub const ROLE_FIELD: usize = 1;

    /// Whether the focused field belongs to the password section.
    pub fn on_password_section(&self) -> bool {
        self.field >= 2
    }

    fn prefill(&mut self, username: &str, profile: Option<&UserProfile>) {
        self.username = profile
            .map(|p| p.username.clone())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| username.to_owned());
        self.role = profile
            .and_then(|p| p.role.as_deref())
            .and_then(|r| ROLES.iter().position(|known| *known == r))
            .unwrap_or(0);
        self.current_password.clear();
        self.new_password.clear();
        self.field = 0;
    }
}

impl FormState for SettingsForm {
    fn field_count(&self) -> usize {
        4
    }
    fn focused(&self) -> usize {
        self.field
    }
    fn set_focused(&mut self, field: usize) {
        self.field = field;
    }
    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            0 => Some(&mut self.username),
            Self::ROLE_FIELD => None,
            2 => Some(&mut self.current_password),
            _ => Some(&mut self.new_password),
        }
    }
    fn cycle_choice(&mut self, forward: bool) {
        if self.field == Self::ROLE_FIELD {
            self.role = step_index(self.role, ROLES.len(), forward);
        }
    }
}

/// All mutable UI state passed through every render cycle.
pub struct AppState {
    pub mode: Mode,
    pub screen: Screen,

    /// Signed-in user, established by login or cache restore.
    pub auth: Option<AuthSession>,
    /// Sign-in generation stamped on session-level requests. Bumped on
    /// logout so replies for the ended session are ignored.
    pub auth_generation: u64,
    pub profile_loading: bool,

    pub encounter: Encounter,
    /// Draft chat message.
    pub chat_input: String,
    /// Lines scrolled up from the newest message; 0 follows the tail.
    pub chat_scroll: u16,
    /// Inner height of the chat panel, cached after each render.
    pub chat_viewport_height: u16,
    /// Highlighted row in the diagnosis picker. The row after the catalog
    /// options is the free-text entry.
    pub diagnosis_cursor: usize,
    pub free_text: String,

    pub login: LoginForm,
    pub signup: SignupForm,
    pub settings: SettingsForm,

    pub badge_filter: BadgeFilter,
    pub badge_scroll: u16,
    pub leaderboard_period: LeaderboardPeriod,

    pub help_scroll: u16,
    pub toast: Option<Toast>,

    /// Tool buttons, cached after each render for mouse hits.
    pub tool_rects: [Rect; 4],

    /// Sender half of the API worker channel. `None` in tests that only
    /// exercise local transitions.
    pub api_tx: Option<UnboundedSender<ApiRequest>>,
}

impl AppState {
    pub fn new(duration_secs: u32, api_tx: Option<UnboundedSender<ApiRequest>>) -> Self {
        Self {
            mode: Mode::Insert,
            screen: Screen::Login,
            auth: None,
            auth_generation: 0,
            profile_loading: false,
            encounter: Encounter::new(duration_secs),
            chat_input: String::new(),
            chat_scroll: 0,
            chat_viewport_height: 0,
            diagnosis_cursor: 0,
            free_text: String::new(),
            login: LoginForm::default(),
            signup: SignupForm::default(),
            settings: SettingsForm::default(),
            badge_filter: BadgeFilter::default(),
            badge_scroll: 0,
            leaderboard_period: LeaderboardPeriod::default(),
            help_scroll: 0,
            toast: None,
            tool_rects: [Rect::default(); 4],
            api_tx,
        }
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn send(&self, request: ApiRequest) {
        match &self.api_tx {
            Some(tx) => {
                if tx.send(request).is_err() {
                    warn!("api worker is gone, request dropped");
                }
            }
            None => debug!(?request, "no api worker attached"),
        }
    }

    fn token(&self) -> Result<String, ApiError> {
        self.auth
            .as_ref()
            .map(|a| a.token.clone())
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::MissingToken)
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.auth.as_ref().and_then(|a| a.profile.as_ref())
    }

    pub fn username(&self) -> &str {
        self.auth.as_ref().map(|a| a.username.as_str()).unwrap_or("")
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    pub fn notify(&mut self, text: impl Into<String>) {
        self.push_toast(text.into(), ToastKind::Info);
    }

    pub fn notify_error(&mut self, text: impl Into<String>) {
        self.push_toast(text.into(), ToastKind::Error);
    }

    fn push_toast(&mut self, text: String, kind: ToastKind) {
        self.toast = Some(Toast {
            text,
            kind,
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    /// Feeds one logic tick: advances the countdown and expires the toast.
    pub fn on_tick(&mut self, elapsed: Duration, now: Instant) {
        if self.encounter.tick(elapsed) == TickOutcome::TimeUp {
            // Any half-typed message or open dialog gives way to the forced diagnosis.
            self.mode = Mode::Normal;
            self.screen = Screen::Encounter;
            self.sync_selection();
            self.notify_error("Time's up! Make your diagnosis.");
        }
        if self.toast.as_ref().is_some_and(|t| now >= t.expires_at) {
            self.toast = None;
        }
    }

    // -----------------------------------------------------------------------
    // Navigation and auth
    // -----------------------------------------------------------------------

    pub fn switch_screen(&mut self, screen: Screen) {
        self.screen = screen;
        self.mode = if screen.has_form() { Mode::Insert } else { Mode::Normal };
        match screen {
            Screen::Home | Screen::Profile => self.refresh_profile(),
            Screen::Settings => {
                let username = self.username().to_owned();
                let profile = self.profile().cloned();
                self.settings.prefill(&username, profile.as_ref());
            }
            _ => {}
        }
    }

    /// Adopts a session restored from the cache at startup.
    pub fn restore_session(&mut self, session: AuthSession) {
        self.auth = Some(session);
        self.switch_screen(Screen::Home);
    }

    pub fn refresh_profile(&mut self) {
        if let Ok(token) = self.token() {
            self.profile_loading = true;
            self.send(ApiRequest::RefreshProfile {
                generation: self.auth_generation,
                token,
            });
        }
    }

    pub fn submit_login(&mut self) {
        if self.login.pending {
            return;
        }
        let username = self.login.username.trim().to_owned();
        let password = self.login.password.clone();
        if username.is_empty() || password.trim().is_empty() {
            self.login.error = Some("Please enter both username and password.".to_owned());
            return;
        }
        self.login.error = None;
        self.login.pending = true;
        self.send(ApiRequest::Login {
            generation: self.auth_generation,
            credentials: Credentials { username, password },
        });
    }

    pub fn submit_signup(&mut self) {
        if self.signup.pending {
            return;
        }
        let username = self.signup.username.trim().to_owned();
        let password = self.signup.password.clone();
        if username.is_empty() || password.trim().is_empty() {
            self.signup.error = Some("Please enter both username and password.".to_owned());
            return;
        }
        let class_code = Some(self.signup.class_code.trim().to_owned()).filter(|c| !c.is_empty());
        self.signup.error = None;
        self.signup.pending = true;
        self.send(ApiRequest::Register(Registration {
            username,
            password,
            role: ROLES.get(self.signup.role).map(|r| (*r).to_owned()),
            class_code,
        }));
    }

    pub fn submit_settings(&mut self) {
        if self.settings.on_password_section() {
            self.submit_password_change();
        } else {
            self.submit_profile_update();
        }
    }

    fn submit_profile_update(&mut self) {
        if self.settings.pending {
            return;
        }
        let username = self.settings.username.trim().to_owned();
        if username.is_empty() {
            self.notify_error("Username cannot be empty.");
            return;
        }
        let token = match self.token() {
            Ok(t) => t,
            Err(e) => return self.handle_api_error(e, "Could not update profile"),
        };
        let role = ROLES.get(self.settings.role).copied().unwrap_or(ROLES[0]).to_owned();
        self.settings.pending = true;
        self.send(ApiRequest::UpdateProfile {
            generation: self.auth_generation,
            token,
            current: self.profile().cloned(),
            update: ProfileUpdate { username, role },
        });
    }

    fn submit_password_change(&mut self) {
        if self.settings.pending {
            return;
        }
        if self.settings.current_password.is_empty() || self.settings.new_password.is_empty() {
            self.notify_error("Please fill in both password fields.");
            return;
        }
        let token = match self.token() {
            Ok(t) => t,
            Err(e) => return self.handle_api_error(e, "Could not change password"),
        };
        self.settings.pending = true;
        self.send(ApiRequest::ChangePassword {
            generation: self.auth_generation,
            token,
            change: PasswordChange {
                current_password: self.settings.current_password.clone(),
                new_password: self.settings.new_password.clone(),
            },
        });
    }

    /// Drops the session locally and returns to the login screen. Replies
    /// still in flight for the old session are ignored when they land.
    pub fn logout(&mut self) {
        if let Some(auth) = self.auth.take() {
            info!(username = %auth.username, "logging out");
        }
        self.encounter.abandon();
        self.chat_input.clear();
        self.free_text.clear();
        self.login = LoginForm::default();
        self.settings = SettingsForm::default();
        self.profile_loading = false;
        self.send(ApiRequest::Logout {
            generation: self.auth_generation,
        });
        self.auth_generation += 1;
        self.switch_screen(Screen::Login);
    }

    // -----------------------------------------------------------------------
    // Encounter
    // -----------------------------------------------------------------------

    pub fn start_case(&mut self) {
        let token = match self.token() {
            Ok(t) => t,
            Err(e) => return self.handle_api_error(e, "Could not start case"),
        };
        match self.encounter.begin_start() {
            Ok(ticket) => {
                self.chat_input.clear();
                self.free_text.clear();
                self.chat_scroll = 0;
                self.diagnosis_cursor = 0;
                self.screen = Screen::Encounter;
                self.mode = Mode::Normal;
                self.send(ApiRequest::StartCase { token, ticket });
            }
            Err(EncounterError::AlreadyActive) => {
                // Resume the case that is already running.
                self.screen = Screen::Encounter;
                self.mode = Mode::Normal;
            }
            Err(e) => self.notify_error(e.to_string()),
        }
    }

    /// Sends the draft message. Blank drafts are ignored without a notification.
    pub fn send_chat(&mut self) {
        let token = match self.token() {
            Ok(t) => t,
            Err(e) => return self.handle_api_error(e, "Could not reach the patient"),
        };
        match self.encounter.send_message(&self.chat_input) {
            Ok(ticket) => {
                self.chat_input.clear();
                self.chat_scroll = 0;
                self.send(ApiRequest::Chat { token, ticket });
            }
            Err(EncounterError::EmptyMessage) => {}
            Err(e) => self.notify_error(capitalise(&e.to_string())),
        }
    }

    pub fn use_tool(&mut self, tool: ClinicalTool) {
        match self.encounter.use_tool(tool) {
            Ok(()) => self.chat_scroll = 0,
            Err(e) => self.notify_error(capitalise(&e.to_string())),
        }
    }

    pub fn open_diagnosis(&mut self) {
        match self.encounter.open_diagnosis() {
            Ok(()) => self.sync_selection(),
            Err(e) => self.notify_error(capitalise(&e.to_string())),
        }
    }

    pub fn cancel_diagnosis(&mut self) {
        if let Err(e) = self.encounter.cancel_diagnosis() {
            self.notify_error(capitalise(&e.to_string()));
        }
        self.mode = Mode::Normal;
    }

    /// Number of rows in the picker, including the free-text row.
    pub fn diagnosis_rows(&self) -> usize {
        catalog::diagnosis_options().len() + 1
    }

    pub fn on_free_text_row(&self) -> bool {
        self.diagnosis_cursor == catalog::diagnosis_options().len()
    }

    pub fn move_diagnosis_cursor(&mut self, forward: bool) {
        self.diagnosis_cursor = step_index(self.diagnosis_cursor, self.diagnosis_rows(), forward);
        self.sync_selection();
    }

    /// Mirrors the highlighted row into the encounter's pending choice.
    pub fn sync_selection(&mut self) {
        if self.encounter.phase() != Phase::Diagnosing {
            return;
        }
        let choice = match catalog::diagnosis_options().get(self.diagnosis_cursor) {
            Some(option) => DiagnosisChoice::Option(option.id.to_owned()),
            None => DiagnosisChoice::FreeText(self.free_text.clone()),
        };
        if let Err(e) = self.encounter.select_diagnosis(choice) {
            debug!(error = %e, "selection not applied");
        }
    }

    /// Opens the final confirmation if a diagnosis is chosen.
    pub fn request_submit(&mut self) {
        if self.encounter.can_submit() {
            self.mode = Mode::ConfirmSubmit;
        } else {
            self.notify_error("Choose a diagnosis first.");
        }
    }

    pub fn confirm_submit(&mut self) {
        self.mode = Mode::Normal;
        let token = match self.token() {
            Ok(t) => t,
            Err(e) => return self.handle_api_error(e, "Failed to submit diagnosis"),
        };
        match self.encounter.submit_diagnosis() {
            Ok(ticket) => self.send(ApiRequest::Diagnose { token, ticket }),
            Err(e) => self.notify_error(capitalise(&e.to_string())),
        }
    }

    /// Dismisses the result and returns home with a fresh profile.
    pub fn finish_case(&mut self) {
        if self.encounter.close_result().is_ok() {
            self.switch_screen(Screen::Home);
        }
    }

    /// Leaves the running case without a verdict.
    pub fn abandon_case(&mut self) {
        self.encounter.abandon();
        self.chat_input.clear();
        self.free_text.clear();
        self.switch_screen(Screen::Home);
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    // -----------------------------------------------------------------------
    // Backend results
    // -----------------------------------------------------------------------

    /// Surfaces a backend failure. Auth failures end the session.
    fn handle_api_error(&mut self, error: ApiError, context: &str) {
        if error.requires_login() {
            warn!(error = %error, "session rejected, returning to login");
            self.logout();
            self.notify_error("Session expired. Please log in again.");
        } else {
            self.notify_error(format!("{context}: {}", api_message(&error)));
        }
    }

    /// False for a session-level reply issued before the last logout.
    fn is_current(&self, generation: u64) -> bool {
        generation == self.auth_generation
    }

    /// Applies one result from the API worker.
    pub fn apply_api_response(&mut self, response: ApiResponse) {
        match response {
            ApiResponse::LoggedIn { generation, .. }
            | ApiResponse::Profile { generation, .. }
            | ApiResponse::ProfileUpdated { generation, .. }
            | ApiResponse::PasswordChanged { generation, .. }
                if !self.is_current(generation) =>
            {
                debug!(generation, current = self.auth_generation, "dropping reply for ended session");
            }
            ApiResponse::LoggedIn { outcome, .. } => {
                self.login.pending = false;
                match outcome {
                    Ok(session) => {
                        self.login = LoginForm::default();
                        self.auth = Some(session);
                        self.switch_screen(Screen::Home);
                    }
                    Err(e) => self.login.error = Some(api_message(&e)),
                }
            }
            ApiResponse::Registered(outcome) => {
                self.signup.pending = false;
                match outcome {
                    Ok(()) => {
                        self.login = LoginForm {
                            username: self.signup.username.trim().to_owned(),
                            field: 1,
                            ..LoginForm::default()
                        };
                        self.signup = SignupForm::default();
                        self.switch_screen(Screen::Login);
                        self.notify("Account created. Please log in.");
                    }
                    Err(e) => self.signup.error = Some(api_message(&e)),
                }
            }
            ApiResponse::Profile { outcome, .. } => {
                self.profile_loading = false;
                match outcome {
                    Ok(profile) => {
                        if let Some(auth) = self.auth.as_mut() {
                            auth.profile = Some(profile);
                        }
                    }
                    Err(e) => self.handle_api_error(e, "Could not load profile"),
                }
            }
            ApiResponse::ProfileUpdated { outcome, .. } => {
                self.settings.pending = false;
                match outcome {
                    Ok(profile) => {
                        if let Some(auth) = self.auth.as_mut() {
                            auth.username = profile.username.clone();
                            auth.profile = Some(profile);
                        }
                        self.notify("Profile updated.");
                    }
                    Err(e) => self.handle_api_error(e, "Could not update profile"),
                }
            }
            ApiResponse::PasswordChanged { outcome, .. } => {
                self.settings.pending = false;
                match outcome {
                    Ok(()) => {
                        self.settings.current_password.clear();
                        self.settings.new_password.clear();
                        self.notify("Password updated.");
                    }
                    Err(e) => self.handle_api_error(e, "Could not change password"),
                }
            }
            ApiResponse::CaseStarted { ticket, outcome } => {
                match self.encounter.complete_start(ticket, outcome) {
                    Completion::Applied => self.mode = Mode::Normal,
                    Completion::Failed(e) => {
                        if self.screen == Screen::Encounter {
                            self.screen = Screen::Home;
                        }
                        self.handle_api_error(e, "Could not start case");
                    }
                    Completion::Stale => {}
                }
            }
            ApiResponse::ChatReply { ticket, outcome } => {
                match self.encounter.complete_chat(&ticket, outcome) {
                    Completion::Applied => self.chat_scroll = 0,
                    Completion::Failed(e) => self.handle_api_error(e, "Could not reach the patient"),
                    Completion::Stale => {}
                }
            }
            ApiResponse::Verdict { ticket, outcome } => {
                match self.encounter.complete_diagnosis(&ticket, outcome) {
                    Completion::Applied => self.mode = Mode::Normal,
                    Completion::Failed(e) => self.handle_api_error(e, "Failed to submit diagnosis"),
                    Completion::Stale => {}
                }
            }
            ApiResponse::LoggedOut => {}
        }
    }
}

/// Message to show for a backend failure: the server's own text when it sent one.
pub fn api_message(error: &ApiError) -> String {
    match error {
        ApiError::Unauthorized(message) | ApiError::Server { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentsim_core::backend::CaseStarted;
    use dentsim_core::types::DiagnosisResult;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn signed_in() -> (AppState, UnboundedReceiver<ApiRequest>) {
        let (tx, rx) = unbounded_channel();
        let mut state = AppState::new(300, Some(tx));
        state.auth = Some(AuthSession {
            token: "tok".into(),
            username: "anca".into(),
            profile: None,
        });
        state.screen = Screen::Home;
        state.mode = Mode::Normal;
        (state, rx)
    }

    fn started(state: &mut AppState, rx: &mut UnboundedReceiver<ApiRequest>) {
        state.start_case();
        let Ok(ApiRequest::StartCase { ticket, .. }) = rx.try_recv() else {
            panic!("expected a start request");
        };
        state.apply_api_response(ApiResponse::CaseStarted {
            ticket,
            outcome: Ok(CaseStarted { session_id: "s-1".into(), greeting: None }),
        });
    }

    #[test]
    fn start_case_moves_to_encounter() {
        let (mut state, mut rx) = signed_in();
        started(&mut state, &mut rx);
        assert_eq!(state.screen, Screen::Encounter);
        assert_eq!(state.encounter.phase(), Phase::Active);
        assert_eq!(state.encounter.messages().len(), 1);
    }

    #[test]
    fn failed_start_returns_home_with_toast() {
        let (mut state, mut rx) = signed_in();
        state.start_case();
        let Ok(ApiRequest::StartCase { ticket, .. }) = rx.try_recv() else {
            panic!("expected a start request");
        };
        state.apply_api_response(ApiResponse::CaseStarted {
            ticket,
            outcome: Err(ApiError::Network("refused".into())),
        });
        assert_eq!(state.screen, Screen::Home);
        assert_eq!(state.encounter.phase(), Phase::Idle);
        let toast = state.toast.as_ref().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(toast.text.starts_with("Could not start case"));
    }

    #[test]
    fn unauthorized_reply_tears_down_session() {
        let (mut state, mut rx) = signed_in();
        started(&mut state, &mut rx);
        state.chat_input = "hello".into();
        state.send_chat();
        let Ok(ApiRequest::Chat { ticket, .. }) = rx.try_recv() else {
            panic!("expected a chat request");
        };

        state.apply_api_response(ApiResponse::ChatReply {
            ticket,
            outcome: Err(ApiError::Unauthorized("Token expired".into())),
        });

        assert!(state.auth.is_none());
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(state.encounter.phase(), Phase::Idle);
        assert!(matches!(rx.try_recv(), Ok(ApiRequest::Logout { generation: 0 })));
        assert_eq!(state.auth_generation, 1);
    }

    /// Logs out, then signs in again as someone else. Returns the refresh
    /// request the first session left in flight.
    fn relogged(state: &mut AppState, rx: &mut UnboundedReceiver<ApiRequest>) -> ApiRequest {
        state.refresh_profile();
        let Ok(old_refresh) = rx.try_recv() else {
            panic!("expected a refresh request");
        };
        state.logout();
        assert!(matches!(rx.try_recv(), Ok(ApiRequest::Logout { generation: 0 })));

        state.login.username = "mihai".into();
        state.login.password = "parola123".into();
        state.submit_login();
        let Ok(ApiRequest::Login { generation, .. }) = rx.try_recv() else {
            panic!("expected a login request");
        };
        assert_eq!(generation, 1);
        state.apply_api_response(ApiResponse::LoggedIn {
            generation,
            outcome: Ok(AuthSession { token: "tok-2".into(), username: "mihai".into(), profile: None }),
        });
        while rx.try_recv().is_ok() {}
        old_refresh
    }

    #[test]
    fn late_profile_from_previous_session_is_ignored() {
        let (mut state, mut rx) = signed_in();
        let ApiRequest::RefreshProfile { generation, .. } = relogged(&mut state, &mut rx) else {
            panic!("expected a refresh request");
        };
        assert_eq!(generation, 0);

        state.apply_api_response(ApiResponse::Profile {
            generation,
            outcome: Ok(UserProfile { username: "anca".into(), xp: 900, ..UserProfile::default() }),
        });
        assert_eq!(state.username(), "mihai");
        assert!(state.profile().is_none());

        state.apply_api_response(ApiResponse::ProfileUpdated {
            generation,
            outcome: Ok(UserProfile { username: "anca2".into(), ..UserProfile::default() }),
        });
        assert_eq!(state.username(), "mihai");
        assert!(state.toast.is_none());
    }

    #[test]
    fn late_unauthorized_from_previous_session_keeps_new_login() {
        let (mut state, mut rx) = signed_in();
        let ApiRequest::RefreshProfile { generation, .. } = relogged(&mut state, &mut rx) else {
            panic!("expected a refresh request");
        };

        state.apply_api_response(ApiResponse::Profile {
            generation,
            outcome: Err(ApiError::Unauthorized("Token expired".into())),
        });
        assert_eq!(state.screen, Screen::Home);
        assert_eq!(state.username(), "mihai");
        assert!(rx.try_recv().is_err(), "no second logout");

        // The same failure for the live session still signs out.
        state.apply_api_response(ApiResponse::Profile {
            generation: state.auth_generation,
            outcome: Err(ApiError::Unauthorized("Token expired".into())),
        });
        assert!(state.auth.is_none());
        assert_eq!(state.screen, Screen::Login);
    }

    #[test]
    fn time_up_forces_diagnosis_and_leaves_insert_mode() {
        let (tx, mut rx) = unbounded_channel();
        let mut state = AppState::new(1, Some(tx));
        state.auth = Some(AuthSession { token: "tok".into(), username: "anca".into(), profile: None });
        started(&mut state, &mut rx);
        state.mode = Mode::Insert;

        state.on_tick(Duration::from_secs(1), Instant::now());
        assert_eq!(state.encounter.phase(), Phase::Diagnosing);
        assert_eq!(state.mode, Mode::Normal);
        // The first option is pre-selected so the student can submit at once.
        assert!(state.encounter.can_submit());
    }

    #[test]
    fn streak_day_is_the_utc_date() {
        let (state, _rx) = signed_in();
        let before = Utc::now().date_naive();
        let today = state.today();
        assert!(today == before || today == Utc::now().date_naive());
    }

    #[test]
    fn toast_expires_after_ttl() {
        let (mut state, _rx) = signed_in();
        state.notify("hello");
        state.on_tick(Duration::ZERO, Instant::now());
        assert!(state.toast.is_some());
        state.on_tick(Duration::ZERO, Instant::now() + TOAST_TTL);
        assert!(state.toast.is_none());
    }

    #[test]
    fn verdict_then_finish_returns_home_and_refreshes() {
        let (mut state, mut rx) = signed_in();
        started(&mut state, &mut rx);
        state.open_diagnosis();
        state.request_submit();
        assert_eq!(state.mode, Mode::ConfirmSubmit);
        state.confirm_submit();
        let Ok(ApiRequest::Diagnose { ticket, .. }) = rx.try_recv() else {
            panic!("expected a diagnose request");
        };
        assert_eq!(ticket.diagnosis, "Reversible Pulpitis");

        state.apply_api_response(ApiResponse::Verdict {
            ticket,
            outcome: Ok(DiagnosisResult {
                correct: true,
                xp_earned: 100,
                feedback: "Well done".into(),
                correct_diagnosis_name: None,
            }),
        });
        assert_eq!(state.encounter.phase(), Phase::ResultShown);

        state.finish_case();
        assert_eq!(state.screen, Screen::Home);
        assert_eq!(state.encounter.phase(), Phase::Idle);
        assert!(matches!(rx.try_recv(), Ok(ApiRequest::RefreshProfile { .. })));
    }

    #[test]
    fn settings_prefill_from_profile() {
        let (mut state, _rx) = signed_in();
        if let Some(auth) = state.auth.as_mut() {
            auth.profile = Some(UserProfile {
                username: "anca".into(),
                role: Some("Professor".into()),
                ..UserProfile::default()
            });
        }
        state.switch_screen(Screen::Settings);
        assert_eq!(state.mode, Mode::Insert);
        assert_eq!(state.settings.username, "anca");
        assert_eq!(ROLES[state.settings.role], "Professor");
    }

    #[test]
    fn tabs_cycle_in_order() {
        assert_eq!(Screen::Home.next_tab(), Screen::Profile);
        assert_eq!(Screen::Settings.next_tab(), Screen::Home);
        assert_eq!(Screen::Home.prev_tab(), Screen::Settings);
    }
}
