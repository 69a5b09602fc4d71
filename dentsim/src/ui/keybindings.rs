//! Keybinding dispatcher for dentsim.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns a
//! `KeyAction` telling the event loop whether to continue or quit. The
//! dispatcher branches first on `state.mode`, then on the screen (and, on the
//! encounter screen, on the encounter phase).

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use dentsim_core::encounter::Phase;
use dentsim_core::types::ClinicalTool;
use ratatui::layout::Position;

use crate::app::{AppState, FormState, Mode, Screen};

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

/// Dispatches a key event to the handler matching the current mode.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmQuit => handle_confirm_quit(key, state),
        Mode::ConfirmSubmit => handle_confirm_submit(key, state),
        Mode::ConfirmExit => handle_confirm_exit(key, state),
        Mode::Insert => handle_insert(key, state),
        Mode::Normal => handle_normal(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            return KeyAction::Continue;
        }
        KeyCode::Char('q') => {
            if state.encounter.is_active() {
                state.mode = Mode::ConfirmQuit;
                return KeyAction::Continue;
            }
            return KeyAction::Quit;
        }
        _ => {}
    }

    match state.screen {
        Screen::Login => match key.code {
            KeyCode::Char('i') | KeyCode::Enter => state.mode = Mode::Insert,
            KeyCode::Char('s') => {
                state.login.error = None;
                state.switch_screen(Screen::Signup);
            }
            _ => {}
        },
        Screen::Signup => match key.code {
            KeyCode::Char('i') | KeyCode::Enter => state.mode = Mode::Insert,
            KeyCode::Char('b') | KeyCode::Esc => state.switch_screen(Screen::Login),
            _ => {}
        },
        Screen::Encounter => handle_encounter(key, state),
        Screen::Home | Screen::Profile | Screen::Leaderboard | Screen::Settings => {
            handle_tabs(key, state)
        }
    }
    KeyAction::Continue
}

/// Keys shared by the signed-in tabbed views.
fn handle_tabs(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Tab => state.switch_screen(state.screen.next_tab()),
        KeyCode::BackTab => state.switch_screen(state.screen.prev_tab()),
        KeyCode::Char('o') => state.logout(),
        KeyCode::Char('r') => state.refresh_profile(),
        _ => match state.screen {
            Screen::Home => {
                if matches!(key.code, KeyCode::Char('s') | KeyCode::Enter) {
                    state.start_case();
                }
            }
            Screen::Profile => match key.code {
                KeyCode::Char('f') => {
                    state.badge_filter = state.badge_filter.next();
                    state.badge_scroll = 0;
                }
                KeyCode::Char('j') | KeyCode::Down => {
                    state.badge_scroll = state.badge_scroll.saturating_add(1)
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    state.badge_scroll = state.badge_scroll.saturating_sub(1)
                }
                _ => {}
            },
            Screen::Leaderboard => {
                if key.code == KeyCode::Char('f') {
                    state.leaderboard_period = state.leaderboard_period.next();
                }
            }
            Screen::Settings => {
                if matches!(key.code, KeyCode::Char('i') | KeyCode::Enter) {
                    state.mode = Mode::Insert;
                }
            }
            _ => {}
        },
    }
}

fn handle_encounter(key: KeyEvent, state: &mut AppState) {
    match state.encounter.phase() {
        Phase::Idle => state.switch_screen(Screen::Home),
        Phase::Starting => {
            if key.code == KeyCode::Esc {
                state.abandon_case();
            }
        }
        Phase::Active => handle_chat_key(key, state),
        Phase::Diagnosing => handle_picker_key(key, state),
        Phase::Submitting => {}
        Phase::ResultShown => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                state.finish_case();
            }
        }
    }
}

fn handle_chat_key(key: KeyEvent, state: &mut AppState) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let half_page = (state.chat_viewport_height / 2).max(1);
    match key.code {
        KeyCode::Char('i') | KeyCode::Enter => state.mode = Mode::Insert,
        KeyCode::Char('d') if ctrl => state.scroll_chat_down(half_page),
        KeyCode::Char('u') if ctrl => state.scroll_chat_up(half_page),
        KeyCode::Char('d') => state.open_diagnosis(),
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            state.use_tool(ClinicalTool::ALL[index]);
        }
        KeyCode::Char('j') | KeyCode::Down => state.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_chat_up(1),
        KeyCode::Char('g') => state.chat_scroll = u16::MAX,
        KeyCode::Char('G') => state.chat_scroll = 0,
        KeyCode::Char('x') | KeyCode::Esc => state.mode = Mode::ConfirmExit,
        _ => {}
    }
}

fn handle_picker_key(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.move_diagnosis_cursor(true),
        KeyCode::Char('k') | KeyCode::Up => state.move_diagnosis_cursor(false),
        KeyCode::Char('i') | KeyCode::Char('/') => {
            state.diagnosis_cursor = state.diagnosis_rows() - 1;
            state.sync_selection();
            state.mode = Mode::Insert;
        }
        KeyCode::Enter => state.request_submit(),
        KeyCode::Esc => state.cancel_diagnosis(),
        KeyCode::Char('x') => state.mode = Mode::ConfirmExit,
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Insert mode
// ---------------------------------------------------------------------------

fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if key.code == KeyCode::Esc {
        state.mode = Mode::Normal;
        return KeyAction::Continue;
    }
    match state.screen {
        Screen::Login => {
            if edit_form(key, &mut state.login) {
                state.submit_login();
            }
        }
        Screen::Signup => {
            if edit_form(key, &mut state.signup) {
                state.submit_signup();
            }
        }
        Screen::Settings => {
            if edit_form(key, &mut state.settings) {
                state.submit_settings();
            }
        }
        Screen::Encounter => match state.encounter.phase() {
            Phase::Active => match key.code {
                KeyCode::Enter => state.send_chat(),
                KeyCode::Backspace => {
                    state.chat_input.pop();
                }
                KeyCode::Char(c) => state.chat_input.push(c),
                _ => {}
            },
            Phase::Diagnosing => {
                match key.code {
                    KeyCode::Enter => {
                        state.mode = Mode::Normal;
                        state.request_submit();
                        return KeyAction::Continue;
                    }
                    KeyCode::Backspace => {
                        state.free_text.pop();
                    }
                    KeyCode::Char(c) => state.free_text.push(c),
                    _ => {}
                }
                state.sync_selection();
            }
            _ => state.mode = Mode::Normal,
        },
        Screen::Home | Screen::Profile | Screen::Leaderboard => state.mode = Mode::Normal,
    }
    KeyAction::Continue
}

/// Applies an editing key to a form. Returns `true` when Enter asks to submit.
fn edit_form(key: KeyEvent, form: &mut impl FormState) -> bool {
    match key.code {
        KeyCode::Enter => return true,
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Left => form.cycle_choice(false),
        KeyCode::Right => form.cycle_choice(true),
        KeyCode::Backspace => {
            if let Some(text) = form.text_mut() {
                text.pop();
            }
        }
        KeyCode::Char(' ') if form.text_mut().is_none() => form.cycle_choice(true),
        KeyCode::Char(c) => {
            if let Some(text) = form.text_mut() {
                text.push(c);
            }
        }
        _ => {}
    }
    false
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_confirm_quit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => KeyAction::Quit,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

fn handle_confirm_submit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => state.confirm_submit(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_confirm_exit(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => state.abandon_case(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Click a tool button to use it; the wheel scrolls the conversation, the
/// badge list, or the help overlay.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            handle_mouse_click(mouse.column, mouse.row, state)
        }
        MouseEventKind::ScrollUp => scroll_by(state, -3),
        MouseEventKind::ScrollDown => scroll_by(state, 3),
        _ => {}
    }
    KeyAction::Continue
}

fn handle_mouse_click(col: u16, row: u16, state: &mut AppState) {
    if state.screen != Screen::Encounter || state.mode != Mode::Normal {
        return;
    }
    let pos = Position { x: col, y: row };
    if let Some(index) = state.tool_rects.iter().position(|r| r.contains(pos)) {
        state.use_tool(ClinicalTool::ALL[index]);
    }
}

fn scroll_by(state: &mut AppState, delta: i16) {
    let amount = delta.unsigned_abs();
    if state.mode == Mode::HelpOverlay {
        state.help_scroll = if delta < 0 {
            state.help_scroll.saturating_sub(amount)
        } else {
            state.help_scroll.saturating_add(amount)
        };
        return;
    }
    match state.screen {
        Screen::Encounter => {
            if delta < 0 {
                state.scroll_chat_up(amount);
            } else {
                state.scroll_chat_down(amount);
            }
        }
        Screen::Profile => {
            state.badge_scroll = if delta < 0 {
                state.badge_scroll.saturating_sub(amount)
            } else {
                state.badge_scroll.saturating_add(amount)
            };
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{ApiRequest, ApiResponse};
    use dentsim_core::auth::AuthSession;
    use dentsim_core::backend::CaseStarted;
    use dentsim_core::types::MessageKind;
    use ratatui::layout::Rect;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn press(state: &mut AppState, code: KeyCode) -> KeyAction {
        handle_key(KeyEvent::new(code, KeyModifiers::NONE), state)
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            press(state, KeyCode::Char(c));
        }
    }

    fn logged_out() -> (AppState, UnboundedReceiver<ApiRequest>) {
        let (tx, rx) = unbounded_channel();
        (AppState::new(300, Some(tx)), rx)
    }

    fn in_case() -> (AppState, UnboundedReceiver<ApiRequest>) {
        let (mut state, mut rx) = logged_out();
        state.auth = Some(AuthSession {
            token: "tok".into(),
            username: "anca".into(),
            profile: None,
        });
        state.switch_screen(Screen::Home);
        while rx.try_recv().is_ok() {}

        press(&mut state, KeyCode::Char('s'));
        let Ok(ApiRequest::StartCase { ticket, .. }) = rx.try_recv() else {
            panic!("expected a start request");
        };
        state.apply_api_response(ApiResponse::CaseStarted {
            ticket,
            outcome: Ok(CaseStarted { session_id: "s-1".into(), greeting: None }),
        });
        (state, rx)
    }

    #[test]
    fn blank_login_is_rejected_inline() {
        let (mut state, mut rx) = logged_out();
        assert_eq!(state.mode, Mode::Insert);
        type_text(&mut state, "anca");
        press(&mut state, KeyCode::Enter);

        assert_eq!(
            state.login.error.as_deref(),
            Some("Please enter both username and password.")
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn login_form_sends_credentials() {
        let (mut state, mut rx) = logged_out();
        type_text(&mut state, "anca");
        press(&mut state, KeyCode::Tab);
        type_text(&mut state, "parola123");
        press(&mut state, KeyCode::Enter);

        assert!(state.login.pending);
        match rx.try_recv() {
            Ok(ApiRequest::Login { generation, credentials }) => {
                assert_eq!(generation, 0);
                assert_eq!(credentials.username, "anca");
                assert_eq!(credentials.password, "parola123");
            }
            other => panic!("expected login, got {other:?}"),
        }
        // A second Enter while pending does nothing.
        press(&mut state, KeyCode::Enter);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn signup_role_cycles_with_arrows() {
        let (mut state, _rx) = logged_out();
        press(&mut state, KeyCode::Esc);
        press(&mut state, KeyCode::Char('s'));
        assert_eq!(state.screen, Screen::Signup);
        assert_eq!(state.mode, Mode::Insert);

        press(&mut state, KeyCode::Tab);
        press(&mut state, KeyCode::Tab);
        press(&mut state, KeyCode::Right);
        press(&mut state, KeyCode::Right);
        assert_eq!(state.signup.role, 2);
        press(&mut state, KeyCode::Left);
        assert_eq!(state.signup.role, 1);
        // Typing on the role field does not write anywhere.
        type_text(&mut state, "zz");
        assert!(state.signup.username.is_empty());
        assert!(state.signup.class_code.is_empty());
    }

    #[test]
    fn quit_needs_confirmation_only_during_a_case() {
        let (mut state, _rx) = logged_out();
        press(&mut state, KeyCode::Esc);
        assert_eq!(press(&mut state, KeyCode::Char('q')), KeyAction::Quit);

        let (mut state, _rx) = in_case();
        assert_eq!(press(&mut state, KeyCode::Char('q')), KeyAction::Continue);
        assert_eq!(state.mode, Mode::ConfirmQuit);
        press(&mut state, KeyCode::Char('n'));
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn typing_and_sending_a_question() {
        let (mut state, mut rx) = in_case();
        press(&mut state, KeyCode::Char('i'));
        type_text(&mut state, "Does it hurt?");
        press(&mut state, KeyCode::Enter);

        match rx.try_recv() {
            Ok(ApiRequest::Chat { ticket, .. }) => assert_eq!(ticket.message, "Does it hurt?"),
            other => panic!("expected chat, got {other:?}"),
        }
        assert!(state.chat_input.is_empty());
        assert!(state.encounter.chat_in_flight());

        // Second send while waiting is refused and keeps the draft.
        type_text(&mut state, "Hello?");
        press(&mut state, KeyCode::Enter);
        assert!(rx.try_recv().is_err());
        assert_eq!(state.chat_input, "Hello?");
    }

    #[test]
    fn whitespace_message_is_not_sent() {
        let (mut state, mut rx) = in_case();
        press(&mut state, KeyCode::Char('i'));
        type_text(&mut state, "   ");
        press(&mut state, KeyCode::Enter);
        assert!(rx.try_recv().is_err());
        assert_eq!(state.encounter.messages().len(), 1);
    }

    #[test]
    fn number_keys_use_tools() {
        let (mut state, _rx) = in_case();
        press(&mut state, KeyCode::Char('4'));
        let last = state.encounter.messages().last().unwrap();
        assert_eq!(last.kind, MessageKind::System);
        assert!(last.content.starts_with("[X-ray]"));
    }

    #[test]
    fn clicking_a_tool_button() {
        let (mut state, _rx) = in_case();
        state.tool_rects[1] = Rect::new(10, 20, 10, 3);
        handle_mouse(
            MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 12,
                row: 21,
                modifiers: KeyModifiers::NONE,
            },
            &mut state,
        );
        let last = state.encounter.messages().last().unwrap();
        assert!(last.content.starts_with("[Percussion Test]"));
    }

    #[test]
    fn diagnosis_needs_two_confirmations() {
        let (mut state, mut rx) = in_case();
        press(&mut state, KeyCode::Char('d'));
        assert_eq!(state.encounter.phase(), Phase::Diagnosing);

        press(&mut state, KeyCode::Char('j'));
        press(&mut state, KeyCode::Char('j'));
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.mode, Mode::ConfirmSubmit);
        assert!(rx.try_recv().is_err());

        press(&mut state, KeyCode::Char('y'));
        match rx.try_recv() {
            Ok(ApiRequest::Diagnose { ticket, .. }) => assert_eq!(ticket.diagnosis, "Pulp Necrosis"),
            other => panic!("expected diagnose, got {other:?}"),
        }
        assert_eq!(state.encounter.phase(), Phase::Submitting);
    }

    #[test]
    fn free_text_diagnosis() {
        let (mut state, mut rx) = in_case();
        press(&mut state, KeyCode::Char('d'));
        press(&mut state, KeyCode::Char('i'));
        assert!(state.on_free_text_row());
        // Empty free text cannot be submitted.
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.toast.is_some());

        press(&mut state, KeyCode::Char('i'));
        type_text(&mut state, "Cracked cusp");
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.mode, Mode::ConfirmSubmit);
        press(&mut state, KeyCode::Enter);
        match rx.try_recv() {
            Ok(ApiRequest::Diagnose { ticket, .. }) => assert_eq!(ticket.diagnosis, "Cracked cusp"),
            other => panic!("expected diagnose, got {other:?}"),
        }
    }

    #[test]
    fn escape_returns_to_patient_until_time_is_up() {
        let (mut state, _rx) = in_case();
        press(&mut state, KeyCode::Char('d'));
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.encounter.phase(), Phase::Active);

        state.on_tick(std::time::Duration::from_secs(300), std::time::Instant::now());
        assert_eq!(state.encounter.phase(), Phase::Diagnosing);
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.encounter.phase(), Phase::Diagnosing);
    }

    #[test]
    fn leaving_a_case_asks_first() {
        let (mut state, _rx) = in_case();
        press(&mut state, KeyCode::Char('x'));
        assert_eq!(state.mode, Mode::ConfirmExit);
        press(&mut state, KeyCode::Char('y'));
        assert_eq!(state.screen, Screen::Home);
        assert!(!state.encounter.is_active());
    }
}
