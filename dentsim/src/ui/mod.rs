//! UI rendering for dentsim.
//!
//! `render()` is the single entry point called by the event loop's
//! `terminal.draw()` closure. Screens live in their own modules; shared
//! chrome and layout arithmetic live in `layout.rs`.

mod layout;
pub mod chat_view;
pub mod dashboard;
pub mod diagnosis;
pub mod forms;
pub mod help;
pub mod keybindings;

use ratatui::{Frame, style::Style, text::Line, widgets::Block};

use crate::app::{AppState, Mode, Screen};
use crate::theme::Theme;
use layout::{compute_layout, render_confirm, render_header, render_status_bar};

/// Renders one complete frame.
///
/// Called exactly once per `AppEvent::Render`. Geometry needed by the next
/// keypress (chat viewport height, tool button rects) is written back into
/// `state` here.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background)),
        frame.area(),
    );
    let [header, body, status_bar] = compute_layout(frame);

    render_header(frame, header, state, theme);

    match state.screen {
        Screen::Login => forms::render_login(frame, body, state, theme),
        Screen::Signup => forms::render_signup(frame, body, state, theme),
        Screen::Settings => forms::render_settings(frame, body, state, theme),
        Screen::Home => dashboard::render_home(frame, body, state, theme),
        Screen::Profile => dashboard::render_profile(frame, body, state, theme),
        Screen::Leaderboard => dashboard::render_leaderboard(frame, body, state, theme),
        Screen::Encounter => {
            chat_view::render_encounter(frame, body, state, theme);
            diagnosis::render_overlays(frame, state, theme);
        }
    }

    render_status_bar(frame, status_bar, state, theme);

    // Dialogs sit above every screen.
    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::ConfirmQuit => render_confirm(
            frame,
            " Quit DentSim? ",
            vec![Line::from("A case is in progress. Quitting forfeits it.")],
            theme,
        ),
        Mode::ConfirmExit => render_confirm(
            frame,
            " Leave Case? ",
            vec![Line::from(
                "If you leave now, you won't get any XP for this case.",
            )],
            theme,
        ),
        Mode::Normal | Mode::Insert | Mode::ConfirmSubmit => {}
    }
}
