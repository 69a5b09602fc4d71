//! Layout helpers shared by every screen.
//!
//! Pure layout arithmetic plus the two chrome rows (header and status bar).
//! Called inside `terminal.draw()` on every render so each frame reflects the
//! current terminal size.

use dentsim_core::timer::format_clock;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Clear, Paragraph, Wrap},
};

use crate::app::{AppState, Mode, Screen, ToastKind};
use crate::theme::Theme;

/// Countdown values at or below this are drawn in the warning color.
pub const TIMER_WARNING_SECS: u32 = 60;

/// Returns `[header, body, status_bar]` for the current frame.
pub fn compute_layout(frame: &Frame) -> [Rect; 3] {
    frame.area().layout(&Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ]))
}

/// Inner `Rect` of a bordered panel.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered panel block. Focused panels get a thick border in the active color.
pub fn panel_block<'a>(title: &'a str, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
}

/// A `width` x `height` box centred in `area`, clamped to fit.
pub fn centered_box(area: Rect, width: u16, height: u16) -> Rect {
    area.centered(
        Constraint::Length(width.min(area.width)),
        Constraint::Length(height.min(area.height)),
    )
}

/// Draws a modal yes/no dialog over whatever is underneath.
pub fn render_confirm(frame: &mut Frame, title: &str, body: Vec<Line<'_>>, theme: &Theme) {
    let height = body.len() as u16 + 4;
    let area = centered_box(frame.area(), 56, height);
    frame.render_widget(Clear, area);

    let mut lines = body;
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[y] ", Style::default().fg(theme.success).add_modifier(Modifier::BOLD)),
        Span::raw("Confirm    "),
        Span::styled("[n] ", Style::default().fg(theme.failure).add_modifier(Modifier::BOLD)),
        Span::raw("Cancel"),
    ]));

    frame.render_widget(
        Paragraph::new(lines)
            .block(panel_block(title, true, theme))
            .wrap(Wrap { trim: true }),
        area,
    );
}

/// Top row: app name and tab bar, or the countdown while a case is running.
pub fn render_header(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let mut spans = vec![Span::styled(
        " DentSim ",
        Style::default()
            .fg(theme.status_mode_normal)
            .add_modifier(Modifier::BOLD),
    )];

    if state.screen == Screen::Encounter {
        spans.push(Span::raw(" Clinical Encounter "));
        if let Some(remaining) = state.encounter.time_remaining() {
            let color = if remaining <= TIMER_WARNING_SECS {
                theme.timer_warning
            } else {
                theme.timer_normal
            };
            spans.push(Span::styled(
                format!(" ⏱ {} ", format_clock(remaining)),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        }
    } else if state.auth.is_some() {
        for tab in Screen::TABS {
            let style = if tab == state.screen {
                Style::default()
                    .fg(theme.border_active)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().fg(theme.muted)
            };
            spans.push(Span::raw(" "));
            spans.push(Span::styled(tab.title(), style));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Bottom row: mode indicator, then the notification or a key hint.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" INSERT ", theme.status_mode_insert),
        Mode::Normal
        | Mode::HelpOverlay
        | Mode::ConfirmQuit
        | Mode::ConfirmSubmit
        | Mode::ConfirmExit => (" NORMAL ", theme.status_mode_normal),
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    match &state.toast {
        Some(toast) => {
            let color = match toast.kind {
                ToastKind::Info => theme.toast_info,
                ToastKind::Error => theme.toast_error,
            };
            spans.push(Span::styled(
                format!(" {} ", toast.text),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        }
        None => spans.push(Span::raw(format!(" {}", hint(state)))),
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}

fn hint(state: &AppState) -> &'static str {
    use dentsim_core::encounter::Phase;

    match (state.screen, state.mode) {
        (_, Mode::HelpOverlay) => "j/k scroll · ? close",
        (Screen::Login | Screen::Signup | Screen::Settings, Mode::Insert) => {
            "Tab next field · ←/→ change role · Enter submit · Esc menu"
        }
        (Screen::Login, _) => "i edit · s sign up · q quit · ? help",
        (Screen::Signup, _) => "i edit · Esc back to login · q quit",
        (Screen::Encounter, Mode::Insert) => "Enter send · Esc stop typing",
        (Screen::Encounter, _) => match state.encounter.phase() {
            Phase::Starting => "Connecting to patient...",
            Phase::Active => "i type · 1-4 tools · d diagnose · x leave · ? help",
            Phase::Diagnosing => "j/k choose · i type other · Enter submit · Esc back",
            Phase::Submitting => "Submitting diagnosis...",
            Phase::ResultShown => "Enter return to home",
            Phase::Idle => "",
        },
        (Screen::Home, _) => "s start case · Tab switch view · o log out · q quit",
        (Screen::Profile, _) => "f filter badges · j/k scroll · Tab switch view",
        (Screen::Leaderboard, _) => "f change period · Tab switch view",
        (Screen::Settings, _) => "i edit · o log out · Tab switch view",
    }
}
