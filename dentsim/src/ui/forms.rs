//! Login, sign-up, and settings forms.

use dentsim_core::types::ROLES;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};

use crate::app::{AppState, FormState, Mode};
use crate::theme::Theme;
use crate::ui::layout::{centered_box, inner_rect, panel_block};

const FORM_WIDTH: u16 = 60;

enum FieldValue<'a> {
    Text(&'a str),
    Secret(&'a str),
    Choice(&'a str),
}

/// One `label: value` row; the focused row gets a cursor or choice arrows.
fn field_line<'a>(label: &'a str, value: FieldValue<'a>, focused: bool, theme: &Theme) -> Line<'a> {
    let label_style = if focused {
        Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.muted)
    };
    let arrow = Style::default().fg(theme.border_active);
    let cursor = Span::styled("▏", Style::default().fg(theme.status_mode_insert));

    let mut spans = vec![Span::styled(format!("{label:>18}: "), label_style)];
    match value {
        FieldValue::Text(text) => spans.push(Span::raw(text)),
        FieldValue::Secret(text) => spans.push(Span::raw("•".repeat(text.chars().count()))),
        FieldValue::Choice(text) if focused => {
            spans.push(Span::styled("◀ ", arrow));
            spans.push(Span::raw(text));
            spans.push(Span::styled(" ▶", arrow));
            return Line::from(spans);
        }
        FieldValue::Choice(text) => spans.push(Span::raw(text)),
    }
    if focused {
        spans.push(cursor);
    }
    Line::from(spans)
}

fn message_line<'a>(error: Option<&'a str>, pending: bool, theme: &Theme) -> Line<'a> {
    match (error, pending) {
        (_, true) => Line::styled("Please wait...", Style::default().fg(theme.muted)),
        (Some(e), false) => Line::styled(e, Style::default().fg(theme.failure)),
        (None, false) => Line::from(""),
    }
}

fn form_frame(frame: &mut Frame, area: Rect, title: &str, height: u16, theme: &Theme) -> Rect {
    let rect = centered_box(area, FORM_WIDTH, height);
    frame.render_widget(Clear, rect);
    frame.render_widget(panel_block(title, true, theme), rect);
    inner_rect(rect)
}

pub fn render_login(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let form = &state.login;
    let editing = state.mode == Mode::Insert;
    let inner = form_frame(frame, area, " DentSim · Login ", 10, theme);

    let lines = vec![
        Line::styled("Virtual patients for dental diagnosis practice", Style::default().fg(theme.muted))
            .centered(),
        Line::from(""),
        field_line("Username", FieldValue::Text(&form.username), editing && form.focused() == 0, theme),
        field_line("Password", FieldValue::Secret(&form.password), editing && form.focused() == 1, theme),
        Line::from(""),
        message_line(form.error.as_deref(), form.pending, theme),
        Line::styled("No account? Esc then s to sign up.", Style::default().fg(theme.muted)).centered(),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn render_signup(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let form = &state.signup;
    let editing = state.mode == Mode::Insert;
    let role = ROLES.get(form.role).copied().unwrap_or(ROLES[0]);
    let inner = form_frame(frame, area, " DentSim · Create Account ", 11, theme);

    let lines = vec![
        field_line("Username", FieldValue::Text(&form.username), editing && form.focused() == 0, theme),
        field_line("Password", FieldValue::Secret(&form.password), editing && form.focused() == 1, theme),
        field_line("Role", FieldValue::Choice(role), editing && form.focused() == 2, theme),
        field_line(
            "Class code (opt.)",
            FieldValue::Text(&form.class_code),
            editing && form.focused() == 3,
            theme,
        ),
        Line::from(""),
        message_line(form.error.as_deref(), form.pending, theme),
        Line::from(""),
        Line::styled("Enter to create · Esc then b to go back", Style::default().fg(theme.muted))
            .centered(),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn render_settings(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let form = &state.settings;
    let editing = state.mode == Mode::Insert;
    let role = ROLES.get(form.role).copied().unwrap_or(ROLES[0]);

    let [profile_area, password_area, _] = area.layout(&Layout::vertical([
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Fill(1),
    ]));

    let profile_focused = editing && !form.on_password_section();
    frame.render_widget(
        Paragraph::new(vec![
            field_line("Username", FieldValue::Text(&form.username), editing && form.focused() == 0, theme),
            field_line("Role", FieldValue::Choice(role), editing && form.focused() == 1, theme),
            Line::from(""),
            Line::styled("Enter saves profile", Style::default().fg(theme.muted)),
        ])
        .block(panel_block(" Profile ", profile_focused, theme)),
        profile_area,
    );

    let password_focused = editing && form.on_password_section();
    let status = if form.pending {
        Line::styled("Please wait...", Style::default().fg(theme.muted))
    } else {
        Line::styled("Enter changes password", Style::default().fg(theme.muted))
    };
    frame.render_widget(
        Paragraph::new(vec![
            field_line(
                "Current password",
                FieldValue::Secret(&form.current_password),
                editing && form.focused() == 2,
                theme,
            ),
            field_line(
                "New password",
                FieldValue::Secret(&form.new_password),
                editing && form.focused() == 3,
                theme,
            ),
            Line::from(""),
            status,
        ])
        .block(panel_block(" Change Password ", password_focused, theme)),
        password_area,
    );
}
