//! Encounter screen: message log, clinician tool strip, and chat input.
//!
//! The log is pre-wrapped to the panel width so the scroll offset can be
//! measured from the newest line; `chat_scroll == 0` keeps the tail in view.

use chrono::Local;
use dentsim_core::encounter::Phase;
use dentsim_core::types::{ClinicalTool, Message, MessageKind};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_encounter(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let [log_area, tools_area, input_area] = area.layout(&Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Length(3),
    ]));

    state.chat_viewport_height = inner_rect(log_area).height;

    render_log(frame, log_area, state, theme);
    render_tools(frame, tools_area, state, theme);
    render_input(frame, input_area, state, theme);
}

fn render_log(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let title = match state.encounter.case() {
        Some(case) => format!(
            " Patient Chat · case {} · started {} ",
            case.session_id,
            case.started_at.with_timezone(&Local).format("%H:%M")
        ),
        None => " Patient Chat ".to_owned(),
    };
    frame.render_widget(panel_block(&title, state.mode != Mode::Insert, theme), area);
    let inner = inner_rect(area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    if state.encounter.phase() == Phase::Starting {
        frame.render_widget(
            Paragraph::new(Line::styled("Connecting to patient...", Style::default().fg(theme.muted))),
            inner,
        );
        return;
    }

    let mut lines: Vec<Line<'static>> = Vec::new();
    for message in state.encounter.messages() {
        message_lines(message, inner.width as usize, theme, &mut lines);
    }
    if state.encounter.chat_in_flight() {
        lines.push(Line::styled(
            "Patient is typing...",
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        ));
    }

    let total = lines.len() as u16;
    let max_scroll = total.saturating_sub(inner.height);
    state.chat_scroll = state.chat_scroll.min(max_scroll);
    let offset = max_scroll - state.chat_scroll;

    frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), inner);
}

/// Appends the rendered lines of one message: a header, the wrapped body,
/// and a blank separator.
fn message_lines(message: &Message, width: usize, theme: &Theme, out: &mut Vec<Line<'static>>) {
    let time = message.timestamp.with_timezone(&Local).format("%H:%M").to_string();
    let (author, color) = match message.kind {
        MessageKind::Patient => ("Patient", theme.patient_message),
        MessageKind::Student => ("You", theme.student_message),
        MessageKind::System => ("Clinic", theme.system_message),
    };

    out.push(Line::from(vec![
        Span::styled(author, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {time}"), Style::default().fg(theme.muted)),
    ]));

    let body_style = match message.kind {
        MessageKind::System => Style::default().fg(color).add_modifier(Modifier::ITALIC),
        _ => Style::default().fg(color),
    };
    for row in wrap_text(&message.content, width.saturating_sub(2).max(1)) {
        out.push(Line::styled(format!("  {row}"), body_style));
    }
    out.push(Line::from(""));
}

fn render_tools(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let enabled = state.encounter.phase() == Phase::Active;
    let rects: [Rect; 4] = area.layout(&Layout::horizontal([Constraint::Fill(1); 4]));
    state.tool_rects = rects;

    for (i, (tool, rect)) in ClinicalTool::ALL.iter().zip(rects).enumerate() {
        let style = if enabled {
            Style::default().fg(theme.system_message).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.muted)
        };
        frame.render_widget(
            Paragraph::new(Line::styled(format!("[{}] {}", i + 1, tool.label()), style))
                .centered()
                .block(panel_block("", false, theme)),
            rect,
        );
    }
}

fn render_input(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let phase = state.encounter.phase();
    let typing = state.mode == Mode::Insert && phase == Phase::Active;
    let title = if state.encounter.chat_in_flight() {
        " Message (waiting for reply) "
    } else {
        " Message "
    };
    let block = panel_block(title, typing, theme);

    let line = if state.chat_input.is_empty() && !typing {
        let placeholder = match phase {
            Phase::Active => "Press i to ask the patient a question",
            Phase::Diagnosing | Phase::Submitting => "Chat is closed while you diagnose",
            Phase::ResultShown => "Case complete",
            Phase::Idle | Phase::Starting => "",
        };
        Line::styled(placeholder, Style::default().fg(theme.muted))
    } else {
        let mut spans = vec![Span::raw(tail_fit(&state.chat_input, inner_rect(area).width))];
        if typing {
            spans.push(Span::styled("▏", Style::default().fg(theme.status_mode_insert)));
        }
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// The trailing part of `text` that fits in `width` cells, so the cursor end stays visible.
fn tail_fit(text: &str, width: u16) -> String {
    let width = width.saturating_sub(1) as usize;
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(width)).collect()
}

/// Greedy word wrap on character counts. Words longer than `width` are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for paragraph in text.split('\n') {
        let mut row = String::new();
        let mut row_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if row_len > 0 {
                    rows.push(std::mem::take(&mut row));
                    row_len = 0;
                }
                let rest = word.split_off(width);
                rows.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if row_len == 0 { word.len() } else { row_len + 1 + word.len() };
            if needed > width && row_len > 0 {
                rows.push(std::mem::take(&mut row));
                row_len = 0;
            }
            if row_len > 0 {
                row.push(' ');
                row_len += 1;
            }
            row_len += word.len();
            row.extend(word);
        }
        rows.push(row);
    }
    rows
}
