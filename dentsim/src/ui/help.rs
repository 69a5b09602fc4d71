//! Help overlay.
//!
//! Drawn inside the same `terminal.draw()` closure as everything else:
//! `Clear` erases the area, then a bordered `Paragraph` goes on top.

use ratatui::{
    Frame,
    layout::Constraint,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the help overlay as a centred modal.
///
/// Skipped on terminals narrower than 60 columns to avoid a degenerate `Rect`.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help · j/k scroll, ? or Esc to dismiss ")
        .border_style(ratatui::style::Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Views"),
        Line::from("  Tab / Shift-Tab   Next / previous view (Home, Profile, Leaderboard, Settings)"),
        Line::from("  s / Enter         Start a random patient case (Home)"),
        Line::from("  r                 Refresh profile"),
        Line::from("  f                 Cycle badge filter (Profile) or period (Leaderboard)"),
        Line::from("  o                 Log out"),
        Line::from(""),
        Line::from("Forms"),
        Line::from("  i / Enter         Start editing"),
        Line::from("  Tab / ↓  ↑        Next / previous field"),
        Line::from("  ← / →             Change role"),
        Line::from("  Enter             Submit"),
        Line::from("  Esc               Stop editing"),
        Line::from(""),
        Line::from("Encounter"),
        Line::from("  i                 Type a question for the patient (Enter sends)"),
        Line::from("  1 2 3 4           Examine, percussion, cold test, X-ray"),
        Line::from("  d                 Open the diagnosis view (pauses the clock)"),
        Line::from("  j / k, g / G      Scroll the conversation"),
        Line::from("  x / Esc           Leave the case (no XP)"),
        Line::from(""),
        Line::from("Diagnosis"),
        Line::from("  j / k             Choose an option"),
        Line::from("  i                 Type your own diagnosis on the Other row"),
        Line::from("  Enter             Submit (asks for confirmation)"),
        Line::from("  Esc               Back to the patient while time remains"),
        Line::from(""),
        Line::from("General"),
        Line::from("  ?                 Open / close this help"),
        Line::from("  q                 Quit (confirms while a case is running)"),
        Line::from("  Ctrl-c            Quit immediately"),
    ])
}
