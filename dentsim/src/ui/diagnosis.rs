//! Diagnosis overlays: the picker, the final confirmation, and the verdict.

use dentsim_core::catalog;
use dentsim_core::encounter::{DiagnosisChoice, Phase};
use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use crate::ui::layout::{centered_box, inner_rect, panel_block, render_confirm};

/// Draws whichever diagnosis overlay the encounter phase calls for.
pub fn render_overlays(frame: &mut Frame, state: &AppState, theme: &Theme) {
    match state.encounter.phase() {
        Phase::Diagnosing => {
            render_picker(frame, state, theme);
            if state.mode == Mode::ConfirmSubmit {
                render_confirm_submit(frame, state, theme);
            }
        }
        Phase::Submitting => {
            render_picker(frame, state, theme);
            let area = centered_box(frame.area(), 36, 3);
            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new("Submitting diagnosis...")
                    .centered()
                    .block(panel_block("", true, theme)),
                area,
            );
        }
        Phase::ResultShown => render_result(frame, state, theme),
        Phase::Idle | Phase::Starting | Phase::Active => {}
    }
}

fn render_picker(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(85));
    frame.render_widget(Clear, area);

    let title = if state.encounter.time_is_up() {
        " Time's up! Make Your Diagnosis "
    } else {
        " Make Your Diagnosis "
    };
    frame.render_widget(panel_block(title, true, theme), area);

    let inner = inner_rect(area);
    let [list_area, hint_area] =
        inner.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let mut items: Vec<ListItem> = catalog::diagnosis_options()
        .iter()
        .map(|option| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(option.name, Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  [{}]", option.category), Style::default().fg(theme.muted)),
                ]),
                Line::styled(format!("  {}", option.description), Style::default().fg(theme.muted)),
            ])
        })
        .collect();

    let editing = state.mode == Mode::Insert && state.on_free_text_row();
    let mut other = vec![Span::styled("Other: ", Style::default().add_modifier(Modifier::BOLD))];
    if state.free_text.is_empty() && !editing {
        other.push(Span::styled("press i to type a diagnosis", Style::default().fg(theme.muted)));
    } else {
        other.push(Span::raw(state.free_text.clone()));
    }
    if editing {
        other.push(Span::styled("▏", Style::default().fg(theme.status_mode_insert)));
    }
    items.push(ListItem::new(Line::from(other)));

    let list = List::new(items)
        .highlight_style(Style::default().bg(theme.highlight_bg))
        .highlight_symbol("▶ ");
    let mut list_state = ListState::default().with_selected(Some(state.diagnosis_cursor));
    frame.render_stateful_widget(list, list_area, &mut list_state);

    let hint = if state.encounter.time_is_up() {
        "j/k choose · i type other · Enter submit · x abandon case"
    } else {
        "j/k choose · i type other · Enter submit · Esc back to patient"
    };
    frame.render_widget(Line::styled(hint, Style::default().fg(theme.muted)), hint_area);
}

fn render_confirm_submit(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let chosen = match state.encounter.selection() {
        Some(DiagnosisChoice::Option(id)) => catalog::diagnosis_by_id(id)
            .map(|o| o.name.to_owned())
            .unwrap_or_default(),
        Some(DiagnosisChoice::FreeText(text)) => text.trim().to_owned(),
        None => String::new(),
    };
    render_confirm(
        frame,
        " Finalize Diagnosis ",
        vec![
            Line::from("Are you sure? You cannot change this later."),
            Line::from(""),
            Line::from(vec![
                Span::raw("Diagnosis: "),
                Span::styled(chosen, Style::default().add_modifier(Modifier::BOLD)),
            ]),
        ],
        theme,
    );
}

fn render_result(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let Some(result) = state.encounter.result() else {
        return;
    };
    let area = centered_box(frame.area(), 60, 12);
    frame.render_widget(Clear, area);

    let (headline, color) = if result.correct {
        ("Correct Diagnosis!", theme.success)
    } else {
        ("Incorrect", theme.failure)
    };

    let mut lines = vec![
        Line::styled(headline, Style::default().fg(color).add_modifier(Modifier::BOLD)).centered(),
        Line::styled(
            format!("+{} XP", result.xp_earned),
            Style::default().fg(theme.rarity_legendary).add_modifier(Modifier::BOLD),
        )
        .centered(),
        Line::from(""),
    ];
    if !result.feedback.is_empty() {
        lines.push(Line::from(result.feedback.clone()));
    }
    if !result.correct {
        if let Some(name) = &result.correct_diagnosis_name {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::raw("Correct was: "),
                Span::styled(name.clone(), Style::default().fg(theme.success).add_modifier(Modifier::BOLD)),
            ]));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::styled("Press Enter to return home", Style::default().fg(theme.muted)).centered());

    frame.render_widget(
        Paragraph::new(lines)
            .block(panel_block(" Case Result ", true, theme))
            .wrap(Wrap { trim: true }),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentsim_core::backend::CaseStarted;
    use dentsim_core::types::DiagnosisResult;
    use ratatui::{backend::TestBackend, Terminal};

    /// Runs a case through to a verdict and returns the drawn screen as text.
    fn draw_verdict(result: DiagnosisResult) -> String {
        let mut state = AppState::new(300, None);
        let encounter = &mut state.encounter;
        let ticket = encounter.begin_start().unwrap();
        encounter.complete_start(
            ticket,
            Ok(CaseStarted { session_id: "s-1".into(), greeting: None }),
        );
        encounter.open_diagnosis().unwrap();
        encounter
            .select_diagnosis(DiagnosisChoice::FreeText("Cracked cusp".into()))
            .unwrap();
        let ticket = encounter.submit_diagnosis().unwrap();
        encounter.complete_diagnosis(&ticket, Ok(result));
        assert_eq!(state.encounter.phase(), Phase::ResultShown);

        let theme = Theme::dark();
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal
            .draw(|frame| render_overlays(frame, &state, &theme))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn correct_verdict_shows_xp() {
        let screen = draw_verdict(DiagnosisResult {
            correct: true,
            xp_earned: 100,
            feedback: "Well done".into(),
            correct_diagnosis_name: None,
        });
        assert!(screen.contains("Correct Diagnosis!"));
        assert!(screen.contains("+100 XP"));
        assert!(screen.contains("Well done"));
        assert!(!screen.contains("Correct was:"));
    }

    #[test]
    fn incorrect_verdict_names_the_answer() {
        let screen = draw_verdict(DiagnosisResult {
            correct: false,
            xp_earned: 0,
            feedback: String::new(),
            correct_diagnosis_name: Some("Pulp Necrosis".into()),
        });
        assert!(screen.contains("Incorrect"));
        assert!(screen.contains("+0 XP"));
        assert!(screen.contains("Correct was: Pulp Necrosis"));
        assert!(screen.contains("Press Enter to return home"));
    }
}
