//! Signed-in views: home, profile with badges, and the leaderboard.

use dentsim_core::catalog;
use dentsim_core::gamification::{
    badges_for, display_name, initials, level_for_xp, level_progress, streak_active_on, XP_PER_LEVEL,
};
use dentsim_core::types::UserProfile;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Gauge, Paragraph, Row, Table, Wrap},
};

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_home(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let block = panel_block(" Home ", true, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let Some(profile) = state.profile() else {
        let text = if state.profile_loading { "Loading profile..." } else { "No profile loaded." };
        frame.render_widget(Line::styled(text, Style::default().fg(theme.muted)), inner);
        return;
    };

    let [greeting_area, gauge_area, stats_area, action_area] = inner.layout(&Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Fill(1),
    ]));

    let name = display_name(if profile.username.is_empty() {
        state.username()
    } else {
        profile.username.as_str()
    });
    let role = profile.role.as_deref().unwrap_or("Dental Student");
    frame.render_widget(
        Paragraph::new(vec![
            Line::styled(
                format!("Welcome back, {name}"),
                Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD),
            ),
            Line::styled(role.to_owned(), Style::default().fg(theme.muted)),
        ]),
        greeting_area,
    );

    frame.render_widget(level_gauge(profile, theme), gauge_area);

    let streak_note = if streak_active_on(profile, state.today()) {
        Span::styled("  active today", Style::default().fg(theme.success))
    } else {
        Span::styled("  solve a case today to keep it", Style::default().fg(theme.muted))
    };
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    format!("🔥 {}-day streak", profile.streak),
                    Style::default().fg(theme.medal).add_modifier(Modifier::BOLD),
                ),
                streak_note,
            ]),
            Line::from(format!(
                "{} cases completed · {:.0}% accuracy",
                profile.cases_completed, profile.accuracy
            )),
        ]),
        stats_area,
    );

    let action = if state.encounter.is_active() {
        "A case is in progress. Press s to resume it."
    } else {
        "Press s or Enter to start a random patient case."
    };
    frame.render_widget(
        Paragraph::new(Line::styled(action, Style::default().add_modifier(Modifier::BOLD)))
            .wrap(Wrap { trim: true }),
        action_area,
    );
}

fn level_gauge<'a>(profile: &UserProfile, theme: &Theme) -> Gauge<'a> {
    let level = level_for_xp(profile.xp);
    let into_level = profile.xp.max(0) % XP_PER_LEVEL;
    Gauge::default()
        .gauge_style(Style::default().fg(theme.success).bg(theme.highlight_bg))
        .ratio(level_progress(profile.xp))
        .label(format!("Level {level} · {into_level}/{XP_PER_LEVEL} XP"))
}

pub fn render_profile(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let [summary_area, badges_area] =
        area.layout(&Layout::vertical([Constraint::Length(7), Constraint::Fill(1)]));

    frame.render_widget(panel_block(" Profile ", false, theme), summary_area);
    let summary = inner_rect(summary_area);

    let Some(profile) = state.profile() else {
        let text = if state.profile_loading { "Loading profile..." } else { "No profile loaded." };
        frame.render_widget(Line::styled(text, Style::default().fg(theme.muted)), summary);
        return;
    };

    let name = display_name(&profile.username);
    let rank = profile.rank.map(|r| format!("#{r}")).unwrap_or_else(|| "–".to_owned());
    let [text_area, gauge_area] =
        summary.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(vec![
                Span::styled(
                    format!("[{}] ", initials(&name)),
                    Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD),
                ),
                Span::styled(name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("  {}", profile.role.as_deref().unwrap_or("Dental Student")),
                    Style::default().fg(theme.muted),
                ),
            ]),
            Line::from(""),
            Line::from(format!(
                "XP {}   Accuracy {:.0}%   Cases {}   Streak {}   Rank {}",
                profile.xp, profile.accuracy, profile.cases_completed, profile.streak, rank
            )),
        ]),
        text_area,
    );
    frame.render_widget(level_gauge(profile, theme), gauge_area);

    let badges = badges_for(profile, state.badge_filter);
    let earned_total = badges_for(profile, dentsim_core::gamification::BadgeFilter::Earned).len();
    let title = format!(
        " Badges · {} ({}/{} earned) ",
        state.badge_filter.label(),
        earned_total,
        catalog::all_badges().len()
    );

    let mut lines = Vec::with_capacity(badges.len() * 2);
    for (badge, earned) in badges {
        let (marker, name_style) = if earned {
            ("★", Style::default().fg(theme.rarity(badge.rarity)).add_modifier(Modifier::BOLD))
        } else {
            ("🔒", Style::default().fg(theme.muted))
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker} {}", badge.name), name_style),
            Span::styled(
                format!("  {} · +{} XP", badge.rarity.label(), badge.xp_reward),
                Style::default().fg(theme.rarity(badge.rarity)),
            ),
        ]));
        lines.push(Line::styled(
            format!("   {} ({})", badge.description, badge.requirement),
            Style::default().fg(theme.muted),
        ));
    }
    if lines.is_empty() {
        lines.push(Line::styled("No badges here yet.", Style::default().fg(theme.muted)));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .block(panel_block(&title, true, theme))
            .scroll((state.badge_scroll, 0)),
        badges_area,
    );
}

pub fn render_leaderboard(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let title = format!(" Leaderboard · {} ", state.leaderboard_period.label());

    let rows = catalog::leaderboard().iter().map(|entry| {
        let medal = match entry.rank {
            1 => "🥇",
            2 => "🥈",
            3 => "🥉",
            _ => "",
        };
        let name = if entry.is_current_user {
            format!("{} (You)", entry.name)
        } else {
            entry.name.to_owned()
        };
        let style = if entry.is_current_user {
            Style::default().bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(Line::from(vec![
                Span::styled(format!("{medal} "), Style::default().fg(theme.medal)),
                Span::raw(format!("#{}", entry.rank)),
            ])),
            Cell::from(name),
            Cell::from(format!("Lv {}", entry.level)),
            Cell::from(format!("{} XP", entry.total_xp)),
            Cell::from(format!("🔥 {}", entry.streak)),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Fill(1),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(6),
        ],
    )
    .header(
        Row::new(vec!["Rank", "Name", "Level", "XP", "Streak"])
            .style(Style::default().fg(theme.muted).add_modifier(Modifier::BOLD)),
    )
    .block(panel_block(&title, true, theme));

    frame.render_widget(table, area);
}
