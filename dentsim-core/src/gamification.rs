//! Display helpers derived from the profile snapshot.
//!
//! None of this is authoritative. XP, streaks and badges are computed
//! server-side; these functions only decide how to present them.

use chrono::NaiveDate;

use crate::catalog;
use crate::types::{Badge, UserProfile};

/// XP needed per level.
pub const XP_PER_LEVEL: i64 = 1000;

/// Level shown for `xp` (level 1 starts at zero XP).
pub fn level_for_xp(xp: i64) -> i64 {
    xp.max(0) / XP_PER_LEVEL + 1
}

/// Fraction of the current level already earned, in `0.0..1.0`.
pub fn level_progress(xp: i64) -> f64 {
    (xp.max(0) % XP_PER_LEVEL) as f64 / XP_PER_LEVEL as f64
}

/// Whether the streak was extended today.
pub fn streak_active_on(profile: &UserProfile, today: NaiveDate) -> bool {
    profile.last_active_date == Some(today)
}

/// Which badges to list in the profile view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BadgeFilter {
    #[default]
    All,
    Earned,
    Locked,
}

impl BadgeFilter {
    pub fn next(self) -> Self {
        match self {
            BadgeFilter::All => BadgeFilter::Earned,
            BadgeFilter::Earned => BadgeFilter::Locked,
            BadgeFilter::Locked => BadgeFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BadgeFilter::All => "All",
            BadgeFilter::Earned => "Earned",
            BadgeFilter::Locked => "Locked",
        }
    }
}

/// Catalog badges matched against the profile's `earned_badges`.
///
/// The backend has stored both ids and display names over time, so either
/// matches. Unknown keys are ignored.
pub fn is_earned(badge: &Badge, profile: &UserProfile) -> bool {
    profile
        .earned_badges
        .iter()
        .any(|key| key == badge.id || key == badge.name)
}

/// Badges to display for `filter`, paired with their earned flag, in catalog order.
pub fn badges_for(profile: &UserProfile, filter: BadgeFilter) -> Vec<(&'static Badge, bool)> {
    catalog::all_badges()
        .iter()
        .map(|b| (b, is_earned(b, profile)))
        .filter(|(_, earned)| match filter {
            BadgeFilter::All => true,
            BadgeFilter::Earned => *earned,
            BadgeFilter::Locked => !*earned,
        })
        .collect()
}

/// Username with the first letter upper-cased, or `"Doctor"` when unknown.
pub fn display_name(username: &str) -> String {
    if username.is_empty() {
        return "Doctor".to_owned();
    }
    capitalise(username)
}

/// Upper-cases the first character and leaves the rest alone.
pub fn capitalise(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Up to two upper-case initials from a display name.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|w| w.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with(badges: &[&str]) -> UserProfile {
        UserProfile {
            username: "anca".into(),
            earned_badges: badges.iter().map(|s| s.to_string()).collect(),
            ..UserProfile::default()
        }
    }

    #[test]
    fn levels_step_every_thousand_xp() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(999), 1);
        assert_eq!(level_for_xp(1000), 2);
        assert_eq!(level_for_xp(8750), 9);
        assert_eq!(level_for_xp(-5), 1);
        assert!((level_progress(1250) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn badges_match_by_id_or_name() {
        let profile = profile_with(&["first-diagnosis", "Week Warrior", "bogus"]);
        let earned = badges_for(&profile, BadgeFilter::Earned);
        let ids: Vec<_> = earned.iter().map(|(b, _)| b.id).collect();
        assert_eq!(ids, vec!["first-diagnosis", "streak-7"]);

        let locked = badges_for(&profile, BadgeFilter::Locked);
        assert_eq!(locked.len(), catalog::all_badges().len() - 2);
        assert_eq!(badges_for(&profile, BadgeFilter::All).len(), catalog::all_badges().len());
    }

    #[test]
    fn streak_is_active_only_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut profile = profile_with(&[]);
        assert!(!streak_active_on(&profile, today));
        profile.last_active_date = Some(today);
        assert!(streak_active_on(&profile, today));
        profile.last_active_date = today.pred_opt();
        assert!(!streak_active_on(&profile, today));
    }

    #[test]
    fn names_and_initials() {
        assert_eq!(display_name("anca"), "Anca");
        assert_eq!(display_name(""), "Doctor");
        assert_eq!(capitalise("no case is running"), "No case is running");
        assert_eq!(capitalise("ștefan"), "Ștefan");
        assert_eq!(capitalise(""), "");
        assert_eq!(initials("Dr. Sarah Chen"), "DS");
        assert_eq!(initials("james"), "J");
    }
}
