//! Static reference data shipped with the client.
//!
//! The diagnosis list and badge definitions are read-only and never fetched.
//! The leaderboard table stands in for a server feed that does not exist yet.

use crate::types::{Badge, BadgeRarity, DiagnosisOption, LeaderboardEntry};

/// Greeting seeded into the log when the backend does not supply one.
pub const DEFAULT_GREETING: &str =
    "Patient has entered the office. Review the case file and begin.";

static DIAGNOSIS_OPTIONS: [DiagnosisOption; 8] = [
    DiagnosisOption {
        id: "reversible-pulpitis",
        name: "Reversible Pulpitis",
        description: "Inflammation of the pulp that can heal if the cause is removed",
        category: "Pulpal",
    },
    DiagnosisOption {
        id: "irreversible-pulpitis",
        name: "Irreversible Pulpitis with Periapical Abscess",
        description: "Severe pulp inflammation with periapical involvement requiring treatment",
        category: "Pulpal",
    },
    DiagnosisOption {
        id: "pulp-necrosis",
        name: "Pulp Necrosis",
        description: "Death of the pulp tissue",
        category: "Pulpal",
    },
    DiagnosisOption {
        id: "chronic-periodontitis",
        name: "Chronic Periodontitis",
        description: "Progressive loss of alveolar bone with periodontal pocket formation",
        category: "Periodontal",
    },
    DiagnosisOption {
        id: "periapical-abscess",
        name: "Acute Periapical Abscess",
        description: "Localized collection of pus in the periapical region",
        category: "Periapical",
    },
    DiagnosisOption {
        id: "cracked-tooth",
        name: "Cracked Tooth Syndrome",
        description: "Incomplete fracture of a vital posterior tooth",
        category: "Structural",
    },
    DiagnosisOption {
        id: "dentinal-hypersensitivity",
        name: "Dentinal Hypersensitivity",
        description: "Pain from exposed dentin in response to stimuli",
        category: "Other",
    },
    DiagnosisOption {
        id: "acute-gingivitis",
        name: "Acute Gingivitis",
        description: "Inflammation of the gingiva without attachment loss",
        category: "Periodontal",
    },
];

static BADGES: [Badge; 12] = [
    Badge {
        id: "first-diagnosis",
        name: "First Steps",
        description: "Complete your first diagnosis case",
        rarity: BadgeRarity::Common,
        requirement: "Complete 1 case",
        xp_reward: 50,
    },
    Badge {
        id: "streak-7",
        name: "Week Warrior",
        description: "Maintain a 7-day streak",
        rarity: BadgeRarity::Rare,
        requirement: "7-day streak",
        xp_reward: 150,
    },
    Badge {
        id: "perfect-10",
        name: "Perfect Ten",
        description: "Get 10 diagnoses correct in a row",
        rarity: BadgeRarity::Epic,
        requirement: "10 correct in a row",
        xp_reward: 300,
    },
    Badge {
        id: "speed-demon",
        name: "Speed Demon",
        description: "Complete a diagnosis in under 2 minutes",
        rarity: BadgeRarity::Rare,
        requirement: "Complete case < 2 min",
        xp_reward: 100,
    },
    Badge {
        id: "endodontist",
        name: "Endodontist Expert",
        description: "Master 20 pulp-related cases",
        rarity: BadgeRarity::Epic,
        requirement: "Complete 20 endo cases",
        xp_reward: 500,
    },
    Badge {
        id: "periodontal-pro",
        name: "Periodontal Pro",
        description: "Master 20 periodontal cases",
        rarity: BadgeRarity::Epic,
        requirement: "Complete 20 perio cases",
        xp_reward: 500,
    },
    Badge {
        id: "streak-30",
        name: "Monthly Master",
        description: "Maintain a 30-day streak",
        rarity: BadgeRarity::Legendary,
        requirement: "30-day streak",
        xp_reward: 1000,
    },
    Badge {
        id: "diagnostician",
        name: "Master Diagnostician",
        description: "Complete 100 diagnosis cases",
        rarity: BadgeRarity::Legendary,
        requirement: "Complete 100 cases",
        xp_reward: 2000,
    },
    Badge {
        id: "early-bird",
        name: "Early Bird",
        description: "Complete a case before 7 AM",
        rarity: BadgeRarity::Common,
        requirement: "Practice before 7 AM",
        xp_reward: 25,
    },
    Badge {
        id: "night-owl",
        name: "Night Owl",
        description: "Complete a case after 11 PM",
        rarity: BadgeRarity::Common,
        requirement: "Practice after 11 PM",
        xp_reward: 25,
    },
    Badge {
        id: "team-player",
        name: "Team Player",
        description: "Join 3 different classes",
        rarity: BadgeRarity::Rare,
        requirement: "Join 3 classes",
        xp_reward: 100,
    },
    Badge {
        id: "radiograph-reader",
        name: "Radiograph Reader",
        description: "Use the X-ray tool in 50 cases",
        rarity: BadgeRarity::Rare,
        requirement: "Use X-ray 50 times",
        xp_reward: 200,
    },
];

static LEADERBOARD: [LeaderboardEntry; 10] = [
    LeaderboardEntry { name: "Dr. James Wilson", level: 15, total_xp: 12500, streak: 28, rank: 1, is_current_user: false },
    LeaderboardEntry { name: "Dr. Emily Park", level: 14, total_xp: 10200, streak: 21, rank: 2, is_current_user: false },
    LeaderboardEntry { name: "Dr. Sarah Chen", level: 12, total_xp: 8750, streak: 14, rank: 3, is_current_user: true },
    LeaderboardEntry { name: "Dr. Michael Brown", level: 11, total_xp: 7800, streak: 12, rank: 4, is_current_user: false },
    LeaderboardEntry { name: "Dr. Lisa Thompson", level: 11, total_xp: 7500, streak: 9, rank: 5, is_current_user: false },
    LeaderboardEntry { name: "Dr. David Kim", level: 10, total_xp: 6900, streak: 7, rank: 6, is_current_user: false },
    LeaderboardEntry { name: "Dr. Anna Rodriguez", level: 10, total_xp: 6400, streak: 15, rank: 7, is_current_user: false },
    LeaderboardEntry { name: "Dr. Chris Lee", level: 9, total_xp: 5800, streak: 5, rank: 8, is_current_user: false },
    LeaderboardEntry { name: "Dr. Rachel Green", level: 8, total_xp: 4500, streak: 3, rank: 9, is_current_user: false },
    LeaderboardEntry { name: "Dr. Tom Martinez", level: 7, total_xp: 3200, streak: 2, rank: 10, is_current_user: false },
];

/// All selectable diagnoses, in display order.
pub fn diagnosis_options() -> &'static [DiagnosisOption] {
    &DIAGNOSIS_OPTIONS
}

/// Looks up a diagnosis option by its stable id.
pub fn diagnosis_by_id(id: &str) -> Option<&'static DiagnosisOption> {
    DIAGNOSIS_OPTIONS.iter().find(|o| o.id == id)
}

/// All badge definitions, earned or not.
pub fn all_badges() -> &'static [Badge] {
    &BADGES
}

/// Looks up a badge by id or display name (the backend has stored both).
pub fn badge_by_key(key: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|b| b.id == key || b.name == key)
}

/// Leaderboard rows sorted by rank.
pub fn leaderboard() -> &'static [LeaderboardEntry] {
    &LEADERBOARD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnosis_ids_are_unique() {
        let mut ids: Vec<_> = diagnosis_options().iter().map(|o| o.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), diagnosis_options().len());
    }

    #[test]
    fn badge_lookup_accepts_id_or_name() {
        assert_eq!(badge_by_key("streak-7").map(|b| b.name), Some("Week Warrior"));
        assert_eq!(badge_by_key("Week Warrior").map(|b| b.id), Some("streak-7"));
        assert!(badge_by_key("unknown").is_none());
    }

    #[test]
    fn leaderboard_is_rank_ordered() {
        let ranks: Vec<u32> = leaderboard().iter().map(|e| e.rank).collect();
        assert_eq!(ranks, (1..=10).collect::<Vec<_>>());
        assert_eq!(leaderboard().iter().filter(|e| e.is_current_user).count(), 1);
    }
}
