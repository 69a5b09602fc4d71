use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Who authored an entry in the encounter log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Patient,
    Student,
    System,
}

/// One entry in the encounter message log.
///
/// Messages are immutable once appended; the log exposes them only by shared
/// reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,           // UUID v4 text
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// An entry of the static diagnosis catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisOption {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
}

/// Verdict returned by the backend for a submitted diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisResult {
    pub correct: bool,
    pub xp_earned: i64,
    pub feedback: String,
    /// Disclosed by the backend when the submission was wrong.
    pub correct_diagnosis_name: Option<String>,
}

/// Display-only snapshot of the signed-in user. The server owns the truth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub xp: i64,
    #[serde(default)]
    pub streak: i64,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub cases_completed: i64,
    #[serde(default)]
    pub earned_badges: Vec<String>,
    #[serde(default)]
    pub last_active_date: Option<NaiveDate>,
    #[serde(default)]
    pub rank: Option<i64>,
}

/// Badge rarity tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl BadgeRarity {
    pub fn label(self) -> &'static str {
        match self {
            BadgeRarity::Common => "common",
            BadgeRarity::Rare => "rare",
            BadgeRarity::Epic => "epic",
            BadgeRarity::Legendary => "legendary",
        }
    }
}

/// Static badge definition. Whether a user holds it comes from the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: BadgeRarity,
    pub requirement: &'static str,
    pub xp_reward: u32,
}

/// One row of the leaderboard table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: &'static str,
    pub level: u32,
    pub total_xp: u32,
    pub streak: u32,
    pub rank: u32,
    pub is_current_user: bool,
}

/// Bedside tests that insert canned findings into the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClinicalTool {
    Examine,
    Percussion,
    Thermal,
    Xray,
}

impl ClinicalTool {
    pub const ALL: [ClinicalTool; 4] = [
        ClinicalTool::Examine,
        ClinicalTool::Percussion,
        ClinicalTool::Thermal,
        ClinicalTool::Xray,
    ];

    /// Stable identifier used in logs.
    pub fn id(self) -> &'static str {
        match self {
            ClinicalTool::Examine => "examine",
            ClinicalTool::Percussion => "percussion",
            ClinicalTool::Thermal => "thermal",
            ClinicalTool::Xray => "xray",
        }
    }

    /// Short button label shown in the tool strip.
    pub fn label(self) -> &'static str {
        match self {
            ClinicalTool::Examine => "Examine",
            ClinicalTool::Percussion => "Tap",
            ClinicalTool::Thermal => "Cold",
            ClinicalTool::Xray => "X-Ray",
        }
    }

    /// Finding appended to the log as a system message.
    pub fn finding(self) -> &'static str {
        match self {
            ClinicalTool::Examine => {
                "[Visual Exam] Slight swelling in lower right quadrant. Gingiva appears inflamed."
            }
            ClinicalTool::Percussion => "[Percussion Test] Positive response on tooth #30.",
            ClinicalTool::Thermal => "[Thermal Test] Cold test: Lingering pain >30s.",
            ClinicalTool::Xray => "[X-ray] Periapical radiolucency visible at apex of #30.",
        }
    }
}

/// Roles offered at signup and in settings.
pub const ROLES: [&str; 5] = [
    "Dental Student",
    "Resident",
    "General Dentist",
    "Specialist",
    "Professor",
];
