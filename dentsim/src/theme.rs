//! Color theme system for dentsim.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every UI
//! surface. Two built-in themes are provided:
//!
//! - `dark`: ANSI 16 colors, works on any terminal including 256-color SSH
//!   sessions with no truecolor support.
//! - `catppuccin_mocha`: Catppuccin Mocha palette in RGB; requires truecolor.

use dentsim_core::types::BadgeRarity;
use ratatui::style::Color;
use tracing::warn;

/// All color values used across dentsim's UI surfaces.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Encounter log
    /// Lines spoken by the patient.
    pub patient_message: Color,
    /// Lines typed by the student.
    pub student_message: Color,
    /// Greeting and tool findings.
    pub system_message: Color,

    // Countdown
    pub timer_normal: Color,
    /// Used for the last minute.
    pub timer_warning: Color,

    // Verdicts and notifications
    pub success: Color,
    pub failure: Color,
    pub toast_info: Color,
    pub toast_error: Color,

    // Badge rarity
    pub rarity_common: Color,
    pub rarity_rare: Color,
    pub rarity_epic: Color,
    pub rarity_legendary: Color,

    // Lists
    /// Background of the selected row and the current user's leaderboard row.
    pub highlight_bg: Color,
    /// Gold/silver/bronze markers for the top three leaderboard rows.
    pub medal: Color,
    /// Secondary text: hints, timestamps, locked badges.
    pub muted: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    /// Mode indicator color when in NORMAL mode.
    pub status_mode_normal: Color,
    /// Mode indicator color when in INSERT mode.
    pub status_mode_insert: Color,

    /// Application background (used for clearing areas).
    pub background: Color,
}

impl Theme {
    /// Built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            patient_message: Color::White,
            student_message: Color::Cyan,
            system_message: Color::Yellow,

            timer_normal: Color::Green,
            timer_warning: Color::Red,

            success: Color::Green,
            failure: Color::Red,
            toast_info: Color::Blue,
            toast_error: Color::Red,

            rarity_common: Color::Gray,
            rarity_rare: Color::Blue,
            rarity_epic: Color::Magenta,
            rarity_legendary: Color::Yellow,

            highlight_bg: Color::DarkGray,
            medal: Color::Yellow,
            muted: Color::DarkGray,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,

            background: Color::Reset,
        }
    }

    /// Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161);    // #a6e3a1
        let red = Color::Rgb(243, 139, 168);      // #f38ba8
        let yellow = Color::Rgb(249, 226, 175);   // #f9e2af
        let blue = Color::Rgb(137, 180, 250);     // #89b4fa
        let teal = Color::Rgb(148, 226, 213);     // #94e2d5
        let mauve = Color::Rgb(203, 166, 247);    // #cba6f7
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90);    // #45475a
        let base = Color::Rgb(30, 30, 46);        // #1e1e2e
        let text = Color::Rgb(205, 214, 244);     // #cdd6f4
        let peach = Color::Rgb(250, 179, 135);    // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            patient_message: text,
            student_message: teal,
            system_message: peach,

            timer_normal: green,
            timer_warning: red,

            success: green,
            failure: red,
            toast_info: blue,
            toast_error: red,

            rarity_common: overlay1,
            rarity_rare: blue,
            rarity_epic: mauve,
            rarity_legendary: yellow,

            highlight_bg: surface1,
            medal: yellow,
            muted: overlay1,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,

            background: base,
        }
    }

    /// Resolves a theme name from config. Unknown names fall back to `dark()`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }

    pub fn rarity(&self, rarity: BadgeRarity) -> Color {
        match rarity {
            BadgeRarity::Common => self.rarity_common,
            BadgeRarity::Rare => self.rarity_rare,
            BadgeRarity::Epic => self.rarity_epic,
            BadgeRarity::Legendary => self.rarity_legendary,
        }
    }
}
