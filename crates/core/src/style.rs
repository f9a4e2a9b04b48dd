use serde::{Deserialize, Serialize};

/// Status severity attached to a sub-category badge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Neutral,
    Info,
    Success,
    Warning,
    Critical,
}

/// Closed set of style tokens a front-end maps to its own colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleToken {
    BadgeNeutral,
    BadgeInfo,
    BadgeSuccess,
    BadgeWarning,
    BadgeCritical,
}

impl Severity {
    /// Fixed severity → token table.
    pub fn token(&self) -> StyleToken {
        match self {
            Self::Neutral => StyleToken::BadgeNeutral,
            Self::Info => StyleToken::BadgeInfo,
            Self::Success => StyleToken::BadgeSuccess,
            Self::Warning => StyleToken::BadgeWarning,
            Self::Critical => StyleToken::BadgeCritical,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// Color scheme of the dashboard chrome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Label of the command that switches away from this theme.
    pub fn switch_label(&self) -> &'static str {
        match self {
            Self::Light => "Passer au thème sombre",
            Self::Dark => "Passer au thème clair",
        }
    }
}
