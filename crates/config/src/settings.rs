// Application settings
// Loaded from ~/.config/moa/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Keyboard modifier style preference (primarily for macOS users)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierStyle {
    /// Use platform-native modifier (Cmd on macOS, Ctrl on Windows/Linux)
    #[default]
    Platform,
    /// Always use Ctrl (for users who prefer Windows-style shortcuts on Mac)
    Ctrl,
}

/// Scoring weights for palette ranking.
///
/// Defaults reproduce the historical per-module policy; all of them are
/// tunable from settings.json.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RankingWeights {
    pub label_exact: u32,
    pub label_prefix: u32,
    pub label_contains: u32,
    pub description_contains: u32,
    pub keyword_contains: u32,
    pub keyword_exact: u32,
    /// Bonus per position for recently used commands
    pub recency_step: u32,
    /// How many recency positions earn a bonus
    pub recency_window: usize,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            label_exact: 100,
            label_prefix: 80,
            label_contains: 60,
            description_contains: 40,
            keyword_contains: 50,
            keyword_exact: 30,
            recency_step: 5,
            recency_window: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Palette
    #[serde(rename = "palette.recentLimit")]
    pub recent_limit: usize,

    #[serde(rename = "palette.recentBucketSize")]
    pub recent_bucket_size: usize,

    #[serde(rename = "palette.maxResults")]
    pub max_results: usize,

    // Navigation
    #[serde(rename = "navigation.historyLimit")]
    pub history_limit: usize,

    // Keyboard
    #[serde(rename = "keyboard.modifierStyle")]
    pub modifier_style: ModifierStyle,

    // Storage
    #[serde(rename = "storage.dir", skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,

    // Ranking
    #[serde(rename = "ranking", default)]
    pub ranking: RankingWeights,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recent_limit: 5,
            recent_bucket_size: 3,
            max_results: 50,
            history_limit: 100,
            modifier_style: ModifierStyle::default(),
            storage_dir: None,
            ranking: RankingWeights::default(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moa");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from an explicit path, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                        Self::default()
                    }
                }
            }
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Directory holding persisted palette and navigation state.
    ///
    /// `storage.dir` wins, then the platform data dir, then `./.moa-state`.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.storage_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join("moa").join("state"))
            .unwrap_or_else(|| PathBuf::from(".moa-state"))
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
