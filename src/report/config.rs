//! League table styling loaded from chart_config.json.
//!
//! If the config file doesn't exist, default values are used.
//! The file is read fresh on every export, so edits take effect without
//! restarting.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Font sizes
    pub font: FontConfig,
    /// Colors (RGB values)
    pub colors: ColorConfig,
    /// Layout dimensions
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub title_size: u32,
    pub header_size: u32,
    pub cell_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Header row background [R, G, B]
    pub header_bg: [u8; 3],
    /// Header row text [R, G, B]
    pub header_text: [u8; 3],
    /// Cell border [R, G, B]
    pub grid_color: [u8; 3],
    /// Background of rows whose team matches neither configured team
    pub neutral_row: [u8; 3],
    /// How strongly team colors tint player rows (0.0 - 1.0)
    pub team_tint: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub margin: u32,
    pub title_height: u32,
    pub row_height: u32,
    pub rank_col_width: u32,
    pub name_col_width: u32,
    pub team_col_width: u32,
    pub race_col_width: u32,
    pub gp_col_width: u32,
    pub total_col_width: u32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            title_size: 32,
            header_size: 18,
            cell_size: 16,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            header_bg: [44, 62, 80],     // #2C3E50
            header_text: [255, 255, 255],
            grid_color: [200, 200, 200],
            neutral_row: [245, 245, 245],
            team_tint: 0.25,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 20,
            title_height: 60,
            row_height: 34,
            rank_col_width: 60,
            name_col_width: 180,
            team_col_width: 170,
            race_col_width: 52,
            gp_col_width: 60,
            total_col_width: 70,
        }
    }
}

impl ChartConfig {
    /// Load config from file, or return defaults if file doesn't exist.
    pub fn load(config_path: &Path) -> Self {
        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => {
                        crate::log(&format!("Loaded chart config from {}", config_path.display()));
                        return config;
                    }
                    Err(e) => {
                        crate::log(&format!(
                            "Failed to parse chart config: {}. Using defaults.",
                            e
                        ));
                    }
                },
                Err(e) => {
                    crate::log(&format!(
                        "Failed to read chart config: {}. Using defaults.",
                        e
                    ));
                }
            }
        }
        Self::default()
    }

    /// Save default config to file (for reference).
    pub fn save_default(config_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&Self::default())
            .context("Failed to serialize chart config")?;
        fs::write(config_path, json)
            .with_context(|| format!("Failed to write {}", config_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = ChartConfig::load(&dir.path().join("chart_config.json"));
        assert_eq!(config.font.title_size, 32);
        assert_eq!(config.layout.race_col_width, 52);
    }

    #[test]
    fn test_saved_defaults_load_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chart_config.json");
        ChartConfig::save_default(&path).unwrap();

        let config = ChartConfig::load(&path);
        assert_eq!(config.colors.header_bg, [44, 62, 80]);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chart_config.json");
        std::fs::write(&path, r#"{"font": {"cell_size": 20}}"#).unwrap();

        let config = ChartConfig::load(&path);
        assert_eq!(config.font.cell_size, 20);
        assert_eq!(config.font.header_size, 18);
        assert_eq!(config.layout.row_height, 34);
    }
}
