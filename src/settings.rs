use std::path::{Path, PathBuf};

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::components::history::{HistoryManager, DEFAULT_MAX_HISTORY, DEFAULT_MAX_MEMORY_BYTES};
use crate::components::tools::BucketOptions;
use crate::ops::fill::BlendPalette;
use crate::ops::skin_layout::SkinVariant;

const SETTINGS_FILE: &str = "skinfe_settings.json";

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("could not read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no settings directory is available on this system")]
    NoSettingsDir,
}

/// Editor preferences.  Missing fields in the JSON take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub variant: SkinVariant,
    pub max_undo_steps: usize,
    pub max_history_memory_mb: usize,
    /// Lightness jitter of the camo bucket, 0..1.
    pub camo_range: f32,
    /// Fixed blend colours as `[r, g, b, a]`; empty derives them from the fill colour.
    pub blend_palette: Vec<[u8; 4]>,
    pub blend_steps: u32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            variant: SkinVariant::Classic,
            max_undo_steps: DEFAULT_MAX_HISTORY,
            max_history_memory_mb: DEFAULT_MAX_MEMORY_BYTES / (1024 * 1024),
            camo_range: 0.1,
            blend_palette: Vec::new(),
            blend_steps: 5,
        }
    }
}

impl EditorSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/skinfe/skinfe_settings.json  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\SkinFE\skinfe_settings.json
    /// On macOS:   ~/Library/Application Support/SkinFE/skinfe_settings.json
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?
                .join("skinfe");
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("SkinFE").join(SETTINGS_FILE));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("SkinFE")
                    .join(SETTINGS_FILE),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe().ok().and_then(|p| p.parent().map(|d| d.join(SETTINGS_FILE)))
        }
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Settings from the standard location, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                crate::log_warn!("Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn save_default_location(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoSettingsDir)?;
        self.save(&path)?;
        Ok(path)
    }

    // ---- derived values -------------------------------------------------------

    pub fn history(&self) -> HistoryManager {
        HistoryManager::new(self.max_undo_steps)
            .with_memory_limit(Some(self.max_history_memory_mb.saturating_mul(1024 * 1024)))
    }

    pub fn blend_palette(&self) -> BlendPalette {
        BlendPalette::new(self.blend_palette.iter().map(|c| Rgba(*c)).collect(), self.blend_steps)
    }

    pub fn bucket_options(&self) -> BucketOptions {
        BucketOptions {
            camo_range: self.camo_range.clamp(0.0, 1.0),
            palette: self.blend_palette(),
            ..BucketOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: EditorSettings = serde_json::from_str(r#"{ "variant": "slim", "blend_steps": 3 }"#).unwrap();
        assert_eq!(settings.variant, SkinVariant::Slim);
        assert_eq!(settings.blend_steps, 3);
        assert_eq!(settings.max_undo_steps, 50);
        assert_eq!(settings.max_history_memory_mb, 100);
        assert!(settings.blend_palette.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join(format!("skinfe-settings-{}", uuid::Uuid::new_v4()));
        let path = dir.join("settings.json");
        let settings = EditorSettings {
            variant: SkinVariant::Slim,
            camo_range: 0.25,
            blend_palette: vec![[1, 2, 3, 255], [4, 5, 6, 255]],
            ..EditorSettings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(EditorSettings::load(&path).unwrap(), settings);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_json_is_reported() {
        let dir = std::env::temp_dir().join(format!("skinfe-settings-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(EditorSettings::load(&path), Err(SettingsError::Json(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn derived_values_follow_settings() {
        let settings = EditorSettings {
            blend_palette: vec![[9, 9, 9, 255]],
            ..EditorSettings::default()
        };
        assert_eq!(settings.blend_palette().colors, vec![Rgba([9, 9, 9, 255])]);
        assert_eq!(settings.bucket_options().camo_range, 0.1);
    }
}
