//! Player settings and preferences
//!
//! Persisted separately from the leaderboard.

use serde::{Deserialize, Serialize};

use crate::persistence::{Storage, StorageError};
pub use crate::sim::ControlScheme;

/// Longest player name kept for the leaderboard
pub const MAX_NAME_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Buttons or steering wheel
    pub control_scheme: ControlScheme,
    /// Name recorded on the leaderboard
    pub player_name: String,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,
    /// Flash the screen edge while in the warning state
    pub warning_flash: bool,

    // === Accessibility ===
    /// Reduced motion (no flashes, gentler intro)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            control_scheme: ControlScheme::Buttons,
            player_name: "Player".to_string(),
            show_fps: false,
            warning_flash: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "lane_dash_settings";

    /// Effective warning flash (respects reduced_motion)
    pub fn effective_warning_flash(&self) -> bool {
        self.warning_flash && !self.reduced_motion
    }

    /// Trim and cap a name; blank names fall back to the default
    pub fn set_player_name(&mut self, name: &str) {
        let trimmed: String = name.trim().chars().take(MAX_NAME_LEN).collect();
        self.player_name = if trimmed.is_empty() {
            Settings::default().player_name
        } else {
            trimmed
        };
    }

    /// Load settings; absent or corrupt storage gives defaults
    pub fn load(storage: &dyn Storage) -> Self {
        if let Some(json) = storage.load(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Corrupt settings ignored: {}", e),
            }
        }
        log::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        storage.store(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_reduced_motion_disables_flash() {
        let mut settings = Settings::default();
        assert!(settings.effective_warning_flash());
        settings.reduced_motion = true;
        assert!(!settings.effective_warning_flash());
    }

    #[test]
    fn test_player_name_sanitized() {
        let mut settings = Settings::default();
        settings.set_player_name("   ");
        assert_eq!(settings.player_name, "Player");
        settings.set_player_name("  a very long racer name indeed ");
        assert_eq!(settings.player_name.chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_save_and_load() {
        let mut storage = MemoryStorage::new();
        let mut settings = Settings::default();
        settings.control_scheme = ControlScheme::Wheel;
        settings.save(&mut storage).unwrap();
        assert_eq!(Settings::load(&storage), settings);

        storage.store("lane_dash_settings", "garbage").unwrap();
        assert_eq!(Settings::load(&storage), Settings::default());
    }
}
