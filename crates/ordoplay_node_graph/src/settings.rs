// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry settings, stored as RON.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE_NAME: &str = "graphs.ron";

/// Tunables for the graph identity registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Format version
    pub version: u32,
    /// How many identifiers to try before giving up on a registration
    pub max_registration_attempts: u32,
    /// Drop entries of destroyed graphs whenever a graph registers
    pub prune_on_register: bool,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            max_registration_attempts: 8,
            prune_on_register: true,
        }
    }
}

impl GraphSettings {
    /// Parse settings from a RON string
    pub fn from_ron_str(content: &str) -> std::io::Result<Self> {
        let settings: GraphSettings = ron::from_str(content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Settings version {} is newer than supported version {}",
                    settings.version, SETTINGS_FORMAT_VERSION
                ),
            ));
        }

        Ok(settings)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);

        let content = ron::ser::to_string_pretty(self, config).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(path, content)
    }

    /// Registration attempts, never less than one
    pub fn registration_attempts(&self) -> u32 {
        self.max_registration_attempts.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = GraphSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.max_registration_attempts, 8);
        assert!(settings.prune_on_register);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);

        let settings = GraphSettings {
            max_registration_attempts: 3,
            prune_on_register: false,
            ..GraphSettings::default()
        };
        settings.save(&path).unwrap();

        let loaded = GraphSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded = GraphSettings::from_ron_str("(max_registration_attempts: 2)").unwrap();
        assert_eq!(loaded.max_registration_attempts, 2);
        assert!(loaded.prune_on_register);
    }

    #[test]
    fn test_rejects_newer_version() {
        let err = GraphSettings::from_ron_str("(version: 99)").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let settings = GraphSettings {
            max_registration_attempts: 0,
            ..GraphSettings::default()
        };
        assert_eq!(settings.registration_attempts(), 1);
    }
}
