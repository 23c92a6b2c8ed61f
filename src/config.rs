use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::error::SettingsError;
use crate::runtime::{MAX_TICK, MIN_TICK};

/// How cues reach the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CueBackend {
    /// terminal bell
    Bell,
    /// sound files through the audio device (needs the `audio` feature)
    Sound,
    /// no cues
    Silent,
}

/// Application preferences. Drill parameters are deliberately not stored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub tick_ms: u64,
    pub cue: CueBackend,
    pub sound_dir: Option<PathBuf>,
    pub volume: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: MAX_TICK.as_millis() as u64,
            cue: CueBackend::Bell,
            sound_dir: None,
            volume: 80,
        }
    }
}

impl Settings {
    /// Tick interval held within the loop's supported range
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms).clamp(MIN_TICK, MAX_TICK)
    }

    pub fn sound_dir(&self) -> PathBuf {
        self.sound_dir
            .clone()
            .unwrap_or_else(AppDirs::sound_dir)
    }
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::settings_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Settings, SettingsError> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice::<Settings>(&bytes)?)
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    /// Missing or unreadable files fall back to defaults
    fn load(&self) -> Settings {
        match self.read() {
            Ok(settings) => settings,
            Err(SettingsError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Settings::default()
            }
            Err(err) => {
                tracing::warn!(path = ?self.path, error = %err, "ignoring settings file");
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileSettingsStore::with_path(&path);
        let settings = Settings::default();
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn save_and_load_custom_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = FileSettingsStore::with_path(&path);
        let settings = Settings {
            tick_ms: 5,
            cue: CueBackend::Silent,
            sound_dir: Some(dir.path().join("sounds")),
            volume: 40,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, b"{not json").unwrap();
        assert_eq!(FileSettingsStore::with_path(&path).load(), Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, br#"{"cue":"silent"}"#).unwrap();
        let loaded = FileSettingsStore::with_path(&path).load();
        assert_eq!(loaded.cue, CueBackend::Silent);
        assert_eq!(loaded.tick_ms, 10);
    }

    #[test]
    fn tick_interval_never_coarser_than_ten_ms() {
        let settings = Settings {
            tick_ms: 250,
            ..Settings::default()
        };
        assert_eq!(settings.tick_interval(), Duration::from_millis(10));
        let settings = Settings {
            tick_ms: 0,
            ..Settings::default()
        };
        assert_eq!(settings.tick_interval(), Duration::from_millis(1));
    }
}
