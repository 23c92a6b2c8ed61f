use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "dryfire";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn settings_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("settings.json"))
            .unwrap_or_else(|| PathBuf::from("dryfire_settings.json"))
    }

    /// Where log files go. `None` when no home directory can be found.
    pub fn log_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            Self::project().map(|pd| pd.data_local_dir().join("logs"))
        }
    }

    pub fn sound_dir() -> PathBuf {
        Self::project()
            .map(|pd| pd.data_dir().join("sounds"))
            .unwrap_or_else(|| PathBuf::from("sounds"))
    }
}
