use std::path::PathBuf;

use thiserror::Error;

/// Failure to play a cue. Never reaches the timer state machine.
#[derive(Error, Debug)]
pub enum CueError {
    #[error("cue output failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("no sound file for cue at {0}")]
    MissingSound(PathBuf),

    #[error("audio device unavailable: {0}")]
    Device(String),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("settings file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}
