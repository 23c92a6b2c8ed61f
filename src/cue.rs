use std::io::Write;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::CueError;
use crate::session::Phase;

/// Audible signal emitted at a phase boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "kebab-case")]
pub enum Cue {
    #[strum(serialize = "active-start")]
    ActiveStart,
    #[strum(serialize = "rep-end")]
    RepEnd,
}

/// Capability to play a cue now.
///
/// Implementations must return quickly; anything slow belongs on another thread.
pub trait CuePlayer: Send + 'static {
    fn play_cue(&mut self, cue: Cue) -> Result<(), CueError>;
}

impl CuePlayer for Box<dyn CuePlayer> {
    fn play_cue(&mut self, cue: Cue) -> Result<(), CueError> {
        (**self).play_cue(cue)
    }
}

/// Rings the terminal bell: once for active start, twice for rep end
pub struct BellPlayer<W: Write + Send + 'static> {
    out: W,
}

impl<W: Write + Send + 'static> BellPlayer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl BellPlayer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send + 'static> CuePlayer for BellPlayer<W> {
    fn play_cue(&mut self, cue: Cue) -> Result<(), CueError> {
        let bells: &[u8] = match cue {
            Cue::ActiveStart => b"\x07",
            Cue::RepEnd => b"\x07\x07",
        };
        self.out.write_all(bells)?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SilentPlayer;

impl CuePlayer for SilentPlayer {
    fn play_cue(&mut self, _cue: Cue) -> Result<(), CueError> {
        Ok(())
    }
}

/// Keeps every cue it is asked to play. Clones share the log.
#[derive(Clone, Debug, Default)]
pub struct RecordingPlayer {
    played: Arc<Mutex<Vec<Cue>>>,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<Cue> {
        self.played
            .lock()
            .map(|cues| cues.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.played().iter().filter(|c| **c == cue).count()
    }
}

impl CuePlayer for RecordingPlayer {
    fn play_cue(&mut self, cue: Cue) -> Result<(), CueError> {
        if let Ok(mut cues) = self.played.lock() {
            cues.push(cue);
        }
        Ok(())
    }
}

/// Plays `<sound_dir>/<cue>.wav` through the default output device.
///
/// Each cue decodes and plays on its own detached thread so the tick loop
/// never waits on the device.
#[cfg(feature = "audio")]
pub struct SoundPlayer {
    sound_dir: std::path::PathBuf,
    volume: u8,
}

#[cfg(feature = "audio")]
impl SoundPlayer {
    pub fn new(sound_dir: std::path::PathBuf, volume: u8) -> Self {
        Self {
            sound_dir,
            volume: volume.min(100),
        }
    }

    fn path_for(&self, cue: Cue) -> std::path::PathBuf {
        self.sound_dir.join(format!("{}.wav", cue))
    }
}

#[cfg(feature = "audio")]
impl CuePlayer for SoundPlayer {
    fn play_cue(&mut self, cue: Cue) -> Result<(), CueError> {
        let path = self.path_for(cue);
        if !path.exists() {
            return Err(CueError::MissingSound(path));
        }

        let volume = self.volume;
        std::thread::spawn(move || {
            use rodio::{Decoder, OutputStream, Sink};
            use std::fs::File;
            use std::io::BufReader;

            let Ok((_stream, stream_handle)) = OutputStream::try_default() else {
                tracing::warn!("no default audio output device");
                return;
            };
            let Ok(file) = File::open(&path) else { return };
            let Ok(source) = Decoder::new(BufReader::new(file)) else {
                tracing::warn!(path = ?path, "cue sound could not be decoded");
                return;
            };
            let Ok(sink) = Sink::try_new(&stream_handle) else {
                return;
            };

            sink.set_volume(volume as f32 / 100.0);
            sink.append(source);
            sink.sleep_until_end();
        });
        Ok(())
    }
}

/// Turns phase entries into cues and shields the caller from playback failures.
pub struct CueDispatcher<P: CuePlayer> {
    player: P,
    fired: u64,
    dropped: u64,
}

impl<P: CuePlayer> CueDispatcher<P> {
    pub fn new(player: P) -> Self {
        Self {
            player,
            fired: 0,
            dropped: 0,
        }
    }

    /// Cue for entering `phase` of the 1-based `rep`. The first delay of a run is silent.
    pub fn cue_for(phase: Phase, rep: u32) -> Option<Cue> {
        match phase {
            Phase::Active => Some(Cue::ActiveStart),
            Phase::Delay if rep > 1 => Some(Cue::RepEnd),
            Phase::Delay => None,
        }
    }

    /// Fire at most one cue for a phase entry and report which one.
    pub fn on_phase_entered(&mut self, phase: Phase, rep: u32) -> Option<Cue> {
        let cue = Self::cue_for(phase, rep)?;
        self.fired += 1;
        if let Err(err) = self.player.play_cue(cue) {
            self.dropped += 1;
            tracing::warn!(%cue, rep, error = %err, "cue dropped");
        } else {
            tracing::debug!(%cue, rep, "cue fired");
        }
        Some(cue)
    }

    /// Cues dispatched, including ones the player failed to play
    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn player(&self) -> &P {
        &self.player
    }
}
