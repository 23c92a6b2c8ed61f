use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of monotonic "now" readings
pub trait TimeSource: Send + 'static {
    fn now(&self) -> Instant;
}

/// Production time source backed by `Instant::now()`
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced time source for tests and headless drivers.
///
/// Clones share the same reading, so a test can keep one handle and
/// move another into the clock.
#[derive(Clone, Debug)]
pub struct ManualTimeSource {
    now: Arc<Mutex<Instant>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Elapsed-time origin for one run.
///
/// Time spent paused is cut out of `elapsed()` by shifting `start_epoch`
/// forward on resume, so any number of pause/resume cycles leaves the
/// reported elapsed time equal to running time only.
#[derive(Debug)]
pub struct Clock<T: TimeSource> {
    source: T,
    start_epoch: Option<Instant>,
    paused_at: Option<Instant>,
    pause_offset_accumulated: Duration,
}

impl<T: TimeSource> Clock<T> {
    pub fn new(source: T) -> Self {
        Self {
            source,
            start_epoch: None,
            paused_at: None,
            pause_offset_accumulated: Duration::ZERO,
        }
    }

    pub fn start(&mut self) {
        self.start_epoch = Some(self.source.now());
        self.paused_at = None;
        self.pause_offset_accumulated = Duration::ZERO;
    }

    /// Running time since `start()`; frozen while paused, zero before start.
    pub fn elapsed(&self) -> Duration {
        let Some(start) = self.start_epoch else {
            return Duration::ZERO;
        };
        let now = self.paused_at.unwrap_or_else(|| self.source.now());
        now.saturating_duration_since(start)
    }

    pub fn pause(&mut self) {
        if self.start_epoch.is_some() && self.paused_at.is_none() {
            self.paused_at = Some(self.source.now());
        }
    }

    pub fn resume(&mut self) {
        let (Some(start), Some(paused_at)) = (self.start_epoch, self.paused_at.take()) else {
            return;
        };
        let paused_for = self.source.now().saturating_duration_since(paused_at);
        self.start_epoch = Some(start + paused_for);
        self.pause_offset_accumulated += paused_for;
    }

    pub fn stop(&mut self) {
        self.start_epoch = None;
        self.paused_at = None;
        self.pause_offset_accumulated = Duration::ZERO;
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn pause_offset_accumulated(&self) -> Duration {
        self.pause_offset_accumulated
    }
}
