use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Finest tick the loop will run at
pub const MIN_TICK: Duration = Duration::from_millis(1);
/// Coarsest tick the loop will run at; anything slower visibly lags phase boundaries
pub const MAX_TICK: Duration = Duration::from_millis(10);

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum DrillEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait DrillEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<DrillEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                // key releases would double every command on terminals that report them
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    if tx.send(DrillEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(DrillEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(error = %err, "terminal event stream closed");
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DrillEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker, held within [`MIN_TICK`]..=[`MAX_TICK`]
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        let clamped = interval.clamp(MIN_TICK, MAX_TICK);
        if clamped != interval {
            tracing::warn!(requested = ?interval, using = ?clamped, "tick interval clamped");
        }
        Self { interval: clamped }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(MAX_TICK)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<DrillEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<DrillEvent>) -> Self {
        Self { rx }
    }
}

impl DrillEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks are due on a fixed deadline, so a stream of key events can delay
/// a tick by at most one event but never starve it.
pub struct Runner<E: DrillEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
}

impl<E: DrillEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    pub fn interval(&self) -> Duration {
        self.ticker.interval()
    }

    /// Blocks until the next tick is due and returns the next event, or Tick on the deadline
    pub fn step(&mut self) -> DrillEvent {
        let now = Instant::now();
        if now >= self.next_tick {
            return self.take_tick(now);
        }

        match self.event_source.recv_timeout(self.next_tick - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.take_tick(Instant::now()),
            Err(RecvTimeoutError::Disconnected) => {
                // nothing more will arrive; keep the tick cadence by sleeping
                let now = Instant::now();
                if now < self.next_tick {
                    std::thread::sleep(self.next_tick - now);
                }
                self.take_tick(Instant::now())
            }
        }
    }

    fn take_tick(&mut self, now: Instant) -> DrillEvent {
        self.next_tick += self.ticker.interval();
        // after a stall, skip the missed deadlines instead of bursting ticks
        if self.next_tick <= now {
            self.next_tick = now + self.ticker.interval();
        }
        DrillEvent::Tick
    }
}
