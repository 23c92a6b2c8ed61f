use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::clock::{Clock, TimeSource};
use crate::cue::{CueDispatcher, CuePlayer};
use crate::runtime::Ticker;
use crate::schedule::{self, Position};
use crate::session::{DrillConfig, Phase, RunState, TimerMode};
use crate::snapshot::{DrillSnapshot, Subscribers};

/// Most boundaries dispatched by a single catch-up; older ones are skipped
/// so a stalled process does not ring a burst of stale cues.
pub const MAX_CATCH_UP_CUES: u64 = 8;

/// Idle/running/paused state machine for one drill.
///
/// Rep and phase are only ever derived from the clock through
/// [`schedule::schedule`], and cues only fire when that derived position
/// moves, so a boundary is announced exactly once however many ticks
/// observe it.
pub struct DrillTimer<T: TimeSource, P: CuePlayer> {
    config: DrillConfig,
    clock: Clock<T>,
    run: RunState,
    cues: CueDispatcher<P>,
    subscribers: Subscribers,
    skipped_cues: u64,
}

impl<T: TimeSource, P: CuePlayer> DrillTimer<T, P> {
    pub fn new(config: DrillConfig, source: T, player: P) -> Self {
        Self {
            config,
            clock: Clock::new(source),
            run: RunState::default(),
            cues: CueDispatcher::new(player),
            subscribers: Subscribers::new(),
            skipped_cues: 0,
        }
    }

    pub fn config(&self) -> &DrillConfig {
        &self.config
    }

    /// Replace the drill parameters. Only allowed while idle.
    pub fn set_config(&mut self, config: DrillConfig) -> bool {
        if self.run.timer_mode != TimerMode::Idle {
            return false;
        }
        self.config = config;
        self.publish();
        true
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    pub fn mode(&self) -> TimerMode {
        self.run.timer_mode
    }

    pub fn is_running(&self) -> bool {
        self.run.timer_mode == TimerMode::Running
    }

    pub fn elapsed(&self) -> Duration {
        match self.run.timer_mode {
            TimerMode::Idle => Duration::ZERO,
            _ => self.clock.elapsed(),
        }
    }

    pub fn cues(&self) -> &CueDispatcher<P> {
        &self.cues
    }

    /// Boundaries passed over without a cue because a catch-up was too long
    pub fn skipped_cues(&self) -> u64 {
        self.skipped_cues
    }

    pub fn subscribe(&mut self) -> Receiver<DrillSnapshot> {
        self.subscribers.subscribe()
    }

    /// Begin a run from idle. Resumes when paused, ignored when running or
    /// when the config has no reps or no length.
    pub fn start(&mut self) {
        match self.run.timer_mode {
            TimerMode::Running => return,
            TimerMode::Paused => {
                self.resume();
                return;
            }
            TimerMode::Idle => {}
        }

        if !self.config.is_runnable() {
            tracing::debug!(config = ?self.config, "start ignored, drill not runnable");
            return;
        }

        self.clock.start();
        self.skipped_cues = 0;
        self.run = RunState {
            timer_mode: TimerMode::Running,
            current_rep: 1,
            phase: Phase::Delay,
            phase_start_elapsed: Duration::ZERO,
        };
        tracing::info!(
            par = self.config.par_time_secs,
            delay = self.config.delay_time_secs,
            reps = self.config.rep_count,
            "drill started"
        );
        // a zero delay puts the run straight into its first active phase
        self.sync();
        self.publish();
    }

    pub fn pause(&mut self) {
        if self.run.timer_mode != TimerMode::Running {
            return;
        }

        // settle any boundary crossed since the last tick before freezing
        self.sync();
        if self.run.timer_mode != TimerMode::Running {
            return;
        }

        self.clock.pause();
        self.run.timer_mode = TimerMode::Paused;
        tracing::debug!(elapsed = ?self.clock.elapsed(), "drill paused");
        self.publish();
    }

    pub fn resume(&mut self) {
        if self.run.timer_mode != TimerMode::Paused {
            return;
        }

        self.clock.resume();
        self.run.timer_mode = TimerMode::Running;
        tracing::debug!(
            elapsed = ?self.clock.elapsed(),
            paused_total = ?self.clock.pause_offset_accumulated(),
            "drill resumed"
        );
        self.publish();
    }

    /// Unified start/pause/resume command
    pub fn toggle(&mut self) {
        match self.run.timer_mode {
            TimerMode::Idle => self.start(),
            TimerMode::Running => self.pause(),
            TimerMode::Paused => self.resume(),
        }
    }

    /// Back to idle from any state. Idempotent.
    pub fn stop(&mut self) {
        if self.run.timer_mode == TimerMode::Idle {
            return;
        }

        self.clock.stop();
        self.run.reset();
        tracing::info!("drill stopped");
        self.publish();
    }

    /// Advance the run to the clock. A no-op unless running.
    pub fn tick(&mut self) {
        if self.run.timer_mode != TimerMode::Running {
            return;
        }

        self.sync();
        if self.run.timer_mode == TimerMode::Running {
            self.publish();
        }
    }

    pub fn snapshot(&self) -> DrillSnapshot {
        let total = self.config.total();

        if self.run.timer_mode == TimerMode::Idle {
            return DrillSnapshot {
                timer_mode: TimerMode::Idle,
                current_rep: 0,
                rep_count: self.config.rep_count,
                phase: Phase::Delay,
                phase_elapsed_secs: 0.0,
                time_left_secs: total.as_secs_f64(),
                elapsed_secs: 0.0,
            };
        }

        let elapsed = self.clock.elapsed();
        DrillSnapshot {
            timer_mode: self.run.timer_mode,
            current_rep: self.run.current_rep,
            rep_count: self.config.rep_count,
            phase: self.run.phase,
            phase_elapsed_secs: elapsed
                .saturating_sub(self.run.phase_start_elapsed)
                .as_secs_f64(),
            time_left_secs: total.saturating_sub(elapsed).as_secs_f64(),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    /// Start and tick on `ticker` until the run goes idle, sleeping between
    /// ticks. Returns immediately if the run cannot start.
    pub fn run_to_completion<K: Ticker>(&mut self, ticker: &K) {
        self.start();
        while self.mode() != TimerMode::Idle {
            std::thread::sleep(ticker.interval());
            self.tick();
        }
    }

    fn sync(&mut self) {
        let elapsed = self.clock.elapsed();

        match schedule::schedule(elapsed, &self.config) {
            Position::Complete => {
                if let Some(last) = schedule::last_ordinal(&self.config) {
                    self.dispatch_through(last);
                }
                tracing::info!(elapsed = ?elapsed, "drill complete");
                self.stop();
            }
            Position::InRep(pos) => {
                if pos.ordinal() == self.current_ordinal() {
                    return;
                }
                self.dispatch_through(pos.ordinal());
                self.run.current_rep = pos.display_rep();
                self.run.phase = pos.phase;
                self.run.phase_start_elapsed = elapsed.saturating_sub(pos.phase_elapsed);
            }
        }
    }

    fn current_ordinal(&self) -> u64 {
        schedule::ordinal(self.run.current_rep.saturating_sub(1), self.run.phase)
    }

    /// Fire one cue for every phase entered after the recorded one, up to `target`.
    fn dispatch_through(&mut self, target: u64) {
        let current = self.current_ordinal();
        if target <= current {
            return;
        }

        let first = (current + 1).max(target.saturating_sub(MAX_CATCH_UP_CUES - 1));
        let skipped = first - (current + 1);
        if skipped > 0 {
            self.skipped_cues += skipped;
            tracing::warn!(skipped, "tick fell far behind, stale cues skipped");
        }

        for ordinal in first..=target {
            let (rep_index, phase) = schedule::from_ordinal(ordinal);
            tracing::debug!(rep = rep_index + 1, %phase, "phase entered");
            self.cues.on_phase_entered(phase, rep_index + 1);
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.subscribers.publish(snapshot);
    }
}
