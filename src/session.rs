use std::time::Duration;

use serde::Serialize;

/// Parameters for one drill run. Immutable once the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrillConfig {
    pub par_time_secs: f64,
    pub delay_time_secs: f64,
    pub rep_count: u32,
}

impl DrillConfig {
    pub fn new(par_time_secs: f64, delay_time_secs: f64, rep_count: u32) -> Self {
        Self {
            par_time_secs: sanitize_secs(par_time_secs),
            delay_time_secs: sanitize_secs(delay_time_secs),
            rep_count,
        }
    }

    pub fn par(&self) -> Duration {
        secs_to_duration(self.par_time_secs)
    }

    pub fn delay(&self) -> Duration {
        secs_to_duration(self.delay_time_secs)
    }

    /// One delay phase followed by one active phase.
    pub fn cycle(&self) -> Duration {
        self.par().saturating_add(self.delay())
    }

    pub fn total(&self) -> Duration {
        self.cycle()
            .checked_mul(self.rep_count)
            .unwrap_or(Duration::MAX)
    }

    /// A run needs at least one rep and a cycle longer than zero.
    pub fn is_runnable(&self) -> bool {
        self.rep_count > 0 && !self.cycle().is_zero()
    }
}

// negative, NaN and infinite inputs all collapse to zero
fn sanitize_secs(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        secs
    } else {
        0.0
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(sanitize_secs(secs)).unwrap_or(Duration::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    #[strum(serialize = "IDLE")]
    Idle,
    #[strum(serialize = "RUNNING")]
    Running,
    #[strum(serialize = "PAUSED")]
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[strum(serialize = "DELAY")]
    Delay,
    #[strum(serialize = "ACTIVE")]
    Active,
}

/// Mutable state of the current run, kept in lockstep with the clock by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunState {
    pub timer_mode: TimerMode,
    /// 1-based while a run is live, 0 when idle
    pub current_rep: u32,
    pub phase: Phase,
    pub phase_start_elapsed: Duration,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            timer_mode: TimerMode::Idle,
            current_rep: 0,
            phase: Phase::Delay,
            phase_start_elapsed: Duration::ZERO,
        }
    }
}

impl RunState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
