use std::time::Duration;

use crate::session::{DrillConfig, Phase};

/// Where a run is, given its elapsed time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    InRep(RepPosition),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepPosition {
    /// 0-based
    pub rep_index: u32,
    pub phase: Phase,
    pub phase_elapsed: Duration,
}

impl RepPosition {
    /// 1-based rep number shown to the user
    pub fn display_rep(&self) -> u32 {
        self.rep_index + 1
    }

    pub fn ordinal(&self) -> u64 {
        ordinal(self.rep_index, self.phase)
    }
}

/// Orders every phase entry of a run: rep 0 delay is 0, rep 0 active is 1,
/// rep 1 delay is 2, and so on up to `2 * reps - 1`.
pub fn ordinal(rep_index: u32, phase: Phase) -> u64 {
    let base = u64::from(rep_index) * 2;
    match phase {
        Phase::Delay => base,
        Phase::Active => base + 1,
    }
}

/// Inverse of [`ordinal`]
pub fn from_ordinal(ordinal: u64) -> (u32, Phase) {
    let rep_index = u32::try_from(ordinal / 2).unwrap_or(u32::MAX);
    let phase = if ordinal % 2 == 0 {
        Phase::Delay
    } else {
        Phase::Active
    };
    (rep_index, phase)
}

/// Ordinal of the last phase entry of a run, `None` if it has no reps.
pub fn last_ordinal(config: &DrillConfig) -> Option<u64> {
    (config.rep_count > 0).then(|| ordinal(config.rep_count - 1, Phase::Active))
}

/// Map elapsed time onto a rep and phase.
///
/// The delay phase covers `[0, delay)` of each cycle and the active phase
/// `[delay, cycle)`. Reaching `cycle * reps` reports completion, which is
/// also what a run with no reps or a zero-length cycle reports.
pub fn schedule(elapsed: Duration, config: &DrillConfig) -> Position {
    let delay = config.delay().as_nanos();
    let cycle = config.cycle().as_nanos();
    let total = cycle * u128::from(config.rep_count);
    let elapsed = elapsed.as_nanos();

    if elapsed >= total {
        return Position::Complete;
    }

    // total > 0 here, so cycle > 0
    let rep_index = elapsed / cycle;
    let offset = elapsed - rep_index * cycle;

    let (phase, phase_elapsed) = if offset < delay {
        (Phase::Delay, offset)
    } else {
        (Phase::Active, offset - delay)
    };

    Position::InRep(RepPosition {
        rep_index: u32::try_from(rep_index).unwrap_or(u32::MAX),
        phase,
        phase_elapsed: nanos_to_duration(phase_elapsed),
    })
}

fn nanos_to_duration(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % NANOS_PER_SEC) as u32)
}
