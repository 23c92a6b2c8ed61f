use std::sync::mpsc::{self, Receiver, Sender};

use serde::Serialize;

use crate::session::{Phase, TimerMode};

/// Read-only view of a run for renderers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrillSnapshot {
    pub timer_mode: TimerMode,
    pub current_rep: u32,
    pub rep_count: u32,
    pub phase: Phase,
    pub phase_elapsed_secs: f64,
    pub time_left_secs: f64,
    pub elapsed_secs: f64,
}

impl DrillSnapshot {
    pub fn is_idle(&self) -> bool {
        self.timer_mode == TimerMode::Idle
    }
}

/// Fan-out of snapshots to any number of receivers
#[derive(Debug, Default)]
pub struct Subscribers {
    senders: Vec<Sender<DrillSnapshot>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<DrillSnapshot> {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        rx
    }

    /// Send to every live receiver and forget the ones that hung up
    pub fn publish(&mut self, snapshot: DrillSnapshot) {
        self.senders.retain(|tx| tx.send(snapshot).is_ok());
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> DrillSnapshot {
        DrillSnapshot {
            timer_mode: TimerMode::Idle,
            current_rep: 0,
            rep_count: 3,
            phase: Phase::Delay,
            phase_elapsed_secs: 0.0,
            time_left_secs: 0.0,
            elapsed_secs: 0.0,
        }
    }

    #[test]
    fn publishes_to_all_subscribers() {
        let mut subs = Subscribers::new();
        let a = subs.subscribe();
        let b = subs.subscribe();
        subs.publish(idle());
        assert_eq!(a.try_recv().unwrap(), idle());
        assert_eq!(b.try_recv().unwrap(), idle());
    }

    #[test]
    fn prunes_dropped_receivers() {
        let mut subs = Subscribers::new();
        let keep = subs.subscribe();
        drop(subs.subscribe());
        assert_eq!(subs.len(), 2);
        subs.publish(idle());
        assert_eq!(subs.len(), 1);
        assert!(keep.try_recv().is_ok());
    }

    #[test]
    fn serializes_for_external_renderers() {
        let json = serde_json::to_value(idle()).unwrap();
        assert_eq!(json["timer_mode"], "idle");
        assert_eq!(json["phase"], "delay");
        assert_eq!(json["rep_count"], 3);
    }
}
