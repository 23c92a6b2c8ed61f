// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod controller;
pub mod cue;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod schedule;
pub mod session;
pub mod snapshot;
pub mod util;

pub use controller::DrillTimer;
pub use session::{DrillConfig, Phase, TimerMode};
pub use snapshot::DrillSnapshot;
