//! Developer tooling: performance counter and scene inspector.
//!
//! # Invariants
//! - Tools only read the scene; the stats counter owns its own state.

mod inspector;
mod stats;

pub use inspector::{ObjectInfo, SceneInspector, SceneSummary};
pub use stats::{PerfStats, StatsSnapshot};

pub fn crate_info() -> &'static str {
    "earthview-tools v0.1.0"
}
