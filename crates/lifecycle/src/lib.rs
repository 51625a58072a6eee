//! Viewer lifecycle: scene bootstrap, interaction helpers and the frame loop.
//!
//! All components share one [`SceneContext`] passed by `&mut`; nothing here
//! is global. Rendering always goes through the [`earthview_render::Renderer`]
//! seam, so every component runs headless under test.
//!
//! # Invariants
//! - At most one Earth sphere is ever added, and only after its texture loads.
//! - A failed texture load is logged once and never retried.
//! - Each tick with both loops started renders exactly twice.
//! - View changes move only the camera and render once each.

mod bootstrap;
mod config;
mod context;
mod controls;
mod frame_loop;
mod helpers;
#[cfg(test)]
mod test_support;
mod viewer;

pub use bootstrap::{Bootstrap, EARTH_NAME, complete_texture_load, initialize};
pub use config::{CameraConfig, ConfigError, HelperConfig, SceneConfig, ViewerConfig, WindowConfig};
pub use context::{LoadStatus, SceneContext};
pub use controls::OrbitControls;
pub use frame_loop::{CancellationToken, FrameLoop, LoopState, TickOutcome};
pub use helpers::{InteractionHelpers, attach_helpers};
pub use viewer::Viewer;

pub fn crate_info() -> &'static str {
    "earthview-lifecycle v0.1.0"
}
