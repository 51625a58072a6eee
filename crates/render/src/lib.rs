//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - Rendering an unchanged scene from an unchanged camera is idempotent.
//!
//! The GPU backend lives in `earthview-render-wgpu`. [`DebugTextRenderer`]
//! implements the same trait for headless runs and tests.

mod renderer;

pub use renderer::{DebugTextRenderer, RenderError, Renderer};

pub fn crate_info() -> &'static str {
    "earthview-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
