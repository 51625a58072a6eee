//! Pointer input mapped to orbit control actions.
//!
//! # Invariants
//! - Consumers see [`ControlInput`] values, never raw window events, so the
//!   controls can be driven by winit, by tests, or by a script alike.

pub mod action;

pub use action::{ControlInput, PointerButton, PointerTracker};

pub fn crate_info() -> &'static str {
    "earthview-input v0.1.0"
}
