//! wgpu render backend for earthview.
//!
//! Draws helper line lists (axes, grid) and unlit textured meshes into a
//! caller-supplied texture view. Surface handling and presentation stay with
//! the application.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - Every draw clears to the viewport's clear color first.

mod buffers;
mod gpu;
mod shaders;

pub use gpu::WgpuRenderer;
