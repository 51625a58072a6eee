//! Scene model: an append-only graph of lights, helpers and meshes, plus the
//! camera and viewport that look at it.
//!
//! # Invariants
//! - Objects are only ever added; there is no removal operation.
//! - Insertion order is render order.
//! - A mesh always carries valid geometry and a material.

mod camera;
mod geometry;
mod graph;
mod viewport;

pub use camera::PerspectiveCamera;
pub use geometry::{LineVertex, MeshData, SphereGeometry, axes_lines, grid_lines};
pub use graph::{BasicMaterial, ObjectKind, SceneGraph, SceneObject};
pub use viewport::Viewport;

pub fn crate_info() -> &'static str {
    "earthview-scene v0.1.0"
}
