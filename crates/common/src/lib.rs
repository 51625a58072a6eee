//! Shared types for the earthview workspace.

mod types;

pub use types::{Color, ObjectId, Transform};
