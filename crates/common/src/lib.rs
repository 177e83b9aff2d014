//! Shared value types used by the scene, input and anchor crates.
//!
//! # Invariants
//! - Everything here is plain `Copy` data; no crate-level state.
//! - Screen space is in pixels with the origin at the top-left corner.

mod types;

pub use types::{EntityId, Handedness, ScreenPosition, Transform, Viewport};
