//! Screen anchors: world-to-screen projection that pins overlay elements to 3D points.
//!
//! # Invariants
//! - Placement is a pure function of point, camera transform and viewport size.
//! - Points behind the camera, or that can no longer be resolved, are parked
//!   at [`ScreenPosition::OFF_SCREEN`] instead of keeping a stale position.
//! - Every listener an anchor registers is removed by `dispose` (or drop).

mod anchor;
mod projection;
mod target;

pub use anchor::{AnchorError, AnchorOptions, AnchorSource, ScreenAnchor, UpdateTrigger};
pub use pinpoint_common::ScreenPosition;
pub use projection::{is_behind_camera, project_to_screen, world_to_screen};
pub use target::{OverlayElement, OverlayTarget};
