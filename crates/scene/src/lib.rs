//! Scene: the slice of a rendering engine that camera input and screen anchors consume.
//!
//! # Invariants
//! - Single-threaded; every shared object uses `Rc`/`Cell`/`RefCell`.
//! - Nothing in this crate draws. Matrices, viewport and frame timing only.
//! - Every notification source is an [`Observable`] with symmetric
//!   subscribe/unsubscribe, so listener counts can be audited.

mod camera;
mod entities;
mod keyboard;
mod platform;
mod scene;
mod signal;

pub use camera::{Camera, CameraKind, FlyCamera};
pub use entities::{EntityData, EntityTable};
pub use keyboard::{KeyEventKind, KeyboardEvent};
pub use scene::{FrameInfo, HostWindow, Scene};
pub use signal::{Observable, SubscriptionHandle};
