//! Camera input: keyboard and virtual joystick merged into camera motion.
//!
//! # Invariants
//! - Exactly one [`InputMode`] drives per-frame motion; switching clears held keys.
//! - Input only ever adds to the camera's pending movement delta.
//! - Attach/detach are idempotent and symmetric: detach leaves zero listeners.

mod bindings;
mod control;
mod controller;
mod device;
mod state;

pub use bindings::{Direction, KeyBindings};
pub use control::CameraControl;
pub use controller::{CameraInput, InputConfig, InputError, ROTATION_SPEED};
pub use device::{DeviceKind, ScreenOrientation};
pub use state::{CameraInputState, InputMode};
