use std::cell::Cell;
use std::fmt;

use pinpoint_common::ScreenPosition;

/// An externally owned visual element whose 2D placement an anchor controls.
///
/// Methods take `&self`: the element is shared between the host that owns it
/// and the anchor's listeners.
pub trait OverlayTarget {
    /// Insert into the overlay surface with fixed (viewport) positioning.
    fn mount(&self);

    /// Remove from the overlay surface.
    fn unmount(&self);

    /// Offset rendering so the element's center, not its top-left corner,
    /// sits on the placed coordinate.
    fn set_centered(&self, centered: bool);

    /// Set the left/top pixel coordinate.
    fn place(&self, position: ScreenPosition);
}

/// Headless overlay element that records the style it would carry.
#[derive(Debug, Default)]
pub struct OverlayElement {
    label: String,
    mounted: Cell<bool>,
    centered: Cell<bool>,
    position: Cell<Option<ScreenPosition>>,
    placements: Cell<u64>,
}

impl OverlayElement {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub fn is_centered(&self) -> bool {
        self.centered.get()
    }

    /// Last placed coordinate, if any.
    pub fn position(&self) -> Option<ScreenPosition> {
        self.position.get()
    }

    /// Number of times a position was written.
    pub fn placements(&self) -> u64 {
        self.placements.get()
    }

    pub fn is_visible(&self) -> bool {
        self.is_mounted() && self.position().is_some_and(|p| !p.is_off_screen())
    }

    /// Inline style equivalent of the current state.
    pub fn style(&self) -> String {
        let mut style = String::from("position: fixed;");
        if let Some(p) = self.position() {
            style.push_str(&format!(" left: {}px; top: {}px;", p.x, p.y));
        }
        if self.is_centered() {
            style.push_str(" transform: translate(-50%, -50%);");
        }
        style
    }
}

impl OverlayTarget for OverlayElement {
    fn mount(&self) {
        self.mounted.set(true);
    }

    fn unmount(&self) {
        self.mounted.set(false);
    }

    fn set_centered(&self, centered: bool) {
        self.centered.set(centered);
    }

    fn place(&self, position: ScreenPosition) {
        self.position.set(Some(position));
        self.placements.set(self.placements.get() + 1);
    }
}

impl fmt::Display for OverlayElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position() {
            Some(p) if p.is_off_screen() => write!(f, "[{}] off-screen", self.label),
            Some(p) => write!(f, "[{}] ({:.1}, {:.1})", self.label, p.x, p.y),
            None => write!(f, "[{}] unplaced", self.label),
        }
    }
}
