use serde::{Deserialize, Serialize};

use crate::state::InputMode;

/// Screens at or below this width are treated as tablets.
const TABLET_MAX_DEVICE_WIDTH: f32 = 1200.0;

/// Coarse device class used to pick a default input mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceKind {
    /// Classify from a user agent string and, when known, the device width.
    pub fn detect(user_agent: &str, device_width: Option<f32>) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("mobile") {
            Self::Mobile
        } else if ua.contains("tablet")
            || device_width.is_some_and(|w| w <= TABLET_MAX_DEVICE_WIDTH)
        {
            Self::Tablet
        } else {
            Self::Desktop
        }
    }

    pub fn is_touch(self) -> bool {
        !matches!(self, Self::Desktop)
    }

    /// Touch devices have no keyboard, so they start on the virtual stick.
    pub fn preferred_mode(self) -> InputMode {
        if self.is_touch() {
            InputMode::Joystick
        } else {
            InputMode::Keyboard
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenOrientation {
    Landscape,
    Portrait,
}

impl ScreenOrientation {
    /// Square screens count as portrait.
    pub fn from_size(width: f32, height: f32) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}
