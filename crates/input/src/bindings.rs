use glam::Vec3;
use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

/// Logical movement direction, independent of the physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Ascend,
    Descend,
}

impl Direction {
    /// Lookup order when a code is bound to more than one direction.
    pub const ALL: [Direction; 6] = [
        Direction::Left,
        Direction::Forward,
        Direction::Right,
        Direction::Backward,
        Direction::Ascend,
        Direction::Descend,
    ];

    /// Unit vector in camera-local space (x right, y up, z forward).
    pub fn local_axis(self) -> Vec3 {
        match self {
            Self::Forward => Vec3::Z,
            Self::Backward => Vec3::NEG_Z,
            Self::Left => Vec3::NEG_X,
            Self::Right => Vec3::X,
            Self::Ascend => Vec3::Y,
            Self::Descend => Vec3::NEG_Y,
        }
    }
}

/// Physical key codes for each direction. Several codes may share a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: Vec<KeyCode>,
    pub backward: Vec<KeyCode>,
    pub left: Vec<KeyCode>,
    pub right: Vec<KeyCode>,
    pub ascend: Vec<KeyCode>,
    pub descend: Vec<KeyCode>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: vec![KeyCode::ArrowUp, KeyCode::KeyW],
            backward: vec![KeyCode::ArrowDown, KeyCode::KeyS],
            left: vec![KeyCode::ArrowLeft, KeyCode::KeyA],
            right: vec![KeyCode::ArrowRight, KeyCode::KeyD],
            ascend: vec![KeyCode::PageUp],
            descend: vec![KeyCode::PageDown],
        }
    }
}

impl KeyBindings {
    pub fn codes(&self, direction: Direction) -> &[KeyCode] {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
            Direction::Left => &self.left,
            Direction::Right => &self.right,
            Direction::Ascend => &self.ascend,
            Direction::Descend => &self.descend,
        }
    }

    pub fn direction_of(&self, code: KeyCode) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| self.codes(*d).contains(&code))
    }

    pub fn is_tracked(&self, code: KeyCode) -> bool {
        self.direction_of(code).is_some()
    }
}
