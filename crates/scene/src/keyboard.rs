use std::cell::Cell;

use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    Down,
    Up,
}

/// A key event as delivered to scene keyboard listeners.
///
/// Listeners that consume the key call [`KeyboardEvent::prevent_default`];
/// the host reads it back to decide whether the platform still sees the key.
#[derive(Debug)]
pub struct KeyboardEvent {
    pub code: KeyCode,
    pub kind: KeyEventKind,
    /// Meta / command modifier held.
    pub meta: bool,
    default_prevented: Cell<bool>,
}

impl KeyboardEvent {
    pub fn new(code: KeyCode, kind: KeyEventKind, meta: bool) -> Self {
        Self {
            code,
            kind,
            meta,
            default_prevented: Cell::new(false),
        }
    }

    pub fn down(code: KeyCode) -> Self {
        Self::new(code, KeyEventKind::Down, false)
    }

    pub fn up(code: KeyCode) -> Self {
        Self::new(code, KeyEventKind::Up, false)
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn is_down(&self) -> bool {
        self.kind == KeyEventKind::Down
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}
