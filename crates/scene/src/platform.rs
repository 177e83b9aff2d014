//! Translation of winit window events into scene notifications.

use pinpoint_common::Viewport;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{ModifiersState, PhysicalKey};

use crate::keyboard::{KeyEventKind, KeyboardEvent};
use crate::scene::Scene;

impl Scene {
    /// Deliver a physical key transition. Returns true when a listener consumed it.
    pub fn handle_keyboard(
        &self,
        key: PhysicalKey,
        state: ElementState,
        modifiers: ModifiersState,
    ) -> bool {
        let PhysicalKey::Code(code) = key else {
            return false;
        };
        let kind = if state.is_pressed() {
            KeyEventKind::Down
        } else {
            KeyEventKind::Up
        };
        self.dispatch_key(&KeyboardEvent::new(code, kind, modifiers.super_key()))
    }

    /// Route a winit window event. Returns true when a listener consumed it.
    pub fn handle_window_event(&self, event: &WindowEvent, modifiers: ModifiersState) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_keyboard(event.physical_key, event.state, modifiers)
            }
            WindowEvent::Focused(false) => {
                self.blur_canvas();
                self.window().blur();
                false
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                ..
            } => {
                self.window().pointer_up();
                false
            }
            WindowEvent::Resized(size) => {
                self.resize(Viewport::new(size.width as f32, size.height as f32));
                false
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinpoint_common::Handedness;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use winit::dpi::PhysicalSize;
    use winit::keyboard::{KeyCode, NativeKeyCode};

    fn scene() -> Scene {
        Scene::new(Handedness::Left, Viewport::new(800.0, 600.0))
    }

    #[test]
    fn physical_keys_become_keyboard_events() {
        let s = scene();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let out = Rc::clone(&seen);
        s.on_keyboard
            .subscribe(move |e| out.borrow_mut().push((e.code, e.kind, e.meta)));

        s.handle_keyboard(
            PhysicalKey::Code(KeyCode::KeyW),
            ElementState::Pressed,
            ModifiersState::empty(),
        );
        s.handle_keyboard(
            PhysicalKey::Code(KeyCode::KeyW),
            ElementState::Released,
            ModifiersState::SUPER,
        );
        assert_eq!(
            *seen.borrow(),
            vec![
                (KeyCode::KeyW, KeyEventKind::Down, false),
                (KeyCode::KeyW, KeyEventKind::Up, true),
            ]
        );
    }

    #[test]
    fn unidentified_keys_are_dropped() {
        let s = scene();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        s.on_keyboard.subscribe(move |_| h.set(h.get() + 1));
        let consumed = s.handle_keyboard(
            PhysicalKey::Unidentified(NativeKeyCode::Unidentified),
            ElementState::Pressed,
            ModifiersState::empty(),
        );
        assert!(!consumed);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn focus_loss_blurs_canvas_and_window() {
        let s = scene();
        let hits = Rc::new(Cell::new(0));
        let a = Rc::clone(&hits);
        let b = Rc::clone(&hits);
        s.on_canvas_blur.subscribe(move |_| a.set(a.get() + 1));
        s.window().on_blur.subscribe(move |_| b.set(b.get() + 1));
        s.handle_window_event(&WindowEvent::Focused(false), ModifiersState::empty());
        s.handle_window_event(&WindowEvent::Focused(true), ModifiersState::empty());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn resized_updates_viewport() {
        let s = scene();
        s.handle_window_event(
            &WindowEvent::Resized(PhysicalSize::new(1024, 768)),
            ModifiersState::empty(),
        );
        assert_eq!(s.viewport(), Viewport::new(1024.0, 768.0));
    }
}
