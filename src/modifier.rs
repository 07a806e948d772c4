//! Engine-wide copy modifier state.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};

/// Modifiers that request a copy instead of a move.
pub const COPY_MODIFIERS: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::META)
    .union(KeyModifiers::SUPER);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierTracker {
    pressed: bool,
}

impl ModifierTracker {
    pub fn pressed(&self) -> bool {
        self.pressed
    }

    /// Records the modifier set reported with an input event. Returns the new
    /// state when it changed.
    pub fn update(&mut self, modifiers: KeyModifiers) -> Option<bool> {
        self.set(modifiers.intersects(COPY_MODIFIERS))
    }

    /// Records a key transition. Terminals with the keyboard enhancement
    /// protocol report modifier keys themselves; their release clears the
    /// state even though the event still carries the modifier flag.
    pub fn key_event(&mut self, key: &KeyEvent) -> Option<bool> {
        if let KeyCode::Modifier(code) = key.code
            && is_copy_modifier(code)
        {
            return self.set(key.kind != KeyEventKind::Release);
        }
        self.update(key.modifiers)
    }

    fn set(&mut self, pressed: bool) -> Option<bool> {
        if self.pressed == pressed {
            return None;
        }
        self.pressed = pressed;
        Some(pressed)
    }
}

fn is_copy_modifier(code: ModifierKeyCode) -> bool {
    matches!(
        code,
        ModifierKeyCode::LeftControl
            | ModifierKeyCode::RightControl
            | ModifierKeyCode::LeftMeta
            | ModifierKeyCode::RightMeta
            | ModifierKeyCode::LeftSuper
            | ModifierKeyCode::RightSuper
    )
}
