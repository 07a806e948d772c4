use crossterm::event::{Event, KeyCode, KeyEventKind};

/// Filters raw key events before they reach the drag engine.
///
/// Repeats are dropped. Releases are dropped too, except for bare modifier
/// keys: the engine needs those to notice the copy modifier going up.
/// Windows reports a press for every repeat of Escape, so consecutive
/// Escape presses collapse into one.
#[derive(Debug, Default)]
pub struct KeyboardNormalizer {
    esc_down: bool,
}

impl KeyboardNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, evt: Event) -> Option<Event> {
        let Event::Key(key) = evt else {
            return Some(evt);
        };
        match key.kind {
            KeyEventKind::Repeat => return None,
            KeyEventKind::Release => {
                if key.code == KeyCode::Esc {
                    self.esc_down = false;
                }
                return matches!(key.code, KeyCode::Modifier(_)).then_some(evt);
            }
            KeyEventKind::Press => {}
        }
        if key.code == KeyCode::Esc {
            if cfg!(windows) && self.esc_down {
                return None;
            }
            self.esc_down = true;
        } else {
            self.esc_down = false;
        }
        Some(evt)
    }
}
