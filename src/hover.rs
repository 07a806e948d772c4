//! One-shot hover watches. A watch is created when a dropzone becomes the
//! drop target and resolves exactly once to whether the gesture ended inside.

use crate::document::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverState {
    Pending,
    Resolved(bool),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverWatch {
    pub dropzone: ElementId,
    pub state: HoverState,
    /// Resolving `false` does not notify hover-exit.
    pub suppress_out: bool,
}

impl HoverWatch {
    pub fn new(dropzone: ElementId) -> Self {
        Self {
            dropzone,
            state: HoverState::Pending,
            suppress_out: false,
        }
    }

    pub fn suppressed(dropzone: ElementId) -> Self {
        Self {
            suppress_out: true,
            ..Self::new(dropzone)
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == HoverState::Pending
    }

    /// Settles a pending watch. Returns `false` when it was already settled.
    pub fn resolve(&mut self, inside: bool) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.state = HoverState::Resolved(inside);
        true
    }

    pub fn cancel(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.state = HoverState::Cancelled;
        true
    }

    /// Whether the watch resolved to "left the dropzone" and should notify.
    pub fn notifies_out(&self) -> bool {
        self.state == HoverState::Resolved(false) && !self.suppress_out
    }
}
