//! Per-gesture state. A session lives from a qualifying press to its release
//! and is never reused.

use crate::constraint::Constraint;
use crate::document::ElementId;
use crate::dropzone::Dropzone;
use crate::effect::{EffectAllowed, EffectMode};
use crate::events::{DragEvent, Phase};
use crate::geometry::Point;
use crate::hover::HoverWatch;

/// An element dragged in lock-step with the primary one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relative {
    pub source: ElementId,
    pub drag: ElementId,
    pub origin: Point,
    /// Offset from the primary element's origin.
    pub shift: Point,
    pub inline_left: Option<String>,
    pub inline_top: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DragSession {
    pub source: ElementId,
    /// The source itself for pure repositioning, otherwise a proxy clone.
    pub drag_element: ElementId,
    pub origin: Point,
    pub inline_left: Option<String>,
    pub inline_top: Option<String>,
    pub pointer_origin: Point,
    pub last_pointer: Point,
    pub buttons: u8,
    pub constraint: Option<Constraint>,
    pub effect: EffectMode,
    pub effect_allowed: EffectAllowed,
    pub emitter: String,
    pub dropzone_specified: bool,
    pub relatives: Vec<Relative>,
    /// Dropzones present when the drag started, in document order.
    pub dropzones: Vec<Dropzone>,
    pub target: Option<Dropzone>,
    pub hover: Vec<HoverWatch>,
}

impl DragSession {
    pub fn proxied(&self) -> bool {
        self.drag_element != self.source
    }

    pub fn target_element(&self) -> Option<ElementId> {
        self.target.as_ref().map(|zone| zone.element)
    }

    /// Notification payload for this session.
    pub fn event(&self, phase: Phase, target: ElementId) -> DragEvent {
        let mut event = DragEvent::new(phase, target, self.source);
        event.emitter_name = Some(self.emitter.clone());
        event.drag_element = self.drag_element;
        event.relatives = self.relatives.iter().map(|r| r.source).collect();
        event.relative_drag_elements = self.relatives.iter().map(|r| r.drag).collect();
        event.drop_target = self.target_element();
        event.pointer = self.last_pointer;
        event.pointer_origin = self.pointer_origin;
        event.buttons = self.buttons;
        event.effect = self.effect;
        event
    }

    /// Settles every pending hover watch and detaches them all.
    pub fn close_watches(&mut self, inside: bool) -> Vec<HoverWatch> {
        for watch in &mut self.hover {
            watch.resolve(inside);
        }
        std::mem::take(&mut self.hover)
    }
}
