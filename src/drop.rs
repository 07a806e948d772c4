//! Placement of dragged elements on release, and the settle of reverted ones.

use std::time::Instant;

use crate::constants::{
    ATTR_COPIED_NODE, ATTR_EFFECT_ALLOWED, CLASS_DRAGGING, CLASS_DROP_ACTIVE, CLASS_HIDDEN_SOURCE,
    CLASS_INVISIBLE, CLASS_MASTER, CLASS_NO_TRANSITION, CLASS_TRANSITION, DRAG_MARKERS,
    STYLE_LEFT, STYLE_POSITION, STYLE_TOP,
};
use crate::document::{ElementId, VisualTree};
use crate::dropzone::nearest_dropzone;
use crate::effect::EffectAllowed;
use crate::geometry::Point;
use crate::hover::HoverWatch;
use crate::session::DragSession;

/// A reverted element travelling back to its origin. Torn down on
/// transition-end or once the deadline passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settle {
    pub drag: ElementId,
    pub source: ElementId,
    pub proxied: bool,
    pub inline_left: Option<String>,
    pub inline_top: Option<String>,
    pub deadline: Instant,
    /// Suppressed watches of dropzones re-hovered by the resting element.
    pub watches: Vec<HoverWatch>,
}

impl Settle {
    pub fn finish<D: VisualTree + ?Sized>(self, doc: &mut D) {
        if self.proxied {
            doc.remove_class(self.source, CLASS_HIDDEN_SOURCE);
            doc.remove(self.drag);
        } else {
            strip_markers(doc, self.drag);
            doc.set_inline_style(self.drag, STYLE_LEFT, self.inline_left.as_deref());
            doc.set_inline_style(self.drag, STYLE_TOP, self.inline_top.as_deref());
        }
        for mut watch in self.watches {
            watch.cancel();
            doc.remove_class(watch.dropzone, CLASS_DROP_ACTIVE);
        }
        tracing::debug!(element = %self.drag, "settled");
    }
}

/// How one element was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The proxy stayed in the dropzone as a copy.
    Copied(ElementId),
    /// The source was relocated into the dropzone.
    Moved(ElementId),
    /// A previously copied element stayed in its own dropzone.
    Repositioned(ElementId),
    Reverted,
    /// The element was no longer part of the document.
    Skipped,
}

#[derive(Debug, Default)]
pub struct DropOutcome {
    pub placements: Vec<Placement>,
    pub settles: Vec<Settle>,
    /// Dropzones that contain the primary element's resting origin but not the
    /// final pointer; they get a synthetic hover-enter.
    pub rechecks: Vec<ElementId>,
}

#[derive(Debug, Clone)]
struct Item<'a> {
    source: ElementId,
    drag: ElementId,
    origin: Point,
    inline_left: &'a Option<String>,
    inline_top: &'a Option<String>,
    primary: bool,
}

fn items(session: &DragSession) -> Vec<Item<'_>> {
    let primary = Item {
        source: session.source,
        drag: session.drag_element,
        origin: session.origin,
        inline_left: &session.inline_left,
        inline_top: &session.inline_top,
        primary: true,
    };
    std::iter::once(primary)
        .chain(session.relatives.iter().map(|rel| Item {
            source: rel.source,
            drag: rel.drag,
            origin: rel.origin,
            inline_left: &rel.inline_left,
            inline_top: &rel.inline_top,
            primary: false,
        }))
        .collect()
}

/// Places every element of a session that declared dropzones.
pub fn resolve<D: VisualTree + ?Sized>(
    doc: &mut D,
    session: &DragSession,
    copy: bool,
    deadline: Instant,
) -> DropOutcome {
    let mut outcome = DropOutcome::default();
    for item in items(session) {
        if !item.primary && !doc.is_attached(item.source) {
            discard_proxy(doc, &item);
            outcome.placements.push(Placement::Skipped);
            continue;
        }
        let placement = match session.target_element() {
            Some(zone) if copy => place_copy(doc, &item, zone),
            Some(zone) => place_move(doc, &item, zone),
            None if doc.has_attr(item.source, ATTR_COPIED_NODE) => {
                match doc.parent(item.source).and_then(|p| nearest_dropzone(doc, p)) {
                    Some(zone) => reposition(doc, &item, zone),
                    None => revert(doc, &item, session, deadline, &mut outcome),
                }
            }
            None => revert(doc, &item, session, deadline, &mut outcome),
        };
        tracing::debug!(element = %item.source, ?placement, "placed");
        outcome.placements.push(placement);
    }
    clear_master(doc, session);
    outcome
}

/// Sends every element of the session back to its origin, including
/// un-proxied ones.
pub fn revert_all<D: VisualTree + ?Sized>(
    doc: &mut D,
    session: &DragSession,
    deadline: Instant,
) -> DropOutcome {
    let mut outcome = DropOutcome::default();
    for item in items(session) {
        if !item.primary && !doc.is_attached(item.source) {
            discard_proxy(doc, &item);
            outcome.placements.push(Placement::Skipped);
            continue;
        }
        let placement = revert(doc, &item, session, deadline, &mut outcome);
        outcome.placements.push(placement);
    }
    clear_master(doc, session);
    outcome
}

/// Ends a pure repositioning drag: elements keep their new position.
pub fn release_in_place<D: VisualTree + ?Sized>(doc: &mut D, session: &DragSession) {
    for item in items(session) {
        if doc.is_attached(item.drag) {
            strip_markers(doc, item.drag);
        }
    }
    clear_master(doc, session);
}

fn place_copy<D: VisualTree + ?Sized>(doc: &mut D, item: &Item<'_>, zone: ElementId) -> Placement {
    let size = doc.offset_size(item.drag);
    let requested = doc.position(item.drag);
    doc.append(zone, item.drag);
    strip_markers(doc, item.drag);
    let placed = doc.inner_box(zone).clamp(requested, size);
    doc.set_position(item.drag, placed);
    doc.set_attr(item.drag, ATTR_EFFECT_ALLOWED, EffectAllowed::Move.as_str());
    doc.set_attr(item.drag, ATTR_COPIED_NODE, "true");
    doc.remove_class(item.source, CLASS_HIDDEN_SOURCE);
    Placement::Copied(item.drag)
}

fn place_move<D: VisualTree + ?Sized>(doc: &mut D, item: &Item<'_>, zone: ElementId) -> Placement {
    let size = doc.offset_size(item.source);
    let requested = doc.position(item.drag);
    doc.set_inline_style(item.source, STYLE_POSITION, Some("absolute"));
    doc.append(zone, item.source);
    let placed = doc.inner_box(zone).clamp(requested, size);
    doc.set_position(item.source, placed);
    strip_markers(doc, item.source);
    discard_proxy(doc, item);
    Placement::Moved(item.source)
}

fn reposition<D: VisualTree + ?Sized>(doc: &mut D, item: &Item<'_>, zone: ElementId) -> Placement {
    let size = doc.offset_size(item.source);
    let placed = doc.inner_box(zone).clamp(doc.position(item.drag), size);
    doc.set_position(item.source, placed);
    strip_markers(doc, item.source);
    discard_proxy(doc, item);
    Placement::Repositioned(item.source)
}

fn revert<D: VisualTree + ?Sized>(
    doc: &mut D,
    item: &Item<'_>,
    session: &DragSession,
    deadline: Instant,
    outcome: &mut DropOutcome,
) -> Placement {
    doc.remove_class(item.drag, CLASS_NO_TRANSITION);
    doc.remove_class(item.drag, CLASS_DRAGGING);
    doc.add_class(item.drag, CLASS_TRANSITION);
    doc.set_position(item.drag, item.origin);

    let mut watches = Vec::new();
    if item.primary {
        for zone in &session.dropzones {
            let inner = doc.inner_box(zone.element);
            if doc.is_attached(zone.element)
                && inner.contains(item.origin)
                && !inner.contains(session.last_pointer)
            {
                outcome.rechecks.push(zone.element);
                watches.push(HoverWatch::suppressed(zone.element));
            }
        }
    }
    outcome.settles.push(Settle {
        drag: item.drag,
        source: item.source,
        proxied: item.drag != item.source,
        inline_left: item.inline_left.clone(),
        inline_top: item.inline_top.clone(),
        deadline,
        watches,
    });
    Placement::Reverted
}

fn discard_proxy<D: VisualTree + ?Sized>(doc: &mut D, item: &Item<'_>) {
    if item.drag != item.source {
        doc.remove_class(item.source, CLASS_HIDDEN_SOURCE);
        doc.remove(item.drag);
    }
}

fn clear_master<D: VisualTree + ?Sized>(doc: &mut D, session: &DragSession) {
    doc.remove_class(session.source, CLASS_MASTER);
    doc.remove_class(session.drag_element, CLASS_MASTER);
}

/// Removes the classes an element carries only while dragged.
pub fn strip_markers<D: VisualTree + ?Sized>(doc: &mut D, element: ElementId) {
    for class in DRAG_MARKERS {
        doc.remove_class(element, class);
    }
    doc.remove_class(element, CLASS_MASTER);
    doc.remove_class(element, CLASS_INVISIBLE);
    doc.remove_class(element, CLASS_HIDDEN_SOURCE);
}
