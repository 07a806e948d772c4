//! Drop target discovery and hit-testing.

use crate::constants::{ATTR_DROPZONE, EMITTER_TOKEN};
use crate::document::{ElementId, VisualTree};
use crate::effect::{DropzoneAccept, EffectMode};
use crate::geometry::Point;

/// Parsed `dropzone` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DropzoneDescriptor {
    pub accept: DropzoneAccept,
    /// Only drags with this emitter name may hover the zone.
    pub emitter: Option<String>,
}

impl DropzoneDescriptor {
    pub fn parse(value: &str) -> Self {
        let emitter = value
            .split_whitespace()
            .find_map(|word| {
                let (key, name) = word.split_at_checked(EMITTER_TOKEN.len())?;
                key.eq_ignore_ascii_case(EMITTER_TOKEN).then(|| name.to_string())
            })
            .filter(|name| !name.is_empty());
        Self {
            accept: DropzoneAccept::parse(value),
            emitter,
        }
    }

    pub fn admits(&self, effect: EffectMode, emitter: &str) -> bool {
        self.accept.accepts(effect) && self.emitter.as_deref().is_none_or(|name| name == emitter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropzone {
    pub element: ElementId,
    pub descriptor: DropzoneDescriptor,
}

/// How a hover tick was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// A real pointer move.
    Pointer,
    /// Re-evaluation after the effect mode changed without pointer motion.
    Synthetic,
}

/// Every dropzone in the document, in document order.
pub fn collect_dropzones<D: VisualTree + ?Sized>(doc: &D) -> Vec<Dropzone> {
    doc.query_all(None, &format!("[{ATTR_DROPZONE}]"))
        .into_iter()
        .filter_map(|element| {
            let value = doc.attr(element, ATTR_DROPZONE)?;
            Some(Dropzone {
                element,
                descriptor: DropzoneDescriptor::parse(&value),
            })
        })
        .collect()
}

/// Nearest ancestor (inclusive) declaring a dropzone.
pub fn nearest_dropzone<D: VisualTree + ?Sized>(doc: &D, element: ElementId) -> Option<ElementId> {
    let mut current = Some(element);
    while let Some(node) = current {
        if doc.has_attr(node, ATTR_DROPZONE) {
            return Some(node);
        }
        current = doc.parent(node);
    }
    None
}

/// First dropzone that qualifies as the drop target for this pointer position.
pub fn find_target<'a, D: VisualTree + ?Sized>(
    doc: &D,
    zones: &'a [Dropzone],
    drag_element: ElementId,
    pointer: Point,
    effect: EffectMode,
    emitter: &str,
) -> Option<&'a Dropzone> {
    if effect == EffectMode::None {
        return None;
    }
    let drag_box = doc.bounding_box(drag_element);
    zones.iter().find(|zone| {
        zone.element != drag_element
            && doc.is_attached(zone.element)
            && doc.inner_box(zone.element).contains(pointer)
            && drag_box.contains(pointer)
            && zone.descriptor.admits(effect, emitter)
    })
}

/// Whether the current drop target still holds after a tick.
pub fn watch_holds<D: VisualTree + ?Sized>(
    doc: &D,
    zone: &Dropzone,
    kind: TickKind,
    pointer: Point,
    effect: EffectMode,
) -> bool {
    match kind {
        TickKind::Pointer => doc.inner_box(zone.element).contains(pointer),
        TickKind::Synthetic => zone.descriptor.accept.accepts(effect),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::geometry::{Edges, Rect, Size};

    #[test]
    fn descriptor_parsing() {
        assert_eq!(
            DropzoneDescriptor::parse("copy emitter-name=files"),
            DropzoneDescriptor {
                accept: DropzoneAccept::Copy,
                emitter: Some("files".into()),
            }
        );
        assert_eq!(DropzoneDescriptor::parse("true"), DropzoneDescriptor::default());
        assert_eq!(DropzoneDescriptor::parse("").accept, DropzoneAccept::All);
    }

    #[test]
    fn emitter_filter() {
        let zone = DropzoneDescriptor::parse("move emitter-name=files");
        assert!(zone.admits(EffectMode::Move, "files"));
        assert!(!zone.admits(EffectMode::Move, "UI"));
        assert!(!zone.admits(EffectMode::Copy, "files"));
        assert!(DropzoneDescriptor::parse("all").admits(EffectMode::Copy, "anything"));
    }

    #[test]
    fn hit_test_uses_inner_box_and_drag_box() {
        let mut doc = MemoryDocument::new(Size::new(800, 600));
        let zone = doc.create(doc.root(), "div", Rect::new(100, 100, 100, 100)).unwrap();
        doc.set_border(zone, Edges::uniform(5));
        doc.set_attr(zone, ATTR_DROPZONE, "move");
        let drag = doc.create(doc.root(), "div", Rect::new(98, 98, 20, 20)).unwrap();

        let zones = collect_dropzones(&doc);
        assert_eq!(zones.len(), 1);
        // on the border: outside the inner box
        assert!(find_target(&doc, &zones, drag, Point::new(102, 102), EffectMode::Move, "UI").is_none());
        let hit = find_target(&doc, &zones, drag, Point::new(110, 110), EffectMode::Move, "UI");
        assert_eq!(hit.map(|z| z.element), Some(zone));
        // pointer outside the drag element
        assert!(find_target(&doc, &zones, drag, Point::new(150, 150), EffectMode::Move, "UI").is_none());
        assert!(find_target(&doc, &zones, drag, Point::new(110, 110), EffectMode::None, "UI").is_none());
        assert!(find_target(&doc, &zones, drag, Point::new(110, 110), EffectMode::Copy, "UI").is_none());
    }

    #[test]
    fn watch_checks_depend_on_tick_kind() {
        let mut doc = MemoryDocument::new(Size::new(800, 600));
        let el = doc.create(doc.root(), "div", Rect::new(0, 0, 50, 50)).unwrap();
        let zone = Dropzone {
            element: el,
            descriptor: DropzoneDescriptor::parse("copy"),
        };
        assert!(watch_holds(&doc, &zone, TickKind::Pointer, Point::new(10, 10), EffectMode::Move));
        assert!(!watch_holds(&doc, &zone, TickKind::Pointer, Point::new(60, 10), EffectMode::Copy));
        assert!(!watch_holds(&doc, &zone, TickKind::Synthetic, Point::new(60, 10), EffectMode::Move));
        assert!(watch_holds(&doc, &zone, TickKind::Synthetic, Point::new(60, 10), EffectMode::Copy));
    }

    #[test]
    fn nearest_dropzone_is_inclusive() {
        let mut doc = MemoryDocument::new(Size::new(800, 600));
        let zone = doc.create(doc.root(), "div", Rect::new(0, 0, 50, 50)).unwrap();
        doc.set_attr(zone, ATTR_DROPZONE, "true");
        let child = doc.create(zone, "div", Rect::new(0, 0, 5, 5)).unwrap();
        assert_eq!(nearest_dropzone(&doc, child), Some(zone));
        assert_eq!(nearest_dropzone(&doc, zone), Some(zone));
        assert_eq!(nearest_dropzone(&doc, doc.root()), None);
    }
}
