//! The visual-tree capabilities the drag engine consumes.
//!
//! The engine never owns the document. Hosts implement [`VisualTree`] over
//! their own element storage; [`MemoryDocument`] is an in-memory
//! implementation used by the demo and the tests.

pub mod memory;
pub mod selector;

use std::fmt;

use crate::geometry::{Edges, Point, Rect, Size};

pub use memory::MemoryDocument;

/// Opaque handle of an element inside a [`VisualTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Element queries and mutations needed to run a drag gesture.
///
/// Positions are document coordinates (independent of window scroll).
/// Implementations must tolerate calls on detached or unknown elements:
/// queries return neutral values and mutations are ignored.
pub trait VisualTree {
    /// Whether the element is currently part of the document.
    fn is_attached(&self, element: ElementId) -> bool;
    fn parent(&self, element: ElementId) -> Option<ElementId>;
    /// The element's `id`, used by `#id` constrain targets.
    fn element_id(&self, element: ElementId) -> Option<String>;

    fn position(&self, element: ElementId) -> Point;
    /// Moves the element by writing its inline `left`/`top`.
    fn set_position(&mut self, element: ElementId, position: Point);
    fn offset_size(&self, element: ElementId) -> Size;
    fn scroll_size(&self, element: ElementId) -> Size;
    fn border(&self, element: ElementId) -> Edges;
    fn element_scroll(&self, element: ElementId) -> Point;
    fn window_scroll(&self) -> Point;
    fn viewport_size(&self) -> Size;

    fn inline_style(&self, element: ElementId, property: &str) -> Option<String>;
    /// `None` removes the inline property.
    fn set_inline_style(&mut self, element: ElementId, property: &str, value: Option<&str>);

    fn has_class(&self, element: ElementId, class: &str) -> bool;
    fn add_class(&mut self, element: ElementId, class: &str);
    fn remove_class(&mut self, element: ElementId, class: &str);

    fn attr(&self, element: ElementId, name: &str) -> Option<String>;
    fn has_attr(&self, element: ElementId, name: &str) -> bool {
        self.attr(element, name).is_some()
    }
    fn set_attr(&mut self, element: ElementId, name: &str, value: &str);

    /// Deep structural clone. The clone starts detached.
    fn clone_element(&mut self, element: ElementId) -> ElementId;
    /// Moves `element` to directly after `reference` in the reference's parent.
    fn insert_after(&mut self, element: ElementId, reference: ElementId);
    fn append(&mut self, parent: ElementId, element: ElementId);
    /// Detaches the element from the document.
    fn remove(&mut self, element: ElementId);

    fn matches(&self, element: ElementId, selector: &str) -> bool;
    /// Descendants of `scope` (the whole document when `None`) matching the
    /// selector, in document order.
    fn query_all(&self, scope: Option<ElementId>, selector: &str) -> Vec<ElementId>;

    fn scroll_into_view(&mut self, element: ElementId);
    fn scroll_into_container(&mut self, element: ElementId, container: ElementId);

    /// Inclusive containment: an element contains itself.
    fn contains_node(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn bounding_box(&self, element: ElementId) -> Rect {
        Rect::from_parts(self.position(element), self.offset_size(element))
    }

    /// The visible box without borders.
    fn inner_box(&self, element: ElementId) -> Rect {
        self.bounding_box(element).inset(self.border(element))
    }

    fn inside_pos(&self, element: ElementId, point: Point) -> bool {
        self.bounding_box(element).contains(point)
    }
}
