//! Movement constraints of a drag: the window viewport, an ancestor element,
//! or nothing at all.

use std::fmt;
use std::str::FromStr;

use crate::document::{ElementId, VisualTree};
use crate::error::DdError;
use crate::geometry::{Point, Rect, Size};

/// Parsed `xy-constrain` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstrainTarget {
    Window,
    /// `#id`: exact id match.
    Id(String),
    Selector(String),
}

impl FromStr for ConstrainTarget {
    type Err = DdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DdError::EmptyConstraint);
        }
        if s.eq_ignore_ascii_case("window") {
            return Ok(ConstrainTarget::Window);
        }
        if let Some(id) = s.strip_prefix('#')
            && !id.is_empty()
            && !id.contains(char::is_whitespace)
        {
            return Ok(ConstrainTarget::Id(id.to_string()));
        }
        Ok(ConstrainTarget::Selector(s.to_string()))
    }
}

impl fmt::Display for ConstrainTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstrainTarget::Window => f.write_str("window"),
            ConstrainTarget::Id(id) => write!(f, "#{id}"),
            ConstrainTarget::Selector(sel) => f.write_str(sel),
        }
    }
}

/// A constraint resolved at session start. The ancestor is fixed for the
/// session; scroll offsets are re-read every time the rectangle is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Viewport,
    Ancestor {
        element: ElementId,
        /// Border-adjusted position of the ancestor at session start.
        origin: Point,
        size: Size,
    },
}

impl Constraint {
    /// Resolves `target` for a drag of `source`. Returns `None` when the
    /// selector or id matches no ancestor, which leaves the drag unconstrained.
    pub fn resolve<D: VisualTree + ?Sized>(
        doc: &D,
        source: ElementId,
        target: &ConstrainTarget,
    ) -> Option<Self> {
        let matches = |node: ElementId| match target {
            ConstrainTarget::Window => false,
            ConstrainTarget::Id(id) => doc.element_id(node).as_deref() == Some(id.as_str()),
            ConstrainTarget::Selector(sel) => doc.matches(node, sel),
        };
        if *target == ConstrainTarget::Window {
            return Some(Constraint::Viewport);
        }
        let mut current = doc.parent(source);
        while let Some(node) = current {
            if matches(node) {
                let border = doc.border(node);
                let position = doc.position(node);
                return Some(Constraint::Ancestor {
                    element: node,
                    origin: Point::new(position.x + border.left, position.y + border.top),
                    size: doc.scroll_size(node),
                });
            }
            current = doc.parent(node);
        }
        None
    }

    /// The rectangle the element must stay within, for the current scroll state.
    pub fn rect<D: VisualTree + ?Sized>(&self, doc: &D) -> Rect {
        match self {
            Constraint::Viewport => Rect::from_parts(doc.window_scroll(), doc.viewport_size()),
            Constraint::Ancestor {
                element,
                origin,
                size,
            } => Rect::from_parts(*origin - doc.element_scroll(*element), *size),
        }
    }

    pub fn clamp<D: VisualTree + ?Sized>(&self, doc: &D, requested: Point, size: Size) -> Point {
        self.rect(doc).clamp(requested, size)
    }

    pub fn container(&self) -> Option<ElementId> {
        match self {
            Constraint::Viewport => None,
            Constraint::Ancestor { element, .. } => Some(*element),
        }
    }
}

/// Clamps through an optional constraint; unconstrained positions pass through.
pub fn constrain<D: VisualTree + ?Sized>(
    doc: &D,
    constraint: Option<&Constraint>,
    requested: Point,
    size: Size,
) -> Point {
    match constraint {
        Some(c) => c.clamp(doc, requested, size),
        None => requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::geometry::Edges;

    #[test]
    fn parse_targets() {
        assert_eq!("window".parse(), Ok(ConstrainTarget::Window));
        assert_eq!("#box".parse(), Ok(ConstrainTarget::Id("box".into())));
        assert_eq!(
            ".area".parse(),
            Ok(ConstrainTarget::Selector(".area".into()))
        );
        assert_eq!(
            "  ".parse::<ConstrainTarget>(),
            Err(DdError::EmptyConstraint)
        );
        assert_eq!(ConstrainTarget::Id("box".into()).to_string(), "#box");
    }

    #[test]
    fn ancestor_constraint_uses_borders_and_tracks_scroll() {
        let mut doc = MemoryDocument::new(Size::new(800, 600));
        let outer = doc
            .create(doc.root(), "div", Rect::new(50, 40, 204, 104))
            .unwrap();
        doc.set_element_id(outer, "frame");
        doc.set_border(outer, Edges::uniform(2));
        let item = doc.create(outer, "div", Rect::new(60, 50, 20, 10)).unwrap();

        let c = Constraint::resolve(&doc, item, &ConstrainTarget::Id("frame".into()))
            .expect("ancestor found");
        assert_eq!(c.rect(&doc), Rect::new(52, 42, 200, 100));
        assert_eq!(
            c.clamp(&doc, Point::new(1000, -1000), Size::new(20, 10)),
            Point::new(232, 42)
        );

        doc.scroll_element_to(outer, Point::new(0, 30));
        assert_eq!(c.rect(&doc), Rect::new(52, 12, 200, 100));
    }

    #[test]
    fn first_matching_ancestor_wins() {
        let mut doc = MemoryDocument::new(Size::new(800, 600));
        let outer = doc.create(doc.root(), "section", Rect::new(0, 0, 400, 400)).unwrap();
        let inner = doc.create(outer, "section", Rect::new(10, 10, 100, 100)).unwrap();
        let item = doc.create(inner, "div", Rect::new(20, 20, 5, 5)).unwrap();
        let c = Constraint::resolve(&doc, item, &ConstrainTarget::Selector("section".into()));
        assert_eq!(c.and_then(|c| c.container()), Some(inner));
    }

    #[test]
    fn unresolvable_target_degrades_to_unconstrained() {
        let mut doc = MemoryDocument::new(Size::new(800, 600));
        let item = doc.create(doc.root(), "div", Rect::new(0, 0, 5, 5)).unwrap();
        assert!(Constraint::resolve(&doc, item, &ConstrainTarget::Id("nope".into())).is_none());
        let p = constrain(&doc, None, Point::new(-40, 9000), Size::new(5, 5));
        assert_eq!(p, Point::new(-40, 9000));
    }

    #[test]
    fn viewport_rect_follows_window_scroll() {
        let mut doc = MemoryDocument::new(Size::new(300, 200));
        let item = doc.create(doc.root(), "div", Rect::new(0, 0, 5, 5)).unwrap();
        let c = Constraint::resolve(&doc, item, &ConstrainTarget::Window).unwrap();
        assert_eq!(c.rect(&doc), Rect::new(0, 0, 300, 200));
        doc.scroll_window_to(Point::new(10, 70));
        assert_eq!(c.rect(&doc), Rect::new(10, 70, 300, 200));
    }
}
