use std::collections::{BTreeMap, BTreeSet};

use crate::constants::{STYLE_LEFT, STYLE_TOP};
use crate::document::selector::{Selector, SelectorSubject};
use crate::document::{ElementId, VisualTree};
use crate::error::DdError;
use crate::geometry::{Edges, Point, Rect, Size};

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    id: Option<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    layout: Point,
    size: Size,
    scroll_size: Option<Size>,
    border: Edges,
    scroll: Point,
    classes: BTreeSet<String>,
    attrs: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
}

impl Node {
    fn new(tag: &str, parent: Option<ElementId>, rect: Rect) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            id: None,
            parent,
            children: Vec::new(),
            layout: rect.origin(),
            size: rect.size(),
            scroll_size: None,
            border: Edges::default(),
            scroll: Point::default(),
            classes: BTreeSet::new(),
            attrs: BTreeMap::new(),
            styles: BTreeMap::new(),
        }
    }

    fn inline_px(&self, property: &str) -> Option<i32> {
        let raw = self.styles.get(property)?;
        raw.trim().trim_end_matches("px").trim().parse().ok()
    }
}

impl SelectorSubject for Node {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    fn attr(&self, name: &str) -> Option<&str> {
        match name {
            "id" => self.id.as_deref(),
            _ => self.attrs.get(name).map(String::as_str),
        }
    }
}

/// An in-memory [`VisualTree`].
///
/// Every element has a layout position in document coordinates. Inline
/// `left`/`top` (in `px`) override it, so clearing them returns the element
/// to its layout position.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: BTreeMap<ElementId, Node>,
    root: ElementId,
    next_id: u64,
    viewport: Size,
    window_scroll: Point,
}

impl MemoryDocument {
    pub fn new(viewport: Size) -> Self {
        let root = ElementId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            Node::new("body", None, Rect::from_parts(Point::default(), viewport)),
        );
        Self {
            nodes,
            root,
            next_id: 1,
            viewport,
            window_scroll: Point::default(),
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Appends a new element under `parent` with the given layout box.
    pub fn create(&mut self, parent: ElementId, tag: &str, rect: Rect) -> Result<ElementId, DdError> {
        if !self.nodes.contains_key(&parent) {
            return Err(DdError::UnknownElement(parent));
        }
        let id = self.allocate();
        self.nodes.insert(id, Node::new(tag, Some(parent), rect));
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(id);
        }
        Ok(id)
    }

    pub fn set_element_id(&mut self, element: ElementId, id: &str) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.id = Some(id.to_string());
        }
    }

    pub fn set_border(&mut self, element: ElementId, border: Edges) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.border = border;
        }
    }

    pub fn set_scroll_size(&mut self, element: ElementId, size: Size) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.scroll_size = Some(size);
        }
    }

    pub fn set_size(&mut self, element: ElementId, size: Size) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.size = size;
        }
    }

    pub fn scroll_element_to(&mut self, element: ElementId, offset: Point) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.scroll = offset;
        }
    }

    pub fn scroll_window_to(&mut self, offset: Point) {
        self.window_scroll = offset;
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        if let Some(root) = self.nodes.get_mut(&self.root) {
            root.size = viewport;
        }
    }

    pub fn tag(&self, element: ElementId) -> Option<&str> {
        self.nodes.get(&element).map(|node| node.tag.as_str())
    }

    pub fn children(&self, element: ElementId) -> &[ElementId] {
        self.nodes
            .get(&element)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn classes(&self, element: ElementId) -> Vec<String> {
        self.nodes
            .get(&element)
            .map(|node| node.classes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Attached elements in document (paint) order, root first.
    pub fn attached_elements(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.walk(self.root, &mut out);
        out
    }

    /// The last-painted attached element whose box contains `point`.
    pub fn element_at(&self, point: Point) -> Option<ElementId> {
        self.attached_elements()
            .into_iter()
            .rev()
            .find(|id| *id != self.root && self.inside_pos(*id, point))
    }

    fn walk(&self, element: ElementId, out: &mut Vec<ElementId>) {
        out.push(element);
        for child in self.children(element) {
            self.walk(*child, out);
        }
    }

    fn allocate(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn detach(&mut self, element: ElementId) {
        let Some(parent) = self.nodes.get_mut(&element).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|child| *child != element);
        }
    }

    fn deep_clone(&mut self, element: ElementId, parent: Option<ElementId>) -> Option<ElementId> {
        let mut node = self.nodes.get(&element)?.clone();
        let children = std::mem::take(&mut node.children);
        node.parent = parent;
        let id = self.allocate();
        self.nodes.insert(id, node);
        let cloned: Vec<ElementId> = children
            .into_iter()
            .filter_map(|child| self.deep_clone(child, Some(id)))
            .collect();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = cloned;
        }
        Some(id)
    }

    fn scroll_to_show(offset: i32, visible: i32, start: i32, extent: i32, view_start: i32) -> i32 {
        let relative = start - view_start;
        if relative < offset {
            relative
        } else if relative + extent > offset + visible {
            relative + extent - visible
        } else {
            offset
        }
    }
}

impl VisualTree for MemoryDocument {
    fn is_attached(&self, element: ElementId) -> bool {
        let mut current = Some(element);
        while let Some(id) = current {
            if id == self.root {
                return true;
            }
            current = self.nodes.get(&id).and_then(|node| node.parent);
        }
        false
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.get(&element).and_then(|node| node.parent)
    }

    fn element_id(&self, element: ElementId) -> Option<String> {
        self.nodes.get(&element).and_then(|node| node.id.clone())
    }

    fn position(&self, element: ElementId) -> Point {
        let Some(node) = self.nodes.get(&element) else {
            return Point::default();
        };
        Point::new(
            node.inline_px(STYLE_LEFT).unwrap_or(node.layout.x),
            node.inline_px(STYLE_TOP).unwrap_or(node.layout.y),
        )
    }

    fn set_position(&mut self, element: ElementId, position: Point) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.styles
                .insert(STYLE_LEFT.to_string(), format!("{}px", position.x));
            node.styles
                .insert(STYLE_TOP.to_string(), format!("{}px", position.y));
        }
    }

    fn offset_size(&self, element: ElementId) -> Size {
        self.nodes
            .get(&element)
            .map(|node| node.size)
            .unwrap_or_default()
    }

    fn scroll_size(&self, element: ElementId) -> Size {
        self.nodes
            .get(&element)
            .map(|node| {
                node.scroll_size.unwrap_or_else(|| {
                    Rect::from_parts(Point::default(), node.size)
                        .inset(node.border)
                        .size()
                })
            })
            .unwrap_or_default()
    }

    fn border(&self, element: ElementId) -> Edges {
        self.nodes
            .get(&element)
            .map(|node| node.border)
            .unwrap_or_default()
    }

    fn element_scroll(&self, element: ElementId) -> Point {
        self.nodes
            .get(&element)
            .map(|node| node.scroll)
            .unwrap_or_default()
    }

    fn window_scroll(&self) -> Point {
        self.window_scroll
    }

    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn inline_style(&self, element: ElementId, property: &str) -> Option<String> {
        self.nodes
            .get(&element)
            .and_then(|node| node.styles.get(property).cloned())
    }

    fn set_inline_style(&mut self, element: ElementId, property: &str, value: Option<&str>) {
        if let Some(node) = self.nodes.get_mut(&element) {
            match value {
                Some(value) => {
                    node.styles.insert(property.to_string(), value.to_string());
                }
                None => {
                    node.styles.remove(property);
                }
            }
        }
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.nodes
            .get(&element)
            .is_some_and(|node| node.classes.contains(class))
    }

    fn add_class(&mut self, element: ElementId, class: &str) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.classes.insert(class.to_string());
        }
    }

    fn remove_class(&mut self, element: ElementId, class: &str) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.classes.remove(class);
        }
    }

    fn attr(&self, element: ElementId, name: &str) -> Option<String> {
        self.nodes
            .get(&element)
            .and_then(|node| SelectorSubject::attr(node, name).map(str::to_string))
    }

    fn set_attr(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(&element) {
            if name == "id" {
                node.id = Some(value.to_string());
            } else {
                node.attrs.insert(name.to_string(), value.to_string());
            }
        }
    }

    fn clone_element(&mut self, element: ElementId) -> ElementId {
        self.deep_clone(element, None).unwrap_or(element)
    }

    fn insert_after(&mut self, element: ElementId, reference: ElementId) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        if element == reference || self.contains_node(element, parent) {
            return;
        }
        self.detach(element);
        if let Some(node) = self.nodes.get_mut(&parent) {
            let index = node
                .children
                .iter()
                .position(|child| *child == reference)
                .map_or(node.children.len(), |i| i + 1);
            node.children.insert(index, element);
        }
        if let Some(node) = self.nodes.get_mut(&element) {
            node.parent = Some(parent);
        }
    }

    fn append(&mut self, parent: ElementId, element: ElementId) {
        if !self.nodes.contains_key(&parent)
            || !self.nodes.contains_key(&element)
            || self.contains_node(element, parent)
        {
            return;
        }
        self.detach(element);
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(element);
        }
        if let Some(node) = self.nodes.get_mut(&element) {
            node.parent = Some(parent);
        }
    }

    fn remove(&mut self, element: ElementId) {
        if element != self.root {
            self.detach(element);
        }
    }

    fn matches(&self, element: ElementId, selector: &str) -> bool {
        let Some(node) = self.nodes.get(&element) else {
            return false;
        };
        Selector::parse(selector).is_some_and(|sel| sel.matches(node))
    }

    fn query_all(&self, scope: Option<ElementId>, selector: &str) -> Vec<ElementId> {
        let Some(sel) = Selector::parse(selector) else {
            return Vec::new();
        };
        let start = scope.unwrap_or(self.root);
        let mut all = Vec::new();
        self.walk(start, &mut all);
        all.into_iter()
            .filter(|id| *id != start || scope.is_none())
            .filter(|id| self.nodes.get(id).is_some_and(|node| sel.matches(node)))
            .collect()
    }

    fn scroll_into_view(&mut self, element: ElementId) {
        let bounds = self.bounding_box(element);
        let scroll = self.window_scroll;
        let x = Self::scroll_to_show(scroll.x, self.viewport.width, bounds.x, bounds.width, 0);
        let y = Self::scroll_to_show(scroll.y, self.viewport.height, bounds.y, bounds.height, 0);
        self.window_scroll = Point::new(x.max(0), y.max(0));
    }

    fn scroll_into_container(&mut self, element: ElementId, container: ElementId) {
        let bounds = self.bounding_box(element);
        let inner = self.inner_box(container);
        let content = self.scroll_size(container);
        let Some(node) = self.nodes.get(&container) else {
            return;
        };
        let scroll = node.scroll;
        let x = Self::scroll_to_show(scroll.x, inner.width, bounds.x, bounds.width, inner.x);
        let y = Self::scroll_to_show(scroll.y, inner.height, bounds.y, bounds.height, inner.y);
        let max = Point::new(
            (content.width - inner.width).max(0),
            (content.height - inner.height).max(0),
        );
        if let Some(node) = self.nodes.get_mut(&container) {
            node.scroll = Point::new(x.clamp(0, max.x), y.clamp(0, max.y));
        }
    }
}
