//! Document-space geometry: points, sizes, rectangles and saturating clamps.

use std::ops::{Add, Sub};

/// A position in document coordinates. Origins may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Border widths (or any per-side inset) of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Edges {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Edges {
    pub const fn uniform(width: i32) -> Self {
        Self {
            left: width,
            top: width,
            right: width,
            bottom: width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        if self.width <= 0 || self.height <= 0 {
            return false;
        }
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Shrinks the rectangle by `edges`; never produces a negative size.
    pub fn inset(&self, edges: Edges) -> Rect {
        Rect {
            x: self.x.saturating_add(edges.left),
            y: self.y.saturating_add(edges.top),
            width: self
                .width
                .saturating_sub(edges.left)
                .saturating_sub(edges.right)
                .max(0),
            height: self
                .height
                .saturating_sub(edges.top)
                .saturating_sub(edges.bottom)
                .max(0),
        }
    }

    /// Clamps the origin of an element of `size` so the element stays inside
    /// the rectangle. An element larger than the rectangle is pinned to the
    /// rectangle's origin on that axis.
    pub fn clamp(&self, requested: Point, size: Size) -> Point {
        let max_x = self.right().saturating_sub(size.width).max(self.x);
        let max_y = self.bottom().saturating_sub(size.height).max(self.y);
        Point::new(
            requested.x.clamp(self.x, max_x),
            requested.y.clamp(self.y, max_y),
        )
    }
}
