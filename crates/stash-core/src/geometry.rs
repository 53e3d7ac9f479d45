//! Integer grid primitives: [`Vec2i`] points/sizes and axis-aligned [`Rect`]s.
//!
//! Coordinates are `(x, y)` with `x` growing rightwards and `y` growing
//! downwards; `(0, 0)` is the top-left cell of a grid.

use std::fmt;
use std::ops::Sub;

/// A 2D integer vector, used both as a grid cell position and as a size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vec2i {
    /// Column (or width).
    pub x: i32,
    /// Row (or height).
    pub y: i32,
}

impl Vec2i {
    /// The origin cell / the empty size.
    pub const ZERO: Vec2i = Vec2i { x: 0, y: 0 };

    /// A single cell.
    pub const ONE: Vec2i = Vec2i { x: 1, y: 1 };

    /// Construct from components.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Number of cells covered when interpreted as a size.
    ///
    /// Non-positive dimensions cover nothing.
    pub fn area(self) -> u64 {
        if self.x <= 0 || self.y <= 0 {
            0
        } else {
            self.x as u64 * self.y as u64
        }
    }

    /// `true` if both components are strictly positive.
    pub fn is_positive(self) -> bool {
        self.x > 0 && self.y > 0
    }
}

impl Sub for Vec2i {
    type Output = Vec2i;

    fn sub(self, rhs: Vec2i) -> Vec2i {
        Vec2i::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(i32, i32)> for Vec2i {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Vec2i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned integer rectangle covering the half-open cell range
/// `[origin.x, origin.x + size.x) × [origin.y, origin.y + size.y)`.
///
/// A rectangle with a non-positive dimension is empty: it contains no
/// cells and overlaps nothing.
///
/// # Examples
///
/// ```
/// use stash_core::{Rect, Vec2i};
///
/// let a = Rect::new(Vec2i::new(0, 0), Vec2i::new(2, 2));
/// let b = Rect::new(Vec2i::new(1, 1), Vec2i::new(2, 2));
/// let c = Rect::new(Vec2i::new(2, 0), Vec2i::new(1, 1));
///
/// assert!(a.overlaps(&b));
/// assert!(!a.overlaps(&c)); // edges touch, cells do not
/// assert!(a.contains_point(Vec2i::new(1, 1)));
/// assert!(!a.contains_point(Vec2i::new(2, 1)));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Top-left cell.
    pub origin: Vec2i,
    /// Width and height in cells.
    pub size: Vec2i,
}

impl Rect {
    /// Construct from an origin and a size.
    pub const fn new(origin: Vec2i, size: Vec2i) -> Self {
        Self { origin, size }
    }

    /// Construct from raw `x, y, width, height` components.
    pub const fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            origin: Vec2i::new(x, y),
            size: Vec2i::new(width, height),
        }
    }

    /// Inclusive top-left corner.
    pub fn min(&self) -> Vec2i {
        self.origin
    }

    /// Exclusive bottom-right corner, saturating at `i32::MAX`.
    pub fn max(&self) -> Vec2i {
        Vec2i::new(
            self.origin.x.saturating_add(self.size.x),
            self.origin.y.saturating_add(self.size.y),
        )
    }

    /// `true` if the rectangle covers no cells.
    pub fn is_empty(&self) -> bool {
        !self.size.is_positive()
    }

    /// `true` if the cell `p` lies inside the rectangle.
    pub fn contains_point(&self, p: Vec2i) -> bool {
        let max = self.max();
        p.x >= self.origin.x && p.y >= self.origin.y && p.x < max.x && p.y < max.y
    }

    /// `true` if every cell of `other` lies inside `self`.
    ///
    /// Empty rectangles are contained only if their origin is within the
    /// closed bounds of `self`; callers that place items reject empty sizes
    /// before asking.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        b_min.x >= a_min.x && b_min.y >= a_min.y && b_max.x <= a_max.x && b_max.y <= a_max.y
    }

    /// `true` if the two rectangles share at least one cell.
    pub fn overlaps(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x < b_max.x && b_min.x < a_max.x && a_min.y < b_max.y && b_min.y < a_max.y
    }

    /// Same size, moved to a new origin.
    pub fn at(&self, origin: Vec2i) -> Rect {
        Rect::new(origin, self.size)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let max = self.max();
        write!(
            f,
            "[{}, {}) x [{}, {})",
            self.origin.x, max.x, self.origin.y, max.y
        )
    }
}
