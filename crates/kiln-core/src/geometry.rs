use std::ops::Add;

/// An axis-aligned rectangle given by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

/// Rectangle in normalized or world units.
pub type FloatRect = Rect<f32>;

/// Rectangle in whole pixels.
pub type IntRect = Rect<i32>;

impl<T> Rect<T> {
    pub const fn new(x: T, y: T, width: T, height: T) -> Self {
        Rect { x, y, width, height }
    }
}

impl<T: Copy + Add<Output = T>> Rect<T> {
    /// Coordinate one past the right edge.
    pub fn right(&self) -> T {
        self.x + self.width
    }

    /// Coordinate one past the bottom edge.
    pub fn bottom(&self) -> T {
        self.y + self.height
    }
}

impl<T: Copy + Add<Output = T> + PartialOrd> Rect<T> {
    pub fn contains(&self, x: T, y: T) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

impl FloatRect {
    /// The whole target: `(0, 0, 1, 1)` in normalized coordinates.
    pub const UNIT: FloatRect = Rect::new(0.0, 0.0, 1.0, 1.0);
}
