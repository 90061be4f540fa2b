#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

/// A point in surface space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of an asset or a drawable region.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}
