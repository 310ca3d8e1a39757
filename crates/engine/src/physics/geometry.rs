/// World-space point or offset. World units are pixels, `y` grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn add_x(self, dx: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y,
        }
    }

    pub fn add_y(self, dy: f32) -> Self {
        Self {
            x: self.x,
            y: self.y + dy,
        }
    }

    pub fn subtract_x(self, dx: f32) -> Self {
        self.add_x(-dx)
    }

    pub fn subtract_y(self, dy: f32) -> Self {
        self.add_y(-dy)
    }
}

/// Axis-aligned box. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2 {
            x: self.x + self.width * 0.5,
            y: self.y + self.height * 0.5,
        }
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Strict overlap: boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Like [`Rect::intersects`] but both overlap extents must exceed `tolerance`.
    pub fn overlaps_by_more_than(&self, other: &Rect, tolerance: f32) -> bool {
        let overlap_x = self.right().min(other.right()) - self.left().max(other.left());
        let overlap_y = self.bottom().min(other.bottom()) - self.top().max(other.top());
        overlap_x > tolerance && overlap_y > tolerance
    }

    pub fn union(&self, other: &Rect) -> Self {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right_neighbor = Rect::new(10.0, 0.0, 10.0, 10.0);
        let below_neighbor = Rect::new(0.0, 10.0, 10.0, 10.0);

        assert!(!a.intersects(&right_neighbor));
        assert!(!a.intersects(&below_neighbor));
        assert!(!right_neighbor.intersects(&a));
    }

    #[test]
    fn overlapping_boxes_intersect_symmetrically() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(9.5, 9.5, 4.0, 4.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn tolerance_ignores_sliver_overlap() {
        let ground = Rect::new(0.0, 48.0, 48.0, 48.0);
        let feet = Rect::new(8.0, 0.0, 32.0, 48.0001);

        assert!(feet.intersects(&ground));
        assert!(!feet.overlaps_by_more_than(&ground, 0.001));
    }

    #[test]
    fn point_translation_returns_new_value() {
        let origin = Vec2::new(5.0, 7.0);
        let moved = origin.add_x(3.0).subtract_y(2.0);

        assert_eq!(origin, Vec2::new(5.0, 7.0));
        assert_eq!(moved, Vec2::new(8.0, 5.0));
        assert_eq!(moved.subtract_x(8.0).add_y(1.0), Vec2::new(0.0, 6.0));
    }

    #[test]
    fn union_covers_both_boxes() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let b = Rect::new(6.0, -2.0, 2.0, 2.0);
        let merged = a.union(&b);

        assert_eq!(merged, Rect::new(0.0, -2.0, 8.0, 6.0));
    }
}
