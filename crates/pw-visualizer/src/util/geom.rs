/// World-space point.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Quantized point identity for merging and lookups.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PointKey(i64, i64);

const KEY_SCALE: f64 = 1e9;

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dist_sq(self, o: Point) -> f64 {
        let (dx, dy) = (self.x - o.x, self.y - o.y);
        dx * dx + dy * dy
    }

    #[inline]
    pub fn dist(self, o: Point) -> f64 {
        self.dist_sq(o).sqrt()
    }

    #[inline]
    pub fn midpoint(self, o: Point) -> Point {
        Point::new((self.x + o.x) / 2.0, (self.y + o.y) / 2.0)
    }

    /// `self + t * (to - self)`.
    #[inline]
    pub fn lerp(self, to: Point, t: f64) -> Point {
        Point::new(self.x + t * (to.x - self.x), self.y + t * (to.y - self.y))
    }

    #[inline]
    pub fn key(self) -> PointKey {
        PointKey((self.x * KEY_SCALE).round() as i64, (self.y * KEY_SCALE).round() as i64)
    }
}

/// Clip rectangle for tessellation; `top` is the smaller y.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl BBox {
    /// From an `[x, y, w, h]` viewbox.
    pub fn from_viewbox(vb: [f32; 4]) -> Self {
        let [x, y, w, h] = vb.map(f64::from);
        Self {
            left: x,
            right: x + w,
            top: y,
            bottom: y + h,
        }
    }

    /// Corners in counter-clockwise order (y up).
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right, self.top),
            Point::new(self.right, self.bottom),
            Point::new(self.left, self.bottom),
        ]
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_from_viewbox() {
        let b = BBox::from_viewbox([-2.0, 1.0, 10.0, 4.0]);
        assert_eq!(b, BBox { left: -2.0, right: 8.0, top: 1.0, bottom: 5.0 });
        assert!(b.contains(Point::new(0.0, 3.0)));
        assert!(!b.contains(Point::new(9.0, 3.0)));
    }

    #[test]
    fn keys_identify_equal_points() {
        let a = Point::new(0.1 + 0.2, 1.0);
        let b = Point::new(0.3, 1.0);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), Point::new(0.3001, 1.0).key());
    }

    #[test]
    fn distances() {
        let (a, b) = (Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        assert_eq!(a.dist_sq(b), 25.0);
        assert_eq!(a.dist(b), 5.0);
        assert_eq!(a.midpoint(b), Point::new(1.5, 2.0));
        assert_eq!(a.lerp(b, 0.5), a.midpoint(b));
    }
}
