//! Quadrilateral geometry over four selected points.
//!
//! The points arrive in selection order, which says nothing about their
//! arrangement in the image.  Sorting them by polar angle around their
//! centroid yields a simple (non-self-intersecting) polygon whenever the
//! points are in roughly convex position.

use std::cmp::Ordering;

use serde::Serialize;

use crate::landmark::Point;

// ════════════════════════════════════════════════════════════════════════════
// OrderedShape
// ════════════════════════════════════════════════════════════════════════════

/// Four points in ascending angular order with their side lengths and area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OrderedShape {
    pub points: [Point; 4],
    /// `sides[i]` is the distance from `points[i]` to `points[(i + 1) % 4]`.
    pub sides:  [f64; 4],
    /// Enclosed area, always `>= 0`.
    pub area:   f64,
}

impl OrderedShape {
    pub fn average_side(&self) -> f64 {
        self.sides.iter().sum::<f64>() / self.sides.len() as f64
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(&self.points)
    }
}

/// Axis-aligned extent of a point set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn around(points: &[Point]) -> Self {
        let init = BoundingBox {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        points.iter().fold(init, |b, p| BoundingBox {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        })
    }

    pub fn width(&self) -> f64 { self.max_x - self.min_x }
    pub fn height(&self) -> f64 { self.max_y - self.min_y }
}

// ════════════════════════════════════════════════════════════════════════════
// Geometry primitives
// ════════════════════════════════════════════════════════════════════════════

/// Arithmetic mean of `x` and `y`.  Depth is dropped.
pub fn centroid(points: &[Point; 4]) -> Point {
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

/// Sort by `atan2(y - cy, x - cx)`, ascending.
///
/// The sort is stable: points with equal angles keep their input order.
/// Angles that cannot be compared (NaN coordinates) are treated as equal.
pub fn angular_sort(points: [Point; 4]) -> [Point; 4] {
    let c = centroid(&points);
    let mut keyed = points.map(|p| ((p.y - c.y).atan2(p.x - c.x), p));
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    keyed.map(|(_, p)| p)
}

/// Distances between consecutive points, closing the polygon.
pub fn side_lengths(points: &[Point; 4]) -> [f64; 4] {
    std::array::from_fn(|i| points[i].distance(&points[(i + 1) % 4]))
}

/// Shoelace area of the polygon in the given vertex order.
pub fn shoelace_area(points: &[Point]) -> f64 {
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let (p, q) = (points[i], points[(i + 1) % n]);
            p.x * q.y - q.x * p.y
        })
        .sum();
    twice.abs() / 2.0
}

/// Order four points angularly and measure the resulting quadrilateral.
pub fn build_shape(points: [Point; 4]) -> OrderedShape {
    let points = angular_sort(points);
    OrderedShape {
        points,
        sides: side_lengths(&points),
        area:  shoelace_area(&points),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn square(x0: f64, y0: f64, s: f64) -> [Point; 4] {
        [
            Point::new(x0, y0),
            Point::new(x0 + s, y0),
            Point::new(x0 + s, y0 + s),
            Point::new(x0, y0 + s),
        ]
    }

    #[test]
    fn square_sides_and_area() {
        let shape = build_shape(square(0.2, 0.3, 0.25));
        for side in shape.sides {
            assert!((side - 0.25).abs() < EPS, "side {}", side);
        }
        assert!((shape.area - 0.0625).abs() < EPS);
    }

    #[test]
    fn crossed_input_is_untangled() {
        // Diagonals given as consecutive pairs: a bow-tie if taken in order.
        let [a, b, c, d] = square(0.0, 0.0, 1.0);
        let bow_tie = [a, c, b, d];
        assert!(shoelace_area(&bow_tie) < 0.5);

        let shape = build_shape(bow_tie);
        assert!((shape.area - 1.0).abs() < EPS);
        assert!((shape.average_side() - 1.0).abs() < EPS);
    }

    #[test]
    fn angular_order_starts_near_minus_pi() {
        // atan2 range is (-π, π]; the (0, 0) corner sits at -3π/4.
        let [a, b, c, d] = square(0.0, 0.0, 1.0);
        let sorted = angular_sort([c, d, a, b]);
        assert_eq!(sorted, [a, b, c, d]);
    }

    #[test]
    fn angular_sort_is_idempotent() {
        let pts = [
            Point::new(0.1, 0.2), Point::new(0.9, 0.1),
            Point::new(0.7, 0.8), Point::new(0.2, 0.6),
        ];
        let once = angular_sort(pts);
        assert_eq!(angular_sort(once), once);
    }

    #[test]
    fn equal_angles_keep_input_order() {
        // Two points on the same ray from the centroid.  Dyadic coordinates
        // keep the centroid exact so both angles are exactly zero.
        let near = Point::new(0.625, 0.5);
        let far  = Point::new(0.875, 0.5);
        let pts = [near, Point::new(0.25, 0.25), far, Point::new(0.25, 0.75)];
        assert_eq!(centroid(&pts), Point::new(0.5, 0.5));
        let sorted = angular_sort(pts);
        let pos = |p: Point| sorted.iter().position(|q| *q == p).unwrap();
        assert!(pos(near) < pos(far));

        let swapped = [far, Point::new(0.25, 0.25), near, Point::new(0.25, 0.75)];
        let sorted = angular_sort(swapped);
        let pos = |p: Point| sorted.iter().position(|q| *q == p).unwrap();
        assert!(pos(far) < pos(near));
    }

    #[test]
    fn collinear_points_have_zero_area() {
        let pts = [
            Point::new(0.1, 0.1), Point::new(0.2, 0.2),
            Point::new(0.3, 0.3), Point::new(0.4, 0.4),
        ];
        let shape = build_shape(pts);
        assert!(shape.area.abs() < EPS);
        assert_eq!(shape.sides.len(), 4);
        assert!(shape.sides.iter().all(|s| s.is_finite() && *s >= 0.0));
    }

    #[test]
    fn coincident_points_are_well_defined() {
        let p = Point::new(0.5, 0.5);
        let shape = build_shape([p; 4]);
        assert_eq!(shape.area, 0.0);
        assert_eq!(shape.sides, [0.0; 4]);
    }

    #[test]
    fn shoelace_is_rotation_invariant() {
        let pts = angular_sort([
            Point::new(0.1, 0.2), Point::new(0.9, 0.1),
            Point::new(0.7, 0.8), Point::new(0.2, 0.6),
        ]);
        let base = shoelace_area(&pts);
        for k in 1..4 {
            let mut rotated = pts;
            rotated.rotate_left(k);
            assert!((shoelace_area(&rotated) - base).abs() < EPS);
        }
    }

    #[test]
    fn bounding_box_of_shape() {
        let shape = build_shape([
            Point::new(0.2, 0.4), Point::new(0.5, 0.1),
            Point::new(0.6, 0.5), Point::new(0.3, 0.7),
        ]);
        let bb = shape.bounding_box();
        assert!((bb.width() - 0.4).abs() < EPS);
        assert!((bb.height() - 0.6).abs() < EPS);
    }

    #[test]
    fn centroid_drops_depth() {
        let c = centroid(&[Point::with_depth(0.0, 0.0, -1.0); 4]);
        assert_eq!(c.z, None);
    }
}
