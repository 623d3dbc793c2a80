//! Stateless geometric predicates used by the topology passes.
//!
//! Segments are passed as [`kurbo::Line`] centerlines; callers resolve them
//! from node ids with [`EntityStore::segment_line`](crate::store::EntityStore::segment_line).

use kurbo::{Line, Point};

/// Denominator magnitude below which two segments are treated as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-6;

/// Maximum triangle area for three points to count as collinear.
pub const COLLINEAR_TOLERANCE: f64 = 1e-6;

/// Two points closer than this are the same graph node.
pub const NODE_DEDUP_EPSILON: f64 = 1e-6;

/// Euclidean distance between two points.
pub fn distance(p1: Point, p2: Point) -> f64 {
    p1.distance(p2)
}

/// Clamped projection of `point` onto the segment `start`–`end`.
///
/// Returns the parameter `t` in `[0, 1]` and the foot point. A zero-length
/// segment projects everything onto its start.
pub fn project_onto_segment(point: Point, start: Point, end: Point) -> (f64, Point) {
    let direction = end - start;
    let length_sq = direction.dot(direction);
    if length_sq == 0.0 {
        return (0.0, start);
    }
    let t = ((point - start).dot(direction) / length_sq).clamp(0.0, 1.0);
    (t, start + direction * t)
}

/// Distance from `point` to the closest point of the segment `start`–`end`.
pub fn distance_to_segment(point: Point, start: Point, end: Point) -> f64 {
    let (_, foot) = project_onto_segment(point, start, end);
    point.distance(foot)
}

/// A proper or touching crossing between two segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentCrossing {
    pub point: Point,
    /// Parameter along the first segment.
    pub t: f64,
    /// Parameter along the second segment.
    pub u: f64,
}

/// Solve the 2×2 parametric system for `a.p0 + t·(a.p1 − a.p0) = b.p0 + u·(b.p1 − b.p0)`.
///
/// Parallel (and collinear) pairs never intersect. Both parameters must lie
/// in `[0, 1]`, endpoints included.
pub fn segment_crossing(a: Line, b: Line) -> Option<SegmentCrossing> {
    let r = a.p1 - a.p0;
    let s = b.p1 - b.p0;
    let denominator = r.cross(s);
    if denominator.abs() < PARALLEL_EPSILON {
        return None;
    }

    let offset = b.p0 - a.p0;
    let t = offset.cross(s) / denominator;
    let u = offset.cross(r) / denominator;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }

    Some(SegmentCrossing {
        point: a.p0 + r * t,
        t,
        u,
    })
}

/// Intersection point of two segments, if any.
pub fn segment_intersection(a: Line, b: Line) -> Option<Point> {
    segment_crossing(a, b).map(|c| c.point)
}

/// Signed area of the triangle `p1 p2 p3` (positive when counter-clockwise).
pub fn signed_triangle_area(p1: Point, p2: Point, p3: Point) -> f64 {
    (p2 - p1).cross(p3 - p1) / 2.0
}

/// True iff the triangle `p1 p2 p3` has an area of at most `tolerance`.
pub fn collinear(p1: Point, p2: Point, p3: Point, tolerance: f64) -> bool {
    signed_triangle_area(p1, p2, p3).abs() <= tolerance
}

/// True iff both endpoints of `b` lie on the line through `a`.
pub fn segments_collinear(a: Line, b: Line) -> bool {
    collinear(a.p0, a.p1, b.p0, COLLINEAR_TOLERANCE) && collinear(a.p0, a.p1, b.p1, COLLINEAR_TOLERANCE)
}

/// Closest endpoint-to-segment approach between two segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentGap {
    pub distance: f64,
    /// Point on the first segment.
    pub from: Point,
    /// Point on the second segment.
    pub to: Point,
}

/// Minimum of the four endpoint→opposite-segment projected distances.
pub fn segment_gap(a: Line, b: Line) -> SegmentGap {
    let candidates = [
        (a.p0, project_onto_segment(a.p0, b.p0, b.p1).1, false),
        (a.p1, project_onto_segment(a.p1, b.p0, b.p1).1, false),
        (b.p0, project_onto_segment(b.p0, a.p0, a.p1).1, true),
        (b.p1, project_onto_segment(b.p1, a.p0, a.p1).1, true),
    ];

    let mut best = SegmentGap {
        distance: f64::INFINITY,
        from: a.p0,
        to: b.p0,
    };
    for (endpoint, foot, endpoint_on_b) in candidates {
        let d = endpoint.distance(foot);
        if d < best.distance {
            best = if endpoint_on_b {
                SegmentGap { distance: d, from: foot, to: endpoint }
            } else {
                SegmentGap { distance: d, from: endpoint, to: foot }
            };
        }
    }
    best
}

/// Distance between two segments as defined by [`segment_gap`].
pub fn segment_distance(a: Line, b: Line) -> f64 {
    segment_gap(a, b).distance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Line {
        Line::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    #[test]
    fn test_distance_to_segment_clamps() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((distance_to_segment(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-12);
        assert!((distance_to_segment(Point::new(-4.0, 3.0), a, b) - 5.0).abs() < 1e-12);
        assert!((distance_to_segment(Point::new(13.0, 4.0), a, b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_to_degenerate_segment() {
        let p = Point::new(3.0, 4.0);
        assert!((distance_to_segment(p, Point::ZERO, Point::ZERO) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_crossing_segments() {
        let hit = segment_intersection(line(0.0, 5.0, 10.0, 5.0), line(5.0, 0.0, 5.0, 10.0));
        let p = hit.expect("segments cross");
        assert!((p.x - 5.0).abs() < 1e-12);
        assert!((p.y - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_touching_endpoint_counts() {
        let crossing = segment_crossing(line(0.0, 0.0, 10.0, 0.0), line(10.0, 0.0, 10.0, 5.0))
            .expect("endpoints touch");
        assert!((crossing.t - 1.0).abs() < 1e-12);
        assert!(crossing.u.abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_segments() {
        assert!(segment_intersection(line(0.0, 0.0, 1.0, 0.0), line(2.0, -1.0, 2.0, 1.0)).is_none());
    }

    #[test]
    fn test_parallel_and_overlapping_are_ignored() {
        assert!(segment_intersection(line(0.0, 0.0, 10.0, 0.0), line(0.0, 1.0, 10.0, 1.0)).is_none());
        assert!(segment_intersection(line(0.0, 0.0, 10.0, 0.0), line(5.0, 0.0, 15.0, 0.0)).is_none());
    }

    #[test]
    fn test_collinear_tolerance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!(collinear(a, b, Point::new(20.0, 0.0), COLLINEAR_TOLERANCE));
        assert!(collinear(a, b, Point::new(5.0, 1e-7), COLLINEAR_TOLERANCE));
        assert!(!collinear(a, b, Point::new(5.0, 0.01), COLLINEAR_TOLERANCE));
    }

    #[test]
    fn test_segments_collinear() {
        assert!(segments_collinear(line(0.0, 0.0, 5.0, 5.0), line(5.0, 5.0, 9.0, 9.0)));
        assert!(!segments_collinear(line(0.0, 0.0, 5.0, 0.0), line(5.0, 0.0, 9.0, 1.0)));
    }

    #[test]
    fn test_segment_gap_parallel() {
        let gap = segment_gap(line(0.0, 0.0, 10.0, 0.0), line(0.0, 8.0, 10.0, 8.0));
        assert!((gap.distance - 8.0).abs() < 1e-12);
        assert!((gap.from.y - 0.0).abs() < 1e-12);
        assert!((gap.to.y - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_segment_gap_uses_opposite_endpoint() {
        // Only the second segment's endpoint projects inside the first one.
        let gap = segment_gap(line(0.0, 0.0, 10.0, 0.0), line(4.0, 3.0, 4.0, 20.0));
        assert!((gap.distance - 3.0).abs() < 1e-12);
        assert_eq!(gap.to, Point::new(4.0, 3.0));
        assert_eq!(gap.from, Point::new(4.0, 0.0));
    }
}
