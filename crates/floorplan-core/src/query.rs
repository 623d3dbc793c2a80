//! Read-only queries for renderers and hit-testing.

use crate::geometry::{distance_to_segment, project_onto_segment};
use crate::model::{NodeId, Segment, SegmentId, WallId};
use crate::store::EntityStore;
use kurbo::{Line, Point, Rect};

/// Nearest segment to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    pub segment: SegmentId,
    pub distance: f64,
    /// Closest point on the segment's centerline.
    pub foot: Point,
}

/// Nearest wall outline to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallHit {
    pub wall: WallId,
    /// Distance to the wall's outline (zero inside it).
    pub shell_distance: f64,
}

impl EntityStore {
    /// Member segments of a wall in wall order. Ids that no longer resolve
    /// are skipped.
    pub fn wall_segments(&self, wall: WallId) -> Vec<&Segment> {
        self.wall(wall)
            .map(|w| w.segment_ids().iter().filter_map(|&s| self.segment(s)).collect())
            .unwrap_or_default()
    }

    fn wall_lines(&self, wall: WallId) -> Vec<Line> {
        self.wall(wall)
            .map(|w| w.segment_ids().iter().filter_map(|&s| self.segment_line(s)).collect())
            .unwrap_or_default()
    }

    /// Bounding box of a wall's centerline, or `None` for a missing or
    /// empty wall.
    pub fn wall_bounds(&self, wall: WallId) -> Option<Rect> {
        self.wall_lines(wall)
            .into_iter()
            .map(|line| Rect::from_points(line.p0, line.p1))
            .reduce(|acc, r| acc.union(r))
    }

    /// Centerline bounds grown by half the wall thickness on every side.
    pub fn wall_outline_bounds(&self, wall: WallId) -> Option<Rect> {
        let half = self.wall(wall)?.thickness() / 2.0;
        Some(self.wall_bounds(wall)?.inflate(half, half))
    }

    /// Total centerline length of a wall.
    pub fn wall_length(&self, wall: WallId) -> f64 {
        self.wall_segments(wall).iter().map(|s| s.length()).sum()
    }

    /// Distance from `point` to the nearest centerline segment of a wall.
    pub fn wall_centerline_distance(&self, wall: WallId, point: Point) -> Option<f64> {
        self.wall_lines(wall)
            .into_iter()
            .map(|line| distance_to_segment(point, line.p0, line.p1))
            .reduce(f64::min)
    }

    /// Distance from `point` to a wall's outline: centerline distance minus
    /// half the thickness, clamped to zero.
    pub fn shell_distance(&self, wall: WallId, point: Point) -> Option<f64> {
        let half = self.wall(wall)?.thickness() / 2.0;
        let centerline = self.wall_centerline_distance(wall, point)?;
        Some((centerline - half).max(0.0))
    }

    /// The visible wall whose outline is nearest to `point`, if within
    /// `tolerance`. Ties go to the lower wall id.
    pub fn hit_test_walls(&self, point: Point, tolerance: f64) -> Option<WallHit> {
        self.all_walls()
            .into_iter()
            .filter(|wall| wall.visible)
            .filter_map(|wall| {
                let shell_distance = self.shell_distance(wall.id(), point)?;
                (shell_distance <= tolerance).then_some(WallHit {
                    wall: wall.id(),
                    shell_distance,
                })
            })
            .min_by(|a, b| a.shell_distance.total_cmp(&b.shell_distance))
    }

    /// Nodes within `radius` of `point`, nearest first.
    pub fn nodes_near(&self, point: Point, radius: f64) -> Vec<NodeId> {
        let mut found: Vec<(NodeId, f64)> = self
            .nodes()
            .map(|n| (n.id(), n.position().distance(point)))
            .filter(|&(_, d)| d <= radius)
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found.into_iter().map(|(id, _)| id).collect()
    }

    /// The node nearest to `point` within `radius`.
    pub fn nearest_node(&self, point: Point, radius: f64) -> Option<NodeId> {
        self.nodes_near(point, radius).into_iter().next()
    }

    /// The segment whose centerline passes nearest to `point`, within
    /// `max_distance`.
    pub fn nearest_segment(&self, point: Point, max_distance: f64) -> Option<SegmentHit> {
        self.segments()
            .filter_map(|segment| {
                let line = self.segment_line(segment.id())?;
                let (_, foot) = project_onto_segment(point, line.p0, line.p1);
                let distance = point.distance(foot);
                (distance <= max_distance).then_some(SegmentHit {
                    segment: segment.id(),
                    distance,
                    foot,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance).then(a.segment.cmp(&b.segment)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WallKind;
    use crate::topology::WallUpdate;

    fn l_shaped_wall(store: &mut EntityStore, kind: WallKind) -> WallId {
        let a = store.create_node(0.0, 0.0).unwrap();
        let b = store.create_node(1000.0, 0.0).unwrap();
        let c = store.create_node(1000.0, 500.0).unwrap();
        let ab = store.create_segment(a, b).unwrap();
        let bc = store.create_segment(b, c).unwrap();
        store.create_wall(kind, &[ab, bc])
    }

    #[test]
    fn test_wall_bounds_and_length() {
        let mut store = EntityStore::new();
        let wall = l_shaped_wall(&mut store, WallKind::Layout);

        let bounds = store.wall_bounds(wall).unwrap();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 1000.0, 500.0));
        let outline = store.wall_outline_bounds(wall).unwrap();
        assert_eq!(outline, Rect::new(-175.0, -175.0, 1175.0, 675.0));
        assert!((store.wall_length(wall) - 1500.0).abs() < 1e-9);
        assert_eq!(store.wall_segments(wall).len(), 2);
    }

    #[test]
    fn test_empty_wall_has_no_bounds() {
        let mut store = EntityStore::new();
        let wall = store.create_wall(WallKind::Zone, &[]);
        assert!(store.wall_bounds(wall).is_none());
        assert!(store.shell_distance(wall, Point::ZERO).is_none());
    }

    #[test]
    fn test_shell_distance_clamps() {
        let mut store = EntityStore::new();
        let wall = l_shaped_wall(&mut store, WallKind::Zone);

        // Inside the 250-thick outline.
        assert_eq!(store.shell_distance(wall, Point::new(500.0, 100.0)), Some(0.0));
        // 300 from the centerline, 175 from the outline.
        let d = store.shell_distance(wall, Point::new(500.0, -300.0)).unwrap();
        assert!((d - 175.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_skips_hidden_walls() {
        let mut store = EntityStore::new();
        let wall = l_shaped_wall(&mut store, WallKind::Area);
        let point = Point::new(500.0, 80.0);

        assert_eq!(store.hit_test_walls(point, 10.0).map(|h| h.wall), Some(wall));
        store.update_wall(wall, WallUpdate::new().with_visible(false));
        assert!(store.hit_test_walls(point, 10.0).is_none());
    }

    #[test]
    fn test_nearest_queries() {
        let mut store = EntityStore::new();
        l_shaped_wall(&mut store, WallKind::Area);

        let near = store.nodes_near(Point::new(990.0, 5.0), 20.0);
        assert_eq!(near.len(), 1);
        let hit = store.nearest_segment(Point::new(400.0, 12.0), 20.0).unwrap();
        assert!((hit.distance - 12.0).abs() < 1e-9);
        assert_eq!(hit.foot, Point::new(400.0, 0.0));
        assert!(store.nearest_segment(Point::new(400.0, 250.0), 20.0).is_none());
    }
}
