//! Drawing workflow: committing polylines as walls.

use floorplan_core::{
    DrawError, EntityStore, PointResolution, TolerancePolicy, WallDrawer, WallKind, check_invariants,
};
use kurbo::Point;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn drawer() -> WallDrawer {
    WallDrawer::new(TolerancePolicy::default())
}

#[test]
fn test_crossing_walls_share_a_node() {
    init_logging();
    let mut store = EntityStore::new();
    let drawer = drawer();

    let first = drawer
        .draw_wall(&mut store, WallKind::Layout, &[Point::new(0.0, 0.0), Point::new(1000.0, 0.0)])
        .unwrap();
    let second = drawer
        .draw_wall(&mut store, WallKind::Zone, &[Point::new(500.0, -500.0), Point::new(500.0, 500.0)])
        .unwrap();

    assert_eq!(second.segments.len(), 2);
    assert_eq!(second.modifications.len(), 2);
    assert_eq!(store.wall(first.wall).unwrap().segment_ids().len(), 2);

    let center = store.nearest_node(Point::new(500.0, 0.0), 1e-6).unwrap();
    assert_eq!(store.node(center).unwrap().degree(), 4);
    check_invariants(&store).unwrap();
}

#[test]
fn test_nearby_endpoint_is_reused() {
    init_logging();
    let mut store = EntityStore::new();
    let drawer = drawer();

    drawer
        .draw_wall(&mut store, WallKind::Layout, &[Point::new(0.0, 0.0), Point::new(1000.0, 0.0)])
        .unwrap();
    let corner = store.nearest_node(Point::new(1000.0, 0.0), 1e-6).unwrap();

    let outcome = drawer
        .draw_wall(&mut store, WallKind::Layout, &[Point::new(1010.0, 5.0), Point::new(1010.0, 600.0)])
        .unwrap();
    assert_eq!(outcome.points[0], PointResolution::Reused(corner));
    assert_eq!(store.node(corner).unwrap().degree(), 2);
    assert_eq!(store.node_count(), 3);
    check_invariants(&store).unwrap();
}

#[test]
fn test_point_near_segment_splits_it() {
    init_logging();
    let mut store = EntityStore::new();
    let drawer = drawer();

    let base = drawer
        .draw_wall(&mut store, WallKind::Layout, &[Point::new(0.0, 0.0), Point::new(1000.0, 0.0)])
        .unwrap();
    let outcome = drawer
        .draw_wall(&mut store, WallKind::Layout, &[Point::new(500.0, 100.0), Point::new(500.0, 800.0)])
        .unwrap();

    let PointResolution::Projected(foot) = outcome.points[0] else {
        panic!("expected a projected point, got {:?}", outcome.points[0]);
    };
    assert_eq!(store.node(foot).unwrap().position(), Point::new(500.0, 0.0));
    assert_eq!(store.node(foot).unwrap().degree(), 3);
    assert_eq!(store.wall(base.wall).unwrap().segment_ids().len(), 2);
    assert_eq!(outcome.modifications.len(), 1);
    check_invariants(&store).unwrap();
}

#[test]
fn test_points_collapsing_to_one_node_fail() {
    init_logging();
    let mut store = EntityStore::new();
    let result = drawer().draw_wall(&mut store, WallKind::Area, &[Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);

    assert!(matches!(result, Err(DrawError::NoSegments)));
    assert_eq!(store.node_count(), 0);
    assert_eq!(store.segment_count(), 0);
    assert_eq!(store.wall_count(), 0);
}

#[test]
fn test_collapsed_draw_restores_projected_split() {
    init_logging();
    let mut store = EntityStore::new();
    let drawer = drawer();
    let base = drawer
        .draw_wall(&mut store, WallKind::Layout, &[Point::new(0.0, 0.0), Point::new(1000.0, 0.0)])
        .unwrap();

    // The first point splits the base wall at (500, 0); the second reuses that node.
    let result = drawer.draw_wall(&mut store, WallKind::Area, &[Point::new(500.0, 50.0), Point::new(500.0, 55.0)]);

    assert!(matches!(result, Err(DrawError::NoSegments)));
    assert_eq!(store.node_count(), 2);
    assert_eq!(store.segment_count(), 1);
    assert_eq!(store.wall(base.wall).unwrap().segment_ids().len(), 1);
    assert!((store.wall_length(base.wall) - 1000.0).abs() < 1e-9);
    check_invariants(&store).unwrap();
}

#[test]
fn test_closed_outline() {
    init_logging();
    let mut store = EntityStore::new();
    let outline = [
        Point::new(0.0, 0.0),
        Point::new(2000.0, 0.0),
        Point::new(2000.0, 1500.0),
        Point::new(0.0, 1500.0),
        Point::new(0.0, 0.0),
    ];
    let outcome = drawer().draw_wall(&mut store, WallKind::Layout, &outline).unwrap();

    assert_eq!(outcome.segments.len(), 4);
    assert_eq!(store.node_count(), 4);
    assert!(store.nodes().all(|n| n.degree() == 2));
    assert!((store.wall_length(outcome.wall) - 7000.0).abs() < 1e-9);
    check_invariants(&store).unwrap();
}
