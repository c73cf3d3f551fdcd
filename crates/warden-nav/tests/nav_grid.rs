use warden_core::{SplitMix64, Vec3};
use warden_nav::{NavGrid, NavigationOracle, SnapCascade};

fn walled_grid() -> NavGrid {
    // 10x10 cells of 100 units, vertical wall at x = 5 with a single gap at y = 5.
    let mut grid = NavGrid::new(10, 10, 100.0);
    for y in 0..10 {
        if y != 5 {
            grid.set_blocked(5, y, true);
        }
    }
    grid
}

#[test]
fn nav_grid_finds_path_around_blockers() {
    let grid = walled_grid();
    let start = Vec3::new(50.0, 50.0, 0.0);
    let goal = Vec3::new(950.0, 50.0, 0.0);

    let path = grid.find_path(start, goal).expect("path should exist");

    assert_eq!(path.points.first().copied(), Some(start));
    assert_eq!(path.points.last().copied(), Some(goal));
    assert!(path.points.iter().all(|p| grid.is_walkable(*p)));
    assert!(path.length() > start.distance(goal));
}

#[test]
fn nav_grid_is_deterministic_for_same_input() {
    let grid = walled_grid();
    let start = Vec3::new(150.0, 150.0, 0.0);
    let goal = Vec3::new(850.0, 850.0, 0.0);

    let a = grid.find_path(start, goal).expect("path should exist");
    let b = grid.find_path(start, goal).expect("path should exist");

    assert_eq!(a.points, b.points);
}

#[test]
fn projection_keeps_walkable_points_and_moves_blocked_ones_to_the_nearest_cell() {
    let grid = walled_grid();
    let extent = Vec3::new(200.0, 200.0, 500.0);

    let open = Vec3::new(120.0, 130.0, 40.0);
    assert_eq!(
        grid.project_to_navigable(open, extent),
        Some(Vec3::new(120.0, 130.0, 0.0))
    );

    let in_wall = Vec3::new(540.0, 150.0, 0.0);
    let projected = grid.project_to_navigable(in_wall, extent).expect("projected");
    assert!(grid.is_walkable(projected));
    assert!(projected.distance_2d(in_wall) <= 100.0);

    // Too far above the floor.
    assert_eq!(
        grid.project_to_navigable(Vec3::new(120.0, 130.0, 900.0), extent),
        None
    );
    // Off the grid entirely.
    assert_eq!(
        grid.project_to_navigable(Vec3::new(-900.0, -900.0, 0.0), extent),
        None
    );
}

#[test]
fn random_reachable_points_stay_on_the_same_side_of_a_wall() {
    let mut grid = NavGrid::new(10, 10, 100.0);
    for y in 0..10 {
        grid.set_blocked(5, y, true);
    }

    let mut rng = SplitMix64::new(9);
    let center = Vec3::new(450.0, 450.0, 0.0);
    for _ in 0..50 {
        let p = grid
            .random_reachable_point(center, 300.0, &mut rng)
            .expect("reachable point");
        assert!(p.x < 500.0, "crossed the wall: {p:?}");
        assert!(p.distance_2d(center) <= 300.0 + 1e-3);
    }
}

#[test]
fn snap_cascade_falls_back_to_random_points_when_projection_fails() {
    let mut grid = NavGrid::new(20, 20, 100.0);
    grid.block_rect(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1000.0, 1000.0, 0.0));

    let desired = Vec3::new(500.0, 500.0, 0.0);
    let mut rng = SplitMix64::new(1);

    let tight = SnapCascade::new(Vec3::new(100.0, 100.0, 100.0), &[]);
    assert_eq!(tight.snap(&grid, desired, &mut rng), None);

    let cascade = SnapCascade::new(Vec3::new(100.0, 100.0, 100.0), &[150.0, 300.0, 800.0]);
    let snapped = cascade.snap(&grid, desired, &mut rng).expect("snapped");
    assert!(grid.is_walkable(snapped));
}

#[test]
fn raycast_reports_the_first_blocked_point() {
    let grid = walled_grid();
    let hit = grid
        .raycast(Vec3::new(50.0, 50.0, 0.0), Vec3::new(950.0, 50.0, 0.0))
        .expect("wall hit");
    assert!((hit.point.x - 500.0).abs() <= 25.0);

    assert_eq!(
        grid.raycast(Vec3::new(50.0, 550.0, 0.0), Vec3::new(950.0, 550.0, 0.0)),
        None
    );
}
