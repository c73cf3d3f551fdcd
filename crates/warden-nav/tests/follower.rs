use warden_core::Vec3;
use warden_nav::{MoveRequest, MoveResult, NavGrid, OpenGround, PathFollower};

#[test]
fn follower_reaches_goal_within_acceptance() {
    let ground = OpenGround::default();
    let from = Vec3::new(0.0, 0.0, 0.0);
    let request = MoveRequest::new(Vec3::new(1000.0, 0.0, 0.0), 50.0);

    let (result, follower) = PathFollower::plan(&ground, from, &request);
    assert_eq!(result, MoveResult::Accepted);
    let mut follower = follower.expect("follower");

    let mut pos = from;
    let mut steps = 0;
    while !follower.is_done(pos) {
        pos = follower.advance(pos, 100.0);
        steps += 1;
        assert!(steps < 100, "did not arrive");
    }
    assert!(pos.distance(request.goal) <= 50.0 + 1e-3);
}

#[test]
fn already_at_goal_needs_no_follower() {
    let ground = OpenGround::default();
    let request = MoveRequest::new(Vec3::new(10.0, 0.0, 0.0), 50.0);
    let (result, follower) = PathFollower::plan(&ground, Vec3::ZERO, &request);
    assert_eq!(result, MoveResult::AlreadyAtGoal);
    assert!(follower.is_none());
}

#[test]
fn unreachable_goal_is_rejected_unless_partial_paths_are_allowed() {
    let mut grid = NavGrid::new(10, 10, 100.0);
    // Goal sits in the middle of a solid 3x3 block.
    grid.block_rect(Vec3::new(700.0, 700.0, 0.0), Vec3::new(1000.0, 1000.0, 0.0));

    let from = Vec3::new(50.0, 50.0, 0.0);
    let goal = Vec3::new(850.0, 850.0, 0.0);

    let (strict, _) = PathFollower::plan(&grid, from, &MoveRequest::new(goal, 50.0));
    assert_eq!(strict, MoveResult::Rejected);

    let (partial, follower) =
        PathFollower::plan(&grid, from, &MoveRequest::new(goal, 50.0).allow_partial(true));
    assert_eq!(partial, MoveResult::Accepted);
    let follower = follower.expect("partial follower");
    let end = *follower.path().points.last().expect("end");
    assert!(grid.is_walkable(end));
}
