use super::*;
use crate::nav::fixed_math::{FixedNum, FixedVec2};

fn tuning() -> FollowTuning {
    FollowTuning {
        speed: FixedNum::from_num(4),
        stall_check_interval: FixedNum::from_num(0.5),
        stall_tolerance: FixedNum::from_num(0.2),
        arrival_tolerance: FixedNum::ZERO,
    }
}

/// 1/8 s: four ticks per stall interval, half a unit of travel per tick.
fn dt() -> FixedNum {
    FixedNum::from_num(0.125)
}

fn v(x: f32, y: f32) -> FixedVec2 {
    FixedVec2::from_f32(x, y)
}

/// Waypoints one unit apart along y = 0.5, ending at x = 0.5 + `len`.
fn straight_path(len: usize) -> Vec<FixedVec2> {
    (1..=len).map(|i| v(0.5 + i as f32, 0.5)).collect()
}

fn following(position: FixedVec2, path: &[FixedVec2], target: FixedVec2) -> PathFollower {
    let mut follower = PathFollower::default();
    let mut actions = Vec::new();
    follower.start_follow(position, target, &mut actions);
    assert!(follower.on_path_delivered(true, path, position, &mut actions));
    follower
}

/// Tick once and apply any Move to `position`, as the movement pass would.
fn step(follower: &mut PathFollower, position: &mut FixedVec2) -> Vec<FollowAction> {
    let mut actions = Vec::new();
    follower.tick(*position, dt(), &tuning(), &mut actions);
    for action in &actions {
        if let FollowAction::Move(displacement) = action {
            *position += *displacement;
        }
    }
    actions
}

fn replan_requests(actions: &[FollowAction]) -> usize {
    actions
        .iter()
        .filter(|a| matches!(a, FollowAction::RequestPath { exclude_waypoint: Some(_), .. }))
        .count()
}

#[test]
fn test_start_follow_requests_path_from_current_position() {
    let mut follower = PathFollower::default();
    let mut actions = Vec::new();

    follower.start_follow(v(0.5, 0.5), v(3.5, 0.5), &mut actions);

    assert_eq!(follower.state(), FollowState::Requesting);
    assert_eq!(follower.target(), Some(v(3.5, 0.5)));
    assert_eq!(
        actions,
        vec![FollowAction::RequestPath {
            start: v(0.5, 0.5),
            target: v(3.5, 0.5),
            exclude_waypoint: None,
        }]
    );
}

#[test]
fn test_delivery_starts_following_and_faces_first_waypoint() {
    let mut follower = PathFollower::default();
    let mut actions = Vec::new();
    follower.start_follow(v(0.5, 0.5), v(2.5, 0.5), &mut actions);
    actions.clear();

    let applied = follower.on_path_delivered(true, &straight_path(2), v(0.5, 0.5), &mut actions);

    assert!(applied);
    assert_eq!(follower.state(), FollowState::Following);
    assert_eq!(follower.waypoint_index(), 0);
    assert_eq!(follower.current_waypoint(), Some(v(1.5, 0.5)));
    assert_eq!(actions, vec![FollowAction::Rotate(v(1.0, 0.0))]);
}

#[test]
fn test_failed_delivery_keeps_prior_state() {
    let mut follower = PathFollower::default();
    let mut actions = Vec::new();
    follower.start_follow(v(0.5, 0.5), v(2.5, 0.5), &mut actions);
    actions.clear();

    assert!(!follower.on_path_delivered(false, &[], v(0.5, 0.5), &mut actions));
    assert_eq!(follower.state(), FollowState::Requesting);
    assert!(actions.is_empty());

    let mut follower = following(v(0.5, 0.5), &straight_path(2), v(2.5, 0.5));
    assert!(!follower.on_path_delivered(false, &[], v(0.5, 0.5), &mut actions));
    assert_eq!(follower.state(), FollowState::Following);
    assert_eq!(follower.path(), straight_path(2).as_slice());
}

#[test]
fn test_delivery_ignored_when_idle() {
    let mut follower = PathFollower::default();
    let mut actions = Vec::new();

    assert!(!follower.on_path_delivered(true, &straight_path(2), v(0.5, 0.5), &mut actions));
    assert_eq!(follower.state(), FollowState::Idle);
    assert!(follower.path().is_empty());
}

#[test]
fn test_walks_path_and_completes() {
    let target = v(2.5, 0.5);
    let mut position = v(0.5, 0.5);
    let mut follower = following(position, &straight_path(2), target);

    let mut ticks = 0;
    let mut completed = None;
    while completed.is_none() && ticks < 20 {
        let actions = step(&mut follower, &mut position);
        completed = actions.iter().find_map(|a| match a {
            FollowAction::Complete { target } => Some(*target),
            _ => None,
        });
        if completed.is_some() {
            assert!(!actions.iter().any(|a| matches!(a, FollowAction::Move(_))));
        }
        ticks += 1;
    }

    // Four ticks of half a unit, then the completing tick
    assert_eq!(ticks, 5);
    assert_eq!(completed, Some(target));
    assert_eq!(position, target);
    assert_eq!(follower.state(), FollowState::Completed);
    assert_eq!(follower.replans(), 0);

    let actions = step(&mut follower, &mut position);
    assert!(actions.is_empty());
    assert_eq!(follower.state(), FollowState::Idle);
}

#[test]
fn test_movement_carries_through_waypoint_and_reorients() {
    // Waypoint half a step away: arrive, turn north, keep going
    let mut position = v(0.5, 0.5);
    let path = vec![v(0.75, 0.5), v(0.75, 1.5)];
    let mut follower = following(position, &path, v(0.75, 1.5));

    let actions = step(&mut follower, &mut position);

    assert!(actions.contains(&FollowAction::Rotate(v(0.0, 1.0))));
    assert_eq!(position, v(0.75, 0.75));
    // Passed once the agent is seen past the waypoint
    assert_eq!(follower.waypoint_index(), 0);
    step(&mut follower, &mut position);
    assert_eq!(follower.waypoint_index(), 1);
    assert_eq!(position, v(0.75, 1.25));
}

#[test]
fn test_rejected_move_keeps_current_waypoint() {
    let blocked = v(0.9, 0.0);
    let mut follower = following(blocked, &[v(1.0, 0.0), v(1.0, 5.0)], v(1.0, 5.0));

    // The move through (1, 0) is emitted but never applied
    let mut actions = Vec::new();
    follower.tick(blocked, dt(), &tuning(), &mut actions);
    assert!(actions.iter().any(|a| matches!(a, FollowAction::Move(_))));

    let mut actions = Vec::new();
    follower.tick(blocked, dt(), &tuning(), &mut actions);

    assert_eq!(follower.waypoint_index(), 0);
    assert_eq!(follower.current_waypoint(), Some(v(1.0, 0.0)));
    assert_eq!(actions.first(), Some(&FollowAction::Rotate(v(1.0, 0.0) - blocked)));
}

#[test]
fn test_stall_after_rejected_move_excludes_unreached_waypoint() {
    let blocked = v(0.9, 0.0);
    let mut follower = following(blocked, &[v(1.0, 0.0), v(1.0, 5.0)], v(1.0, 5.0));

    let mut actions = Vec::new();
    for _ in 0..5 {
        follower.tick(blocked, dt(), &tuning(), &mut actions);
    }

    let excluded: Vec<_> = actions
        .iter()
        .filter_map(|a| match a {
            FollowAction::RequestPath { exclude_waypoint, .. } => *exclude_waypoint,
            _ => None,
        })
        .collect();
    assert_eq!(excluded, vec![v(1.0, 0.0)]);
}

#[test]
fn test_named_arrival_tolerance_advances_early() {
    let mut follower = following(v(0.5, 0.5), &[v(0.7, 0.5), v(2.5, 0.5)], v(2.5, 0.5));
    let mut actions = Vec::new();
    let loose = FollowTuning {
        arrival_tolerance: FixedNum::from_num(0.25),
        ..tuning()
    };

    follower.tick(v(0.5, 0.5), dt(), &loose, &mut actions);

    assert_eq!(follower.waypoint_index(), 1);
    assert!(actions.contains(&FollowAction::Move(v(0.5, 0.0))));
}

#[test]
fn test_empty_path_completes_next_tick() {
    let mut position = v(1.5, 1.5);
    let mut follower = following(position, &[], position);

    let actions = step(&mut follower, &mut position);

    assert_eq!(actions, vec![FollowAction::Complete { target: v(1.5, 1.5) }]);
    assert_eq!(follower.state(), FollowState::Completed);
}

#[test]
fn test_stall_replans_once_per_interval() {
    let mut follower = following(v(0.5, 0.5), &straight_path(4), v(4.5, 0.5));
    let stuck = v(0.5, 0.5);
    let mut replans_per_tick = Vec::new();

    // First tick only records the starting position; then 4 ticks per interval
    for _ in 0..13 {
        let mut actions = Vec::new();
        follower.tick(stuck, dt(), &tuning(), &mut actions);
        replans_per_tick.push(replan_requests(&actions));
    }

    assert_eq!(replans_per_tick, vec![0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1]);
    assert_eq!(follower.replans(), 3);
    assert!(follower.is_replan_pending());
    assert_eq!(follower.state(), FollowState::Following);
}

#[test]
fn test_stall_replan_excludes_current_waypoint() {
    let mut follower = following(v(0.5, 0.5), &straight_path(4), v(4.5, 0.5));
    let mut actions = Vec::new();

    for _ in 0..5 {
        follower.tick(v(0.5, 0.5), dt(), &tuning(), &mut actions);
    }

    let request = actions
        .iter()
        .find(|a| matches!(a, FollowAction::RequestPath { .. }))
        .cloned();
    assert_eq!(
        request,
        Some(FollowAction::RequestPath {
            start: v(0.5, 0.5),
            target: v(4.5, 0.5),
            exclude_waypoint: Some(v(1.5, 0.5)),
        })
    );
}

#[test]
fn test_no_replan_while_moving_at_speed() {
    let mut position = v(0.5, 0.5);
    let mut follower = following(position, &straight_path(10), v(10.5, 0.5));

    let mut replans = 0;
    for _ in 0..17 {
        replans += replan_requests(&step(&mut follower, &mut position));
    }

    assert_eq!(replans, 0);
    assert_eq!(position, v(9.0, 0.5));
}

#[test]
fn test_replans_stop_once_progress_resumes() {
    let mut position = v(0.5, 0.5);
    let mut follower = following(position, &straight_path(10), v(10.5, 0.5));

    for _ in 0..5 {
        let mut actions = Vec::new();
        follower.tick(position, dt(), &tuning(), &mut actions);
    }
    assert_eq!(follower.replans(), 1);

    // The interval spanning the blocked tick may still come up short once
    for _ in 0..4 {
        step(&mut follower, &mut position);
    }
    let settled = follower.replans();
    assert!(settled <= 2);

    for _ in 0..8 {
        step(&mut follower, &mut position);
    }
    assert_eq!(follower.replans(), settled);
}

#[test]
fn test_replanned_path_replaces_old_from_start() {
    let mut position = v(0.5, 0.5);
    let mut follower = following(position, &straight_path(3), v(3.5, 0.5));
    step(&mut follower, &mut position);
    step(&mut follower, &mut position);
    step(&mut follower, &mut position);
    assert_eq!(follower.waypoint_index(), 1);

    let detour = vec![v(1.5, 1.5), v(2.5, 1.5), v(3.5, 0.5)];
    let mut actions = Vec::new();
    assert!(follower.on_path_delivered(true, &detour, position, &mut actions));

    assert_eq!(follower.waypoint_index(), 0);
    assert_eq!(follower.path(), detour.as_slice());
    assert_eq!(follower.state(), FollowState::Following);
}

#[test]
fn test_retarget_while_following_keeps_walking_old_path() {
    let mut position = v(0.5, 0.5);
    let mut follower = following(position, &straight_path(3), v(3.5, 0.5));
    let mut actions = Vec::new();

    follower.start_follow(position, v(0.5, 5.5), &mut actions);

    assert_eq!(follower.state(), FollowState::Following);
    assert!(follower.is_replan_pending());
    assert!(follower.is_retarget_pending());
    assert_eq!(follower.target(), Some(v(0.5, 5.5)));

    let actions = step(&mut follower, &mut position);
    assert!(actions.contains(&FollowAction::Move(v(0.5, 0.0))));
}

#[test]
fn test_old_path_running_out_waits_for_retarget() {
    let mut position = v(0.5, 0.5);
    let old_goal = v(1.5, 0.5);
    let new_goal = v(1.5, 2.5);
    let mut follower = following(position, &straight_path(1), old_goal);

    step(&mut follower, &mut position);
    step(&mut follower, &mut position);
    assert_eq!(position, old_goal);

    let mut actions = Vec::new();
    follower.start_follow(position, new_goal, &mut actions);

    let actions = step(&mut follower, &mut position);
    assert!(!actions.iter().any(|a| matches!(a, FollowAction::Complete { .. })));
    assert_eq!(follower.state(), FollowState::Requesting);
    assert_eq!(follower.target(), Some(new_goal));

    let mut actions = Vec::new();
    assert!(follower.on_path_delivered(true, &[v(1.5, 1.5), new_goal], position, &mut actions));
    assert!(!follower.is_retarget_pending());

    let mut completed = None;
    for _ in 0..10 {
        let actions = step(&mut follower, &mut position);
        if let Some(FollowAction::Complete { target }) = actions.last() {
            completed = Some(*target);
            break;
        }
    }
    assert_eq!(completed, Some(new_goal));
    assert_eq!(position, new_goal);
}

#[test]
fn test_stop_follow_is_safe_in_any_state() {
    let mut follower = PathFollower::default();
    follower.stop_follow();
    assert_eq!(follower.state(), FollowState::Idle);

    let mut follower = following(v(0.5, 0.5), &straight_path(3), v(3.5, 0.5));
    follower.stop_follow();
    assert_eq!(follower.state(), FollowState::Idle);
    assert!(follower.path().is_empty());
    assert_eq!(follower.target(), None);

    let mut actions = Vec::new();
    follower.tick(v(0.5, 0.5), dt(), &tuning(), &mut actions);
    assert!(actions.is_empty());
}
