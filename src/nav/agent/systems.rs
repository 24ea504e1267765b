use bevy::prelude::*;

use crate::nav::config::NavConfig;
use crate::nav::fixed_math::FixedVec2;
use crate::nav::grid::NavGrid;
use crate::nav::occupancy::StaticColliders;
use crate::nav::pathfinding::{PathCoordinator, PathDelivered, RequesterId};
use super::components::{AgentPosition, Facing, PendingMove};
use super::events::{FollowCompleted, StartFollow, StopFollow};
use super::follower::{FollowAction, FollowTuning, PathFollower};

fn submit_request(
    coordinator: &mut PathCoordinator,
    grid: &NavGrid,
    entity: Entity,
    start: FixedVec2,
    target: FixedVec2,
    exclude_waypoint: Option<FixedVec2>,
) {
    let excluded = exclude_waypoint.and_then(|waypoint| grid.node_from_world_point(waypoint));
    coordinator.request_path(RequesterId::from(entity), start, target, excluded);
}

fn release_requester(coordinator: &mut PathCoordinator, entity: Entity) {
    let requester = RequesterId::from(entity);
    coordinator.cancel(requester);
    coordinator.initialize(requester);
}

/// Apply stop commands, then start commands, in message order.
pub(super) fn process_follow_commands(
    mut stops: MessageReader<StopFollow>,
    mut starts: MessageReader<StartFollow>,
    mut followers: Query<(&mut PathFollower, &AgentPosition)>,
    mut coordinator: ResMut<PathCoordinator>,
    grid: Res<NavGrid>,
    mut actions: Local<Vec<FollowAction>>,
) {
    for stop in stops.read() {
        let Ok((mut follower, _)) = followers.get_mut(stop.entity) else {
            warn!("[FOLLOW] StopFollow for {:?} which has no PathFollower", stop.entity);
            continue;
        };
        follower.stop_follow();
        release_requester(&mut coordinator, stop.entity);
    }

    for start in starts.read() {
        let Ok((mut follower, position)) = followers.get_mut(start.entity) else {
            warn!("[FOLLOW] StartFollow for {:?} which has no PathFollower", start.entity);
            continue;
        };

        // A fresh goal must not inherit exclusions made for the previous one
        coordinator.initialize(RequesterId::from(start.entity));
        follower.start_follow(position.0, start.target, &mut actions);

        for action in actions.drain(..) {
            if let FollowAction::RequestPath { start: from, target, exclude_waypoint } = action {
                submit_request(&mut coordinator, &grid, start.entity, from, target, exclude_waypoint);
            }
        }
    }
}

/// Cancel searches and drop overrides of followers that were removed or despawned.
pub(super) fn release_removed_followers(
    mut removed: RemovedComponents<PathFollower>,
    mut coordinator: ResMut<PathCoordinator>,
) {
    for entity in removed.read() {
        release_requester(&mut coordinator, entity);
    }
}

pub(super) fn receive_path_results(
    mut delivered: MessageReader<PathDelivered>,
    mut followers: Query<(&mut PathFollower, &AgentPosition, &mut Facing)>,
    mut actions: Local<Vec<FollowAction>>,
) {
    for delivery in delivered.read() {
        let Ok((mut follower, position, mut facing)) = followers.get_mut(delivery.requester) else {
            continue;
        };

        let applied = follower.on_path_delivered(delivery.success, &delivery.waypoints, position.0, &mut actions);

        if !delivery.success {
            if let Some(failure) = delivery.failure {
                warn!("[FOLLOW] No path for {:?}: {}", delivery.requester, failure);
            }
        } else if applied {
            debug!(
                "[FOLLOW] {:?} got {} waypoints (ticket {:?})",
                delivery.requester,
                delivery.waypoints.len(),
                delivery.ticket
            );
        }

        for action in actions.drain(..) {
            if let FollowAction::Rotate(toward) = action {
                facing.0 = toward.normalize();
            }
        }
    }
}

pub(super) fn tick_followers(
    mut followers: Query<(Entity, &mut PathFollower, &AgentPosition, &mut Facing, &mut PendingMove)>,
    mut coordinator: ResMut<PathCoordinator>,
    mut completed: MessageWriter<FollowCompleted>,
    grid: Res<NavGrid>,
    config: Res<NavConfig>,
    mut actions: Local<Vec<FollowAction>>,
) {
    let tuning = FollowTuning::from(&*config);

    for (entity, mut follower, position, mut facing, mut pending) in followers.iter_mut() {
        follower.tick(position.0, config.tick_delta, &tuning, &mut actions);

        for action in actions.drain(..) {
            match action {
                FollowAction::RequestPath { start, target, exclude_waypoint } => {
                    submit_request(&mut coordinator, &grid, entity, start, target, exclude_waypoint);
                }
                FollowAction::Move(displacement) => pending.0 = displacement,
                FollowAction::Rotate(toward) => facing.0 = toward.normalize(),
                FollowAction::Complete { target } => {
                    release_requester(&mut coordinator, entity);
                    completed.write(FollowCompleted { entity, target });
                    debug!("[FOLLOW] {:?} reached {:?}", entity, target);
                }
            }
        }
    }
}

/// Movement collaborator: apply each pending displacement unless it would
/// push the agent into a static obstacle.
pub fn apply_agent_movement(
    mut agents: Query<(&mut AgentPosition, &mut PendingMove)>,
    colliders: Res<StaticColliders>,
    config: Res<NavConfig>,
) {
    for (mut position, mut pending) in agents.iter_mut() {
        if pending.0 == FixedVec2::ZERO {
            continue;
        }

        let next = position.0 + pending.0;
        if !colliders.overlaps_circle(next, config.agent_radius, config.obstacle_layer_mask) {
            position.0 = next;
        }
        pending.0 = FixedVec2::ZERO;
    }
}
