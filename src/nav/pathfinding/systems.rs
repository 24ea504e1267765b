use bevy::prelude::*;

use crate::nav::config::NavConfig;
use crate::nav::grid::NavGrid;
use crate::nav::occupancy::StaticColliders;
use crate::nav::simulation::SimTick;
use crate::profile_log;
use super::coordinator::PathCoordinator;
use super::types::PathDelivered;

pub(super) fn process_path_requests(
    mut coordinator: ResMut<PathCoordinator>,
    grid: Res<NavGrid>,
    colliders: Res<StaticColliders>,
    config: Res<NavConfig>,
    #[allow(unused_variables)] tick: Res<SimTick>,
) {
    let pending = coordinator.pending_count();
    if pending == 0 {
        return;
    }

    if grid.is_empty() {
        warn!("[PATHFINDING] {} requests pending but the grid is empty", pending);
    }

    let start_time = std::time::Instant::now();

    let ran = coordinator.run_searches(
        &grid,
        &*colliders,
        config.obstacle_layer_mask,
        config.max_searches_per_tick,
    );

    let duration = start_time.elapsed();
    if duration.as_millis() > 50 {
        warn!(
            "[PATHFINDING] Slow search batch: {:?} for {} searches ({} still queued)",
            duration,
            ran,
            coordinator.pending_count()
        );
    }

    profile_log!(
        tick,
        "[PATHFINDING] tick {}: {} searches in {:?}, stats {:?}",
        tick.0,
        ran,
        duration,
        coordinator.stats()
    );
}

pub(super) fn deliver_path_results(
    mut coordinator: ResMut<PathCoordinator>,
    mut delivered: MessageWriter<PathDelivered>,
) {
    for delivery in coordinator.take_deliveries() {
        let (waypoints, failure) = match delivery.result {
            Ok(path) => (path.waypoints, None),
            Err(failure) => (Vec::new(), Some(failure)),
        };

        delivered.write(PathDelivered {
            requester: Entity::from(delivery.requester),
            ticket: delivery.ticket,
            waypoints,
            success: failure.is_none(),
            failure,
        });
    }
}
