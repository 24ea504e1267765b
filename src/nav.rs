use bevy::prelude::*;

pub mod agent;
pub mod config;
pub mod error;
pub mod fixed_math;
pub mod grid;
pub mod occupancy;
pub mod pathfinding;
pub mod simulation;

use agent::AgentPlugin;
use config::NavConfigPlugin;
use grid::NavGrid;
use occupancy::StaticColliders;
use pathfinding::PathfindingPlugin;
use simulation::SimulationPlugin;

/// Grid navigation: path search, request coordination and path following.
///
/// Insert a [`NavGrid`] and [`StaticColliders`] before or after adding the
/// plugin; empty defaults are used until then.
pub struct NavPlugin;

impl Plugin for NavPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavGrid>()
            .init_resource::<StaticColliders>()
            .add_plugins((
                NavConfigPlugin,
                SimulationPlugin,
                PathfindingPlugin,
                AgentPlugin,
            ));
    }
}
