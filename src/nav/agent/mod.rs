//! Agents that walk the paths the coordinator delivers.
//!
//! - **events**: `StartFollow` / `StopFollow` in, `FollowCompleted` out
//! - **components**: position, facing and the pending move of an agent
//! - **follower**: the per-agent state machine
//! - **systems**: glue between followers, the coordinator and the world

pub mod components;
pub mod events;
pub mod follower;
mod systems;

#[cfg(test)]
mod tests;

pub use components::{agent_bundle, AgentPosition, Facing, PendingMove};
pub use events::{FollowCompleted, StartFollow, StopFollow};
pub use follower::{FollowAction, FollowState, FollowTuning, PathFollower};
pub use systems::apply_agent_movement;

use bevy::prelude::*;
use crate::nav::simulation::NavSet;

pub struct AgentPlugin;

impl Plugin for AgentPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<StartFollow>();
        app.add_message::<StopFollow>();
        app.add_message::<FollowCompleted>();

        app.add_systems(
            FixedUpdate,
            (systems::release_removed_followers, systems::process_follow_commands)
                .chain()
                .in_set(NavSet::Commands),
        );
        app.add_systems(
            FixedUpdate,
            (systems::receive_path_results, systems::tick_followers)
                .chain()
                .in_set(NavSet::Follow),
        );
        app.add_systems(FixedUpdate, apply_agent_movement.in_set(NavSet::Movement));
    }
}
