use bevy::prelude::*;

use crate::nav::fixed_math::FixedVec2;
use super::follower::PathFollower;

/// World position of an agent.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct AgentPosition(pub FixedVec2);

/// Direction the agent is turned toward, relative to its position.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Facing(pub FixedVec2);

/// Displacement requested by the follower this tick, consumed by the movement pass.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct PendingMove(pub FixedVec2);

/// Everything an entity needs to be driven along paths.
pub fn agent_bundle(position: FixedVec2) -> impl Bundle {
    (
        PathFollower::default(),
        AgentPosition(position),
        Facing::default(),
        PendingMove::default(),
    )
}
