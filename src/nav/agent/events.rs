//! Commands into and notifications out of the follow layer.

use bevy::prelude::*;
use crate::nav::fixed_math::FixedVec2;

/// Start (or retarget) following a path to `target`.
#[derive(Message, Debug, Clone)]
pub struct StartFollow {
    pub entity: Entity,
    pub target: FixedVec2,
}

/// Abandon the current goal. Safe in any state.
#[derive(Message, Debug, Clone)]
pub struct StopFollow {
    pub entity: Entity,
}

/// The agent consumed its last waypoint.
#[derive(Message, Debug, Clone)]
pub struct FollowCompleted {
    pub entity: Entity,
    pub target: FixedVec2,
}
