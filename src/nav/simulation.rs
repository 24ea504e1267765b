//! Fixed-step scheduling for the navigation systems.
//!
//! Each `FixedUpdate` runs the sets in this order:
//! - **Commands**: start/stop follow requests
//! - **Delivery**: publish last tick's search results
//! - **Follow**: apply delivered paths, then advance every follower
//! - **Movement**: apply pending moves to agent positions
//! - **Search**: run queued searches (results surface next tick)

use bevy::prelude::*;

/// Number of fixed ticks run so far.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum NavSet {
    Commands,
    Delivery,
    Follow,
    Movement,
    Search,
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimTick>();

        app.configure_sets(
            FixedUpdate,
            (
                NavSet::Commands,
                NavSet::Delivery,
                NavSet::Follow,
                NavSet::Movement,
                NavSet::Search,
            )
                .chain(),
        );

        app.add_systems(FixedUpdate, increment_sim_tick.before(NavSet::Commands));
    }
}

pub fn increment_sim_tick(mut tick: ResMut<SimTick>) {
    tick.increment();
}
