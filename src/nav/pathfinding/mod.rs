//! Grid A* with requester-scoped node overrides.
//!
//! - **types**: ids, costs, requests and results
//! - **overrides**: per-requester node classification
//! - **open_list**: indexed min-heap ordered by `(F, H, node)`
//! - **astar**: the search engine
//! - **coordinator**: request queue, supersession and delivery

mod astar;
mod coordinator;
mod open_list;
mod overrides;
mod systems;
mod types;


pub use astar::{Pathfinder, SearchScratch};
pub use coordinator::{PathCoordinator, PathDelivery, SearchStats};
pub use open_list::OpenList;
pub use overrides::NodeOverrides;
pub use types::{
    diagonal_distance, step_cost, FoundPath, PathDelivered, RequestTicket, RequesterId, SearchFailure,
    SearchRequest, AXIS_STEP_COST, DIAGONAL_STEP_COST,
};

use bevy::prelude::*;
use crate::nav::simulation::NavSet;

pub struct PathfindingPlugin;

impl Plugin for PathfindingPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<PathDelivered>();
        app.init_resource::<PathCoordinator>();
        app.add_systems(FixedUpdate, systems::deliver_path_results.in_set(NavSet::Delivery));
        app.add_systems(FixedUpdate, systems::process_path_requests.in_set(NavSet::Search));
    }
}
