use std::fmt;

use bevy::prelude::*;
use thiserror::Error;

use crate::nav::fixed_math::FixedVec2;
use crate::nav::grid::{Direction, Node, NodeId};

/// Cost of an axis-aligned step.
pub const AXIS_STEP_COST: u32 = 10;

/// Cost of a diagonal step (integer approximation of 10 * sqrt(2)).
pub const DIAGONAL_STEP_COST: u32 = 14;

/// Identity of whoever asked for a path.
///
/// Overrides and in-flight requests are keyed by it. Entities convert
/// losslessly through their full bit pattern (index + generation).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequesterId(pub u64);

impl From<Entity> for RequesterId {
    fn from(entity: Entity) -> Self {
        RequesterId(entity.to_bits())
    }
}

impl From<RequesterId> for Entity {
    fn from(id: RequesterId) -> Self {
        Entity::from_bits(id.0)
    }
}

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "requester#{}", self.0)
    }
}

/// Monotonic id of an accepted path request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTicket(pub u64);

#[inline]
pub fn step_cost(direction: Direction) -> u32 {
    if direction.is_diagonal() {
        DIAGONAL_STEP_COST
    } else {
        AXIS_STEP_COST
    }
}

/// Octile distance between two nodes in grid units.
pub fn diagonal_distance(a: &Node, b: &Node) -> u32 {
    let dx = a.x.abs_diff(b.x) as u32;
    let dy = a.y.abs_diff(b.y) as u32;
    let (short, long) = if dx < dy { (dx, dy) } else { (dy, dx) };
    DIAGONAL_STEP_COST * short + AXIS_STEP_COST * (long - short)
}

/// One search job: where from, where to, and an optional node to avoid.
#[derive(Clone, Debug)]
pub struct SearchRequest {
    pub requester: RequesterId,
    pub start: FixedVec2,
    pub destination: FixedVec2,
    pub excluded: Option<NodeId>,
}

/// A successful search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FoundPath {
    /// World positions from the first step after the start node up to and
    /// including the destination. Empty when start and destination coincide.
    pub waypoints: Vec<FixedVec2>,
    /// Grid nodes matching `waypoints`.
    pub nodes: Vec<NodeId>,
    /// Accumulated `G` of the destination.
    pub cost: u32,
    /// Number of nodes popped from the open list.
    pub expanded: usize,
}

/// Why a search produced no path. These are ordinary outcomes, reported to
/// the requester rather than raised.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchFailure {
    #[error("destination unreachable")]
    Unreachable,
    #[error("destination is an obstacle")]
    DestinationBlocked,
}

/// Completion notice for a path request: the callback channel back to the requester.
///
/// Written exactly once per accepted request that was not superseded.
#[derive(Message, Debug, Clone)]
pub struct PathDelivered {
    pub requester: Entity,
    pub ticket: RequestTicket,
    pub waypoints: Vec<FixedVec2>,
    pub success: bool,
    pub failure: Option<SearchFailure>,
}
