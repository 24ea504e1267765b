//! Physical occupancy queries.
//!
//! The grid is coarse; an agent's footprint may still fit through a corner
//! the grid calls blocked. The search engine asks an [`OccupancyQuery`]
//! before rejecting such a diagonal step.

use bevy::prelude::*;

use crate::nav::fixed_math::{FixedNum, FixedVec2};
use crate::nav::grid::{NavGrid, NodeType};

/// Collision layers for filtering
pub mod layers {
    pub const NONE: u32 = 0;
    pub const AGENT: u32 = 1 << 0;
    pub const OBSTACLE: u32 = 1 << 1;
    pub const ALL: u32 = u32::MAX;
}

pub trait OccupancyQuery {
    /// Whether an axis-aligned box centered at `center` with half-size
    /// `half_extent` overlaps anything on `layer_mask`.
    fn is_obstructed(&self, center: FixedVec2, half_extent: FixedNum, layer_mask: u32) -> bool;
}

impl<F> OccupancyQuery for F
where
    F: Fn(FixedVec2, FixedNum, u32) -> bool,
{
    fn is_obstructed(&self, center: FixedVec2, half_extent: FixedNum, layer_mask: u32) -> bool {
        self(center, half_extent, layer_mask)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CircleCollider {
    pub position: FixedVec2,
    pub radius: FixedNum,
    pub layer: u32,
}

/// Static world geometry the occupancy queries run against.
#[derive(Resource, Debug, Clone, Default)]
pub struct StaticColliders {
    colliders: Vec<CircleCollider>,
}

impl StaticColliders {
    pub fn new(colliders: Vec<CircleCollider>) -> Self {
        Self { colliders }
    }

    /// One obstacle collider centered on every base-obstacle node.
    pub fn from_grid_obstacles(grid: &NavGrid, radius: FixedNum) -> Self {
        let colliders = grid
            .nodes()
            .iter()
            .filter(|node| node.base_type == NodeType::Obstacle)
            .map(|node| CircleCollider {
                position: node.world_position,
                radius,
                layer: layers::OBSTACLE,
            })
            .collect();
        Self { colliders }
    }

    pub fn push(&mut self, collider: CircleCollider) {
        self.colliders.push(collider);
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Whether a circle of `radius` at `center` overlaps any collider on `layer_mask`.
    pub fn overlaps_circle(&self, center: FixedVec2, radius: FixedNum, layer_mask: u32) -> bool {
        self.colliders.iter().any(|c| {
            if c.layer & layer_mask == 0 {
                return false;
            }
            let reach = c.radius + radius;
            (c.position - center).length_squared() < reach * reach
        })
    }
}

impl OccupancyQuery for StaticColliders {
    fn is_obstructed(&self, center: FixedVec2, half_extent: FixedNum, layer_mask: u32) -> bool {
        self.colliders.iter().any(|c| {
            if c.layer & layer_mask == 0 {
                return false;
            }
            // Closest point on the box to the circle center
            let closest = FixedVec2::new(
                c.position.x.clamp(center.x - half_extent, center.x + half_extent),
                c.position.y.clamp(center.y - half_extent, center.y + half_extent),
            );
            (c.position - closest).length_squared() < c.radius * c.radius
        })
    }
}
