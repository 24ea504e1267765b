//! Navigation grid: an immutable arena of nodes with a fixed 8-neighbour graph.
//!
//! The grid is the producer side of the pathfinding engine. Searches only read
//! it; per-agent reclassification goes through
//! [`NodeOverrides`](crate::nav::pathfinding::NodeOverrides) instead.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::nav::error::{NavError, NavResult};
use crate::nav::fixed_math::{FixedNum, FixedVec2};

mod generation;
mod map;
mod node;

#[cfg(test)]
mod tests;

pub use generation::random_grid;
pub use map::{load_map, save_map, NavMapData, MAP_VERSION};
pub use node::{Direction, Node, NodeId, NodeType};

#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavGrid {
    width: usize,
    height: usize,
    node_radius: FixedNum,
    /// Bottom-left corner of the grid in world space
    origin: FixedVec2,
    nodes: Vec<Node>,
}

impl NavGrid {
    /// Build a fully walkable grid of `width` x `height` nodes.
    pub fn new(width: usize, height: usize, node_radius: FixedNum, origin: FixedVec2) -> NavResult<Self> {
        if width == 0 || height == 0 || width * height > u32::MAX as usize {
            return Err(NavError::InvalidDimensions { width, height });
        }
        if node_radius <= FixedNum::ZERO {
            return Err(NavError::InvalidNodeRadius { radius: node_radius });
        }

        let mut grid = Self {
            width,
            height,
            node_radius,
            origin,
            nodes: Vec::with_capacity(width * height),
        };

        for y in 0..height {
            for x in 0..width {
                let id = NodeId((y * width + x) as u32);
                let world_position = grid.grid_to_world(x, y);
                grid.nodes.push(Node {
                    id,
                    x,
                    y,
                    world_position,
                    base_type: NodeType::Walkable,
                    neighbors: Default::default(),
                });
            }
        }

        grid.link_neighbors();
        Ok(grid)
    }

    /// Build a grid from an ASCII layout. The first row is the northern edge.
    ///
    /// `.` walkable, `#` obstacle, `S` start, `E` end.
    pub fn from_rows(rows: &[&str], node_radius: FixedNum, origin: FixedVec2) -> NavResult<Self> {
        let height = rows.len();
        if height == 0 {
            return Err(NavError::EmptyLayout);
        }
        let width = rows[0].chars().count();

        let mut grid = Self::new(width, height, node_radius, origin)?;

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(NavError::RaggedLayout { row, expected: width, found });
            }
            let y = height - 1 - row;
            for (x, glyph) in line.chars().enumerate() {
                let node_type = match glyph {
                    '.' => NodeType::Walkable,
                    '#' => NodeType::Obstacle,
                    'S' => NodeType::Start,
                    'E' => NodeType::End,
                    _ => return Err(NavError::UnknownCell { glyph, x, y }),
                };
                grid.nodes[y * width + x].base_type = node_type;
            }
        }

        Ok(grid)
    }

    /// Check the invariants [`NavGrid::new`] establishes. Used on grids that
    /// did not come from a constructor, such as a loaded map.
    pub fn validate(&self) -> NavResult<()> {
        let (width, height) = (self.width, self.height);
        let expected = width
            .checked_mul(height)
            .filter(|&n| n > 0 && n <= u32::MAX as usize)
            .ok_or(NavError::InvalidDimensions { width, height })?;
        if self.node_radius <= FixedNum::ZERO {
            return Err(NavError::InvalidNodeRadius { radius: self.node_radius });
        }
        if self.nodes.len() != expected {
            return Err(NavError::CorruptGrid(format!(
                "{} nodes for a {}x{} grid",
                self.nodes.len(),
                width,
                height
            )));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            if node.id.index() != idx || node.x >= width || node.y >= height || node.y * width + node.x != idx {
                return Err(NavError::CorruptGrid(format!(
                    "node {} has id {:?} at ({}, {})",
                    idx, node.id, node.x, node.y
                )));
            }
            for &(dir, neighbor) in &node.neighbors {
                let (dx, dy) = dir.offset();
                if self.node_at_signed(node.x as i32 + dx, node.y as i32 + dy) != Some(neighbor) {
                    return Err(NavError::CorruptGrid(format!(
                        "node {} lists {:?} as its {:?} neighbour",
                        idx, neighbor, dir
                    )));
                }
            }
        }
        Ok(())
    }

    /// Assign each node its in-bounds neighbours in `Direction::ALL` order.
    fn link_neighbors(&mut self) {
        for idx in 0..self.nodes.len() {
            let (x, y) = (self.nodes[idx].x as i32, self.nodes[idx].y as i32);
            let neighbors = Direction::ALL
                .iter()
                .filter_map(|&dir| {
                    let (dx, dy) = dir.offset();
                    self.node_at_signed(x + dx, y + dy).map(|id| (dir, id))
                })
                .collect();
            self.nodes[idx].neighbors = neighbors;
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn origin(&self) -> FixedVec2 {
        self.origin
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total node count; sizes the open list and per-search scratch tables.
    pub fn max_size(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_radius(&self) -> FixedNum {
        self.node_radius
    }

    pub fn node_diameter(&self) -> FixedNum {
        self.node_radius * FixedNum::from_num(2)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn neighbors(&self, id: NodeId) -> &[(Direction, NodeId)] {
        &self.nodes[id.index()].neighbors
    }

    pub fn node_at(&self, x: usize, y: usize) -> Option<NodeId> {
        if x < self.width && y < self.height {
            Some(NodeId((y * self.width + x) as u32))
        } else {
            None
        }
    }

    fn node_at_signed(&self, x: i32, y: i32) -> Option<NodeId> {
        if x < 0 || y < 0 {
            return None;
        }
        self.node_at(x as usize, y as usize)
    }

    /// Change a node's persistent classification. Adjacency is unaffected.
    pub fn set_base_type(&mut self, id: NodeId, node_type: NodeType) {
        self.nodes[id.index()].base_type = node_type;
    }

    pub fn set_obstacle(&mut self, x: usize, y: usize) {
        if let Some(id) = self.node_at(x, y) {
            self.set_base_type(id, NodeType::Obstacle);
        }
    }

    pub fn grid_to_world(&self, x: usize, y: usize) -> FixedVec2 {
        let diameter = self.node_diameter();
        self.origin
            + FixedVec2::new(
                FixedNum::from_num(x) * diameter + self.node_radius,
                FixedNum::from_num(y) * diameter + self.node_radius,
            )
    }

    /// Grid cell containing `world_pos`, or `None` outside the grid.
    pub fn world_to_grid(&self, world_pos: FixedVec2) -> Option<(usize, usize)> {
        if self.is_empty() {
            return None;
        }
        let local = world_pos - self.origin;
        if local.x < FixedNum::ZERO || local.y < FixedNum::ZERO {
            return None;
        }
        let diameter = self.node_diameter();
        let x = (local.x / diameter).to_num::<usize>();
        let y = (local.y / diameter).to_num::<usize>();
        (x < self.width && y < self.height).then_some((x, y))
    }

    /// Nearest node to `world_pos`, clamping positions outside the grid onto
    /// its border. `None` only for an empty grid.
    pub fn node_from_world_point(&self, world_pos: FixedVec2) -> Option<NodeId> {
        if self.is_empty() {
            return None;
        }
        let local = world_pos - self.origin;
        let diameter = self.node_diameter();
        let clamp_axis = |v: FixedNum, len: usize| -> usize {
            let cell = (v / diameter).floor().to_num::<i64>();
            cell.clamp(0, len as i64 - 1) as usize
        };
        let x = clamp_axis(local.x, self.width);
        let y = clamp_axis(local.y, self.height);
        self.node_at(x, y)
    }
}
