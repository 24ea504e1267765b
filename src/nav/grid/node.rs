use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::nav::fixed_math::FixedVec2;

/// Dense arena index of a node inside its [`NavGrid`](super::NavGrid).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Walkability classification of a node.
///
/// Only `Obstacle` blocks a search. `Start` and `End` are passable marks, but
/// they are not `Walkable`, which matters for corner-cutting validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    #[default]
    Walkable,
    Obstacle,
    End,
    Start,
}

impl NodeType {
    #[inline]
    pub fn is_passable(self) -> bool {
        self != NodeType::Obstacle
    }
}

/// The eight grid directions (cardinal + diagonal).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North = 0,
    South = 1,
    East = 2,
    West = 3,
    NorthEast = 4,
    NorthWest = 5,
    SouthEast = 6,
    SouthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    /// Grid offset `(dx, dy)`; +y is north.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, 1),
            Direction::NorthWest => (-1, 1),
            Direction::SouthEast => (1, -1),
            Direction::SouthWest => (-1, -1),
        }
    }

    #[inline]
    pub fn is_diagonal(self) -> bool {
        self as u8 >= Direction::NorthEast as u8
    }
}

/// A cell of the navigation grid.
///
/// Position and adjacency are fixed at build time. Search bookkeeping
/// (costs, predecessor, open/closed) lives in a per-search scratch table,
/// never on the node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub x: usize,
    pub y: usize,
    pub world_position: FixedVec2,
    pub base_type: NodeType,
    pub neighbors: SmallVec<[(Direction, NodeId); 8]>,
}
