use bevy::prelude::*;
use fixedbitset::FixedBitSet;

use crate::nav::grid::{NavGrid, NodeId, NodeType};
use crate::nav::occupancy::OccupancyQuery;
use super::open_list::OpenList;
use super::overrides::NodeOverrides;
use super::types::{diagonal_distance, step_cost, FoundPath, RequesterId, SearchFailure, SearchRequest};

/// Per-search bookkeeping, indexed by node id.
///
/// Nodes themselves are never written during a search, so two searches with
/// their own scratch tables can run over the same grid independently.
#[derive(Clone, Debug, Default)]
pub struct SearchScratch {
    g: Vec<u32>,
    h: Vec<u32>,
    parent: Vec<Option<NodeId>>,
    closed: FixedBitSet,
    open: OpenList,
}

impl SearchScratch {
    pub fn new(max_size: usize) -> Self {
        let mut scratch = Self::default();
        scratch.reset(max_size);
        scratch
    }

    pub fn reset(&mut self, max_size: usize) {
        self.g.clear();
        self.g.resize(max_size, u32::MAX);
        self.h.clear();
        self.h.resize(max_size, 0);
        self.parent.clear();
        self.parent.resize(max_size, None);
        self.closed.clear();
        self.closed.grow(max_size);
        self.open.reset(max_size);
    }

    pub fn g(&self, node: NodeId) -> u32 {
        self.g[node.index()]
    }

    pub fn is_closed(&self, node: NodeId) -> bool {
        self.closed.contains(node.index())
    }
}

/// A* over a [`NavGrid`] with corner-cutting validation.
pub struct Pathfinder<'a, O: OccupancyQuery + ?Sized> {
    grid: &'a NavGrid,
    occupancy: &'a O,
    obstacle_mask: u32,
}

impl<'a, O: OccupancyQuery + ?Sized> Pathfinder<'a, O> {
    pub fn new(grid: &'a NavGrid, occupancy: &'a O, obstacle_mask: u32) -> Self {
        Self {
            grid,
            occupancy,
            obstacle_mask,
        }
    }

    /// Run one search to completion.
    ///
    /// Writes only `request.requester`'s overrides and the given scratch table.
    pub fn find_path(
        &self,
        request: &SearchRequest,
        overrides: &mut NodeOverrides,
        scratch: &mut SearchScratch,
    ) -> Result<FoundPath, SearchFailure> {
        let grid = self.grid;
        let requester = request.requester;

        let (Some(start), Some(end)) = (
            grid.node_from_world_point(request.start),
            grid.node_from_world_point(request.destination),
        ) else {
            warn!("[PATHFINDING] Search for {} on an empty grid", requester);
            return Err(SearchFailure::Unreachable);
        };

        overrides.begin_search(grid, requester, start, end, request.excluded)?;
        let overrides = &*overrides;

        scratch.reset(grid.max_size());
        let end_node = grid.node(end);
        let start_h = diagonal_distance(grid.node(start), end_node);
        scratch.g[start.index()] = 0;
        scratch.h[start.index()] = start_h;
        scratch.open.push_or_update(start, start_h, start_h);

        let mut expanded = 0usize;

        while let Some(current) = scratch.open.pop() {
            scratch.closed.insert(current.index());
            expanded += 1;

            if current == end {
                return Ok(self.retrace(scratch, start, end, expanded));
            }

            let current_g = scratch.g[current.index()];

            for &(direction, neighbor) in grid.neighbors(current) {
                if scratch.closed.contains(neighbor.index()) {
                    continue;
                }

                // Excluded nodes carry an Obstacle override for this requester
                if !overrides.effective_type(grid, requester, neighbor).is_passable() {
                    continue;
                }

                if direction.is_diagonal() && self.corner_blocked(overrides, requester, current, neighbor) {
                    scratch.closed.insert(neighbor.index());
                    continue;
                }

                let tentative_g = current_g.saturating_add(step_cost(direction));
                let idx = neighbor.index();

                if tentative_g < scratch.g[idx] || !scratch.open.contains(neighbor) {
                    let h = diagonal_distance(grid.node(neighbor), end_node);
                    scratch.g[idx] = tentative_g;
                    scratch.h[idx] = h;
                    scratch.parent[idx] = Some(current);
                    scratch.open.push_or_update(neighbor, tentative_g.saturating_add(h), h);
                }
            }
        }

        debug!(
            "[PATHFINDING] {} exhausted the open list after {} expansions",
            requester, expanded
        );
        Err(SearchFailure::Unreachable)
    }

    /// Whether a diagonal step from `from` to `to` squeezes past a corner the
    /// agent cannot physically fit through.
    ///
    /// Only consulted when one of the two shared corner nodes is not
    /// `Walkable` for this requester; the midpoint is then probed with a box
    /// of one node radius.
    fn corner_blocked(&self, overrides: &NodeOverrides, requester: RequesterId, from: NodeId, to: NodeId) -> bool {
        let grid = self.grid;
        let (a, b) = (grid.node(from), grid.node(to));

        let corners = [grid.node_at(b.x, a.y), grid.node_at(a.x, b.y)];
        let corners_clear = corners.iter().flatten().all(|&corner| {
            overrides.effective_type(grid, requester, corner) == NodeType::Walkable
        });
        if corners_clear {
            return false;
        }

        let midpoint = a.world_position.midpoint(b.world_position);
        self.occupancy
            .is_obstructed(midpoint, grid.node_radius(), self.obstacle_mask)
    }

    fn retrace(&self, scratch: &SearchScratch, start: NodeId, end: NodeId, expanded: usize) -> FoundPath {
        let mut nodes = Vec::new();
        let mut current = end;

        while current != start {
            nodes.push(current);
            match scratch.parent[current.index()] {
                Some(prev) => current = prev,
                None => break,
            }
        }
        nodes.reverse();

        let waypoints = nodes
            .iter()
            .map(|&id| self.grid.node(id).world_position)
            .collect();

        FoundPath {
            waypoints,
            nodes,
            cost: scratch.g[end.index()],
            expanded,
        }
    }
}
