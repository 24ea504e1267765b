//! Requester-scoped node classification.
//!
//! A requester may reclassify a node for its own searches without other
//! requesters seeing it: `effective(node, r) = override(r, node) ?? base(node)`.
//! Every override a requester places is remembered so [`NodeOverrides::clear_requester`]
//! can restore base classification in one call.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::nav::grid::{NavGrid, NodeId, NodeType};
use super::types::{RequesterId, SearchFailure};

#[derive(Debug, Default, Clone)]
struct RequesterMarks {
    start: Option<NodeId>,
    end: Option<NodeId>,
    excluded: SmallVec<[NodeId; 4]>,
}

#[derive(Debug, Default, Clone)]
pub struct NodeOverrides {
    table: BTreeMap<(RequesterId, NodeId), NodeType>,
    marks: BTreeMap<RequesterId, RequesterMarks>,
}

impl NodeOverrides {
    pub fn get(&self, requester: RequesterId, node: NodeId) -> Option<NodeType> {
        self.table.get(&(requester, node)).copied()
    }

    #[inline]
    pub fn effective_type(&self, grid: &NavGrid, requester: RequesterId, node: NodeId) -> NodeType {
        self.get(requester, node).unwrap_or(grid.node(node).base_type)
    }

    /// Exclude `node` from every search `requester` runs until it is cleared.
    pub fn exclude(&mut self, requester: RequesterId, node: NodeId) {
        let marks = self.marks.entry(requester).or_default();
        if !marks.excluded.contains(&node) {
            marks.excluded.push(node);
        }
        self.table.insert((requester, node), NodeType::Obstacle);
    }

    pub fn is_excluded(&self, requester: RequesterId, node: NodeId) -> bool {
        self.marks
            .get(&requester)
            .is_some_and(|marks| marks.excluded.contains(&node))
    }

    pub fn excluded(&self, requester: RequesterId) -> &[NodeId] {
        self.marks
            .get(&requester)
            .map(|marks| marks.excluded.as_slice())
            .unwrap_or(&[])
    }

    /// Prepare `requester`'s overrides for a new search.
    ///
    /// Drops the previous search's Start/End marks (never an exclusion on
    /// the same node), records `excluded`, then marks the new endpoints.
    /// Fails without marking anything when the destination is an obstacle
    /// for this requester.
    pub fn begin_search(
        &mut self,
        grid: &NavGrid,
        requester: RequesterId,
        start: NodeId,
        end: NodeId,
        excluded: Option<NodeId>,
    ) -> Result<(), SearchFailure> {
        self.reset_endpoint_marks(requester);

        if let Some(node) = excluded {
            self.exclude(requester, node);
        }

        if !self.effective_type(grid, requester, end).is_passable() {
            return Err(SearchFailure::DestinationBlocked);
        }

        self.table.insert((requester, end), NodeType::End);
        let marks = self.marks.entry(requester).or_default();
        marks.end = Some(end);

        if start != end && !self.table.contains_key(&(requester, start)) {
            self.table.insert((requester, start), NodeType::Start);
            if let Some(marks) = self.marks.get_mut(&requester) {
                marks.start = Some(start);
            }
        }

        Ok(())
    }

    fn reset_endpoint_marks(&mut self, requester: RequesterId) {
        let Some(marks) = self.marks.get_mut(&requester) else {
            return;
        };

        for (node, mark) in [(marks.start.take(), NodeType::Start), (marks.end.take(), NodeType::End)] {
            if let Some(node) = node {
                if self.table.get(&(requester, node)) == Some(&mark) {
                    self.table.remove(&(requester, node));
                }
            }
        }
    }

    /// Restore base classification for every node `requester` touched.
    ///
    /// Returns the number of overrides removed.
    pub fn clear_requester(&mut self, requester: RequesterId) -> usize {
        self.marks.remove(&requester);
        let before = self.table.len();
        self.table.retain(|(owner, _), _| *owner != requester);
        before - self.table.len()
    }

    pub fn override_count(&self, requester: RequesterId) -> usize {
        self.table.keys().filter(|(owner, _)| *owner == requester).count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
