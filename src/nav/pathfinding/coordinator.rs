use std::collections::VecDeque;

use bevy::prelude::*;
use rustc_hash::FxHashMap;

use crate::nav::fixed_math::FixedVec2;
use crate::nav::grid::{NavGrid, NodeId};
use crate::nav::occupancy::OccupancyQuery;
use super::astar::{Pathfinder, SearchScratch};
use super::overrides::NodeOverrides;
use super::types::{FoundPath, RequestTicket, RequesterId, SearchFailure, SearchRequest};

#[derive(Clone, Debug)]
struct QueuedRequest {
    ticket: RequestTicket,
    request: SearchRequest,
}

/// A finished search waiting for the next delivery pass.
#[derive(Clone, Debug)]
pub struct PathDelivery {
    pub requester: RequesterId,
    pub ticket: RequestTicket,
    pub result: Result<FoundPath, SearchFailure>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub searches: u64,
    pub failures: u64,
    /// Queued requests replaced by a newer one before they ran.
    pub superseded: u64,
    /// Computed results dropped because the requester moved on.
    pub discarded: u64,
    pub expanded_nodes: u64,
}

/// Owns every in-flight path request.
///
/// Requests are queued, computed by [`PathCoordinator::run_searches`] and
/// handed out by [`PathCoordinator::take_deliveries`] on a later pass. Only
/// the latest ticket per requester is ever delivered.
#[derive(Resource, Default)]
pub struct PathCoordinator {
    overrides: NodeOverrides,
    queue: VecDeque<QueuedRequest>,
    latest: FxHashMap<RequesterId, RequestTicket>,
    completed: Vec<PathDelivery>,
    scratch: SearchScratch,
    next_ticket: u64,
    stats: SearchStats,
}

impl PathCoordinator {
    /// Accept a new request, superseding anything `requester` still has in flight.
    pub fn request_path(
        &mut self,
        requester: RequesterId,
        start: FixedVec2,
        destination: FixedVec2,
        excluded: Option<NodeId>,
    ) -> RequestTicket {
        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;

        let before = self.queue.len();
        self.queue.retain(|queued| queued.request.requester != requester);
        self.stats.superseded += (before - self.queue.len()) as u64;

        self.latest.insert(requester, ticket);
        self.queue.push_back(QueuedRequest {
            ticket,
            request: SearchRequest {
                requester,
                start,
                destination,
                excluded,
            },
        });

        ticket
    }

    /// Drop any in-flight request of `requester`; nothing will be delivered for it.
    pub fn cancel(&mut self, requester: RequesterId) {
        if self.latest.remove(&requester).is_none() {
            return;
        }
        let before = self.queue.len();
        self.queue.retain(|queued| queued.request.requester != requester);
        self.stats.superseded += (before - self.queue.len()) as u64;
        debug!("[PATHFINDING] Cancelled in-flight request of {}", requester);
    }

    /// Restore base classification for every node `requester` overrode.
    pub fn initialize(&mut self, requester: RequesterId) {
        let cleared = self.overrides.clear_requester(requester);
        if cleared > 0 {
            trace!("[PATHFINDING] Cleared {} overrides of {}", cleared, requester);
        }
    }

    pub fn is_in_flight(&self, requester: RequesterId) -> bool {
        self.latest.contains_key(&requester)
    }

    /// Requests queued but not yet searched.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn overrides(&self) -> &NodeOverrides {
        &self.overrides
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Run up to `budget` queued searches (0 means no limit).
    ///
    /// Returns the number of searches run.
    pub fn run_searches<O: OccupancyQuery + ?Sized>(
        &mut self,
        grid: &NavGrid,
        occupancy: &O,
        obstacle_mask: u32,
        budget: usize,
    ) -> usize {
        if self.queue.is_empty() {
            return 0;
        }

        let pathfinder = Pathfinder::new(grid, occupancy, obstacle_mask);
        let limit = if budget == 0 { usize::MAX } else { budget };
        let mut ran = 0;

        while ran < limit {
            let Some(QueuedRequest { ticket, request }) = self.queue.pop_front() else {
                break;
            };

            let result = pathfinder.find_path(&request, &mut self.overrides, &mut self.scratch);
            ran += 1;
            self.stats.searches += 1;

            match &result {
                Ok(path) => self.stats.expanded_nodes += path.expanded as u64,
                Err(failure) => {
                    self.stats.failures += 1;
                    debug!("[PATHFINDING] Search for {} failed: {}", request.requester, failure);
                }
            }

            self.completed.push(PathDelivery {
                requester: request.requester,
                ticket,
                result,
            });
        }

        ran
    }

    /// Hand out every computed result whose ticket is still the requester's latest.
    pub fn take_deliveries(&mut self) -> Vec<PathDelivery> {
        let mut deliveries = Vec::with_capacity(self.completed.len());

        for delivery in self.completed.drain(..) {
            if self.latest.get(&delivery.requester) == Some(&delivery.ticket) {
                self.latest.remove(&delivery.requester);
                deliveries.push(delivery);
            } else {
                self.stats.discarded += 1;
            }
        }

        deliveries
    }
}
