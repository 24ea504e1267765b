use bevy::prelude::*;

use crate::nav::config::NavConfig;
use crate::nav::fixed_math::{FixedNum, FixedVec2};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FollowState {
    #[default]
    Idle,
    /// Waiting for the first path to a new target.
    Requesting,
    Following,
    /// Reached the target this tick; back to `Idle` on the next.
    Completed,
}

/// Movement and stall parameters, taken from [`NavConfig`].
#[derive(Clone, Copy, Debug)]
pub struct FollowTuning {
    pub speed: FixedNum,
    pub stall_check_interval: FixedNum,
    pub stall_tolerance: FixedNum,
    pub arrival_tolerance: FixedNum,
}

impl From<&NavConfig> for FollowTuning {
    fn from(config: &NavConfig) -> Self {
        Self {
            speed: config.follow_speed,
            stall_check_interval: config.stall_check_interval,
            stall_tolerance: config.stall_tolerance,
            arrival_tolerance: config.arrival_tolerance,
        }
    }
}

/// What the follower wants done. Systems apply these against the world.
#[derive(Clone, Debug, PartialEq)]
pub enum FollowAction {
    RequestPath {
        start: FixedVec2,
        target: FixedVec2,
        /// Waypoint whose node the new path must avoid.
        exclude_waypoint: Option<FixedVec2>,
    },
    Move(FixedVec2),
    /// Turn toward a position relative to the agent.
    Rotate(FixedVec2),
    Complete { target: FixedVec2 },
}

/// Waypoint-following state machine for one agent.
///
/// Pure: it never touches the world. Each entry point pushes the resulting
/// [`FollowAction`]s onto a caller-supplied buffer.
#[derive(Component, Clone, Debug, Default)]
pub struct PathFollower {
    state: FollowState,
    target: Option<FixedVec2>,
    /// Target the current path was planned for. Differs from `target` while a
    /// retarget is in flight.
    path_target: Option<FixedVec2>,
    path: Vec<FixedVec2>,
    waypoint_index: usize,
    /// Expected position after the last emitted Move, and the waypoint index
    /// reached there. Committed only once the agent is seen at that position.
    projected: Option<(FixedVec2, usize)>,
    /// A newer path was requested while the current one is still being followed.
    replan_pending: bool,
    stall_timer: FixedNum,
    travelled: FixedNum,
    /// Position seen on the previous tick; `None` until the first tick of following.
    last_position: Option<FixedVec2>,
    replans: u32,
}

impl PathFollower {
    pub fn state(&self) -> FollowState {
        self.state
    }

    pub fn target(&self) -> Option<FixedVec2> {
        self.target
    }

    pub fn path(&self) -> &[FixedVec2] {
        &self.path
    }

    pub fn waypoint_index(&self) -> usize {
        self.waypoint_index
    }

    pub fn current_waypoint(&self) -> Option<FixedVec2> {
        self.path.get(self.waypoint_index).copied()
    }

    pub fn is_replan_pending(&self) -> bool {
        self.replan_pending
    }

    /// Still walking a path planned for an earlier target.
    pub fn is_retarget_pending(&self) -> bool {
        self.state == FollowState::Following && self.path_target != self.target
    }

    /// Stall-triggered replans since the follower was created.
    pub fn replans(&self) -> u32 {
        self.replans
    }

    /// Request a path from `position` to `target`, replacing any previous target.
    ///
    /// An agent already following keeps walking its old path until the new
    /// one arrives. If the old path runs out first it waits in `Requesting`.
    pub fn start_follow(&mut self, position: FixedVec2, target: FixedVec2, actions: &mut Vec<FollowAction>) {
        self.target = Some(target);

        if self.state == FollowState::Following {
            self.replan_pending = true;
        } else {
            self.state = FollowState::Requesting;
            self.path_target = None;
            self.clear_path();
        }

        actions.push(FollowAction::RequestPath {
            start: position,
            target,
            exclude_waypoint: None,
        });
    }

    /// Drop the target and path. The caller owns cancelling the search and
    /// clearing the requester's overrides.
    pub fn stop_follow(&mut self) {
        self.state = FollowState::Idle;
        self.target = None;
        self.path_target = None;
        self.clear_path();
        self.replan_pending = false;
        self.stall_timer = FixedNum::ZERO;
        self.travelled = FixedNum::ZERO;
        self.last_position = None;
    }

    /// Accept a search result. Returns whether it was applied.
    ///
    /// A failed search changes nothing; neither does a result for a follower
    /// that is no longer after a target.
    pub fn on_path_delivered(
        &mut self,
        success: bool,
        waypoints: &[FixedVec2],
        position: FixedVec2,
        actions: &mut Vec<FollowAction>,
    ) -> bool {
        if matches!(self.state, FollowState::Idle | FollowState::Completed) {
            return false;
        }

        if !success {
            self.replan_pending = false;
            return false;
        }

        if self.state != FollowState::Following {
            self.stall_timer = FixedNum::ZERO;
            self.travelled = FixedNum::ZERO;
            self.last_position = None;
        }

        self.state = FollowState::Following;
        self.replan_pending = false;
        self.path_target = self.target;
        self.clear_path();
        self.path.extend_from_slice(waypoints);

        if let Some(first) = self.path.first() {
            actions.push(FollowAction::Rotate(*first - position));
        }
        true
    }

    /// Advance one fixed tick of `dt` seconds from the agent's actual `position`.
    pub fn tick(&mut self, position: FixedVec2, dt: FixedNum, tuning: &FollowTuning, actions: &mut Vec<FollowAction>) {
        match self.state {
            FollowState::Idle | FollowState::Requesting => return,
            FollowState::Completed => {
                self.state = FollowState::Idle;
                return;
            }
            FollowState::Following => {}
        }

        let Some(target) = self.target else {
            self.stop_follow();
            return;
        };

        self.confirm_progress(position, actions);
        self.check_stall(position, target, dt, tuning, actions);

        if self.waypoint_index >= self.path.len() {
            self.clear_path();
            if self.path_target != Some(target) {
                // End of the old path; the search for the new target is still out
                debug!("[FOLLOW] Old path exhausted, waiting for path to {:?}", target);
                self.state = FollowState::Requesting;
                return;
            }
            actions.push(FollowAction::Complete { target });
            self.state = FollowState::Completed;
            self.replan_pending = false;
            return;
        }

        self.advance(position, dt, tuning, actions);
    }

    fn clear_path(&mut self) {
        self.path.clear();
        self.waypoint_index = 0;
        self.projected = None;
    }

    /// Commit the waypoints passed by the last Move if the agent actually
    /// got there. A rejected move leaves the index where it was.
    fn confirm_progress(&mut self, position: FixedVec2, actions: &mut Vec<FollowAction>) {
        let Some((expected, index)) = self.projected.take() else {
            return;
        };
        if index == self.waypoint_index {
            return;
        }

        if position == expected {
            self.waypoint_index = index;
        } else if let Some(waypoint) = self.current_waypoint() {
            actions.push(FollowAction::Rotate(waypoint - position));
        }
    }

    /// Compare distance actually covered over the last interval with what the
    /// configured speed should have covered; replan around the current
    /// waypoint when short.
    fn check_stall(
        &mut self,
        position: FixedVec2,
        target: FixedVec2,
        dt: FixedNum,
        tuning: &FollowTuning,
        actions: &mut Vec<FollowAction>,
    ) {
        if let Some(last) = self.last_position {
            self.travelled += last.distance(position);
            self.stall_timer += dt;
        }
        self.last_position = Some(position);

        if self.stall_timer < tuning.stall_check_interval {
            return;
        }

        let expected = tuning.speed * self.stall_timer - tuning.stall_tolerance;
        if let Some(waypoint) = self.current_waypoint() {
            if self.travelled < expected {
                debug!(
                    "[FOLLOW] Stalled: moved {} of expected {}, replanning around {:?}",
                    self.travelled, expected, waypoint
                );
                actions.push(FollowAction::RequestPath {
                    start: position,
                    target,
                    exclude_waypoint: Some(waypoint),
                });
                self.replan_pending = true;
                self.replans += 1;
            }
        }

        self.stall_timer = FixedNum::ZERO;
        self.travelled = FixedNum::ZERO;
    }

    /// Spend this tick's movement budget along the path, passing through any
    /// waypoints reached on the way.
    ///
    /// Waypoints reached from the real position are passed immediately; the
    /// ones reached by the projected move wait for [`Self::confirm_progress`].
    fn advance(&mut self, position: FixedVec2, dt: FixedNum, tuning: &FollowTuning, actions: &mut Vec<FollowAction>) {
        let mut budget = tuning.speed * dt;
        let mut current = position;
        let mut index = self.waypoint_index;

        while let Some(&waypoint) = self.path.get(index) {
            let distance = current.distance(waypoint);

            if distance <= tuning.arrival_tolerance {
                index += 1;
                if current == position {
                    self.waypoint_index = index;
                }
                if let Some(&next) = self.path.get(index) {
                    actions.push(FollowAction::Rotate(next - current));
                }
                continue;
            }

            if budget <= FixedNum::ZERO {
                break;
            }

            current += current.step_toward(waypoint, budget);
            budget -= distance.min(budget);
        }

        if current != position {
            actions.push(FollowAction::Move(current - position));
            self.projected = Some((current, index));
        }
    }
}
