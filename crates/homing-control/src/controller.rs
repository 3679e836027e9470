//! Per-goal rotate-then-translate controller.
//!
//! A [`GoalController`] lives for exactly one run. It first turns in place
//! until the heading error is below [`ANGLE_TOLERANCE`], then drives straight
//! with a speed equal to the remaining distance. The run ends when the robot
//! is within [`DISTANCE_TOLERANCE`], when the distance stops shrinking while
//! translating (overshoot), or after [`MAX_ITERATIONS`] ticks.

use std::fmt;

use homing_kinematics::{Goal, Pose, Twist};
use tracing::debug;

use crate::geometry::{TurnDirection, angular_error, desired_heading, euclidean_distance, turn_direction};

/// Heading error (rad) below which the robot stops turning and starts driving.
pub const ANGLE_TOLERANCE: f64 = 0.03;
/// Distance below which the goal counts as reached.
pub const DISTANCE_TOLERANCE: f64 = 0.25;
/// Hard cap on ticks per run.
pub const MAX_ITERATIONS: u32 = 900;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Rotating,
    Translating,
    Done,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Closer than [`DISTANCE_TOLERANCE`].
    GoalReached,
    /// Distance did not decrease between two translating ticks.
    Overshoot,
    /// [`MAX_ITERATIONS`] ticks elapsed.
    IterationLimit,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminationReason::GoalReached => "goal reached",
            TerminationReason::Overshoot => "overshoot",
            TerminationReason::IterationLimit => "iteration limit",
        };
        f.write_str(s)
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub iterations: u32,
    pub final_distance: f64,
    pub reason: TerminationReason,
}

/// Mutable bookkeeping of a single run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlState {
    pub iteration: u32,
    pub rotation_done: bool,
    pub overshoot: bool,
    pub previous_distance: f64,
    pub direction: TurnDirection,
}

/// Output of one controller step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Command to publish for this tick.
    pub command: Twist,
    /// Extra command to publish right after `command`; only set when the goal is reached.
    pub stop_command: Option<Twist>,
    /// Distance to the goal measured this tick.
    pub distance: f64,
    /// Set once the run is over.
    pub report: Option<RunReport>,
}

impl Tick {
    pub fn is_final(&self) -> bool {
        self.report.is_some()
    }

    /// Every command this tick emits, in publish order.
    pub fn commands(&self) -> impl Iterator<Item = Twist> + '_ {
        std::iter::once(self.command).chain(self.stop_command)
    }
}

/// Drives the robot to one goal.
#[derive(Debug, Clone)]
pub struct GoalController {
    goal: Goal,
    max_linear_speed: Option<f64>,
    state: ControlState,
    report: Option<RunReport>,
}

impl GoalController {
    pub fn new(goal: Goal) -> Self {
        GoalController {
            goal,
            max_linear_speed: None,
            state: ControlState::default(),
            report: None,
        }
    }

    /// Caps the forward speed. Without a cap the speed equals the remaining distance.
    pub fn with_max_linear_speed(mut self, max_linear_speed: Option<f64>) -> Self {
        self.max_linear_speed = max_linear_speed;
        self
    }

    pub fn goal(&self) -> Goal {
        self.goal
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn report(&self) -> Option<RunReport> {
        self.report
    }

    pub fn phase(&self) -> Phase {
        if self.report.is_some() {
            Phase::Done
        } else if self.state.rotation_done {
            Phase::Translating
        } else {
            Phase::Rotating
        }
    }

    /// Advances the run by one tick using the latest pose (heading in `[0, 2π)`).
    ///
    /// Ticking a finished controller is harmless: it returns a zero command
    /// and the stored report.
    pub fn tick(&mut self, pose: Pose) -> Tick {
        if let Some(report) = self.report {
            return Tick {
                command: Twist::ZERO,
                stop_command: None,
                distance: report.final_distance,
                report: Some(report),
            };
        }

        let distance = euclidean_distance(self.goal, pose);
        let desired = desired_heading(self.goal, pose);
        let error = angular_error(pose.heading, desired);
        self.state.direction = turn_direction(pose.heading, desired);

        let command = if error < ANGLE_TOLERANCE || self.state.rotation_done {
            if !self.state.rotation_done {
                debug!(iteration = self.state.iteration, error, "heading aligned, translating");
            }
            let vx = if distance < self.state.previous_distance || !self.state.rotation_done {
                self.limit_speed(distance)
            } else {
                self.state.overshoot = true;
                0.0
            };
            self.state.previous_distance = distance;
            self.state.rotation_done = true;
            Twist::new(vx, 0.0)
        } else {
            Twist::new(0.0, self.state.direction.sign() * error)
        };

        debug!(
            iteration = self.state.iteration,
            distance,
            desired,
            error,
            vx = command.vx,
            wz = command.wz,
            "controller tick"
        );

        if self.state.overshoot {
            return self.finish(command, None, distance, TerminationReason::Overshoot);
        }

        self.state.iteration += 1;
        if self.state.iteration >= MAX_ITERATIONS {
            return self.finish(command, None, distance, TerminationReason::IterationLimit);
        }
        if distance < DISTANCE_TOLERANCE {
            return self.finish(command, Some(Twist::ZERO), distance, TerminationReason::GoalReached);
        }

        Tick {
            command,
            stop_command: None,
            distance,
            report: None,
        }
    }

    fn limit_speed(&self, distance: f64) -> f64 {
        match self.max_linear_speed {
            Some(max) => distance.min(max),
            None => distance,
        }
    }

    fn finish(
        &mut self,
        command: Twist,
        stop_command: Option<Twist>,
        distance: f64,
        reason: TerminationReason,
    ) -> Tick {
        let report = RunReport {
            iterations: self.state.iteration,
            final_distance: distance,
            reason,
        };
        debug!(iterations = report.iterations, distance, %reason, "run finished");
        self.report = Some(report);
        Tick {
            command,
            stop_command,
            distance,
            report: Some(report),
        }
    }
}
