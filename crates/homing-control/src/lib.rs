//! Go-to-goal control for a planar differential-drive robot.
//!
//! The controller is a pure state machine: feed it the latest pose once per
//! tick and publish whatever [`Tick`] it hands back. Timing, pose delivery and
//! command transport belong to the caller.

pub mod controller;
pub mod geometry;

pub use controller::{
    ANGLE_TOLERANCE, ControlState, DISTANCE_TOLERANCE, GoalController, MAX_ITERATIONS, Phase, RunReport,
    TerminationReason, Tick,
};
pub use geometry::{TurnDirection, angular_error, desired_heading, euclidean_distance, turn_cost, turn_direction};
pub use homing_kinematics::{Goal, Pose, Twist};
