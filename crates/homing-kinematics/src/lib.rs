#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for planar differential-drive poses, goals and velocity commands."]
#![doc = ""]
#![doc = "Poses handed to the controller carry a heading in `[0, 2π)`; the drive model"]
#![doc = "integrates velocity commands and reports headings in `[-π, π)` like a raw odometry feed."]

use core::f64::consts::{PI, TAU};
use core::fmt;
use libm::{cos, sin};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::KinematicsError;

/// A 2‑D pose `(x, y, heading)` in world units and radians (heading measured
/// counter‑clockwise from the x‑axis).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// World‑frame x position.
    pub x: f64,
    /// World‑frame y position.
    pub y: f64,
    /// Heading (rad). Any sign when raw, `[0, 2π)` once normalized.
    pub heading: f64,
}

impl Pose {
    /// Construct a new pose. The heading is stored as given.
    pub const fn new(x: f64, y: f64, heading: f64) -> Self {
        Pose { x, y, heading }
    }

    /// Wrap an angle into `[0, 2π)`.
    ///
    /// The result is congruent to `angle` modulo `2π`. NaN stays NaN.
    pub fn normalize_heading(angle: f64) -> f64 {
        let a = angle % TAU;
        let a = if a < 0.0 { a + TAU } else { a };
        // `-ε + 2π` can round up to exactly 2π
        if a >= TAU { 0.0 } else { a }
    }

    /// Wrap an angle into `[-π, π)`.
    ///
    /// Angles at `π` are normalized to `-π`.
    pub fn normalize_angle(angle: f64) -> f64 {
        let a = angle % TAU;
        if a >= PI {
            a - TAU
        } else if a < -PI {
            a + TAU
        } else {
            a
        }
    }

    /// Returns this pose with its heading wrapped into `[0, 2π)`.
    pub fn normalized(self) -> Self {
        Pose {
            heading: Self::normalize_heading(self.heading),
            ..self
        }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.3}, y: {:.3}, heading: {:.3} rad)", self.x, self.y, self.heading)
    }
}

/// A target position in the world frame.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Goal {
    /// World‑frame x position.
    pub x: f64,
    /// World‑frame y position.
    pub y: f64,
}

impl Goal {
    /// Construct a new goal.
    pub const fn new(x: f64, y: f64) -> Self {
        Goal { x, y }
    }

    /// `(0, 0)` is reserved to mean "stop asking for goals"; it is never a target.
    pub fn is_stop_sentinel(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.3}, y: {:.3})", self.x, self.y)
    }
}

/// A planar velocity command expressed in the robot base frame.
///
/// Only forward speed and yaw rate exist; every other axis of the published
/// twist is fixed at zero.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Twist {
    /// Linear x velocity in the robot's base frame.
    pub vx: f64,
    /// Angular z velocity (rad/s) around the robot's base frame z-axis.
    pub wz: f64,
}

impl Twist {
    /// The all-zero command.
    pub const ZERO: Twist = Twist { vx: 0.0, wz: 0.0 };

    /// Construct a new twist.
    pub const fn new(vx: f64, wz: f64) -> Self {
        Twist { vx, wz }
    }

    /// Linear part as a `[x, y, z]` vector.
    pub const fn linear(&self) -> [f64; 3] {
        [self.vx, 0.0, 0.0]
    }

    /// Angular part as a `[x, y, z]` vector.
    pub const fn angular(&self) -> [f64; 3] {
        [0.0, 0.0, self.wz]
    }

    /// True when both components are exactly zero.
    pub fn is_zero(&self) -> bool {
        self.vx == 0.0 && self.wz == 0.0
    }
}

impl fmt::Display for Twist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(vx: {:.3}, ωz: {:.3} rad/s)", self.vx, self.wz)
    }
}

/// Left and right wheel angular velocities.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSpeeds {
    /// Left wheel angular velocity (rad/s).
    pub omega_l: f64,
    /// Right wheel angular velocity (rad/s).
    pub omega_r: f64,
}

impl WheelSpeeds {
    /// Construct wheel speeds.
    pub const fn new(omega_l: f64, omega_r: f64) -> Self {
        WheelSpeeds { omega_l, omega_r }
    }
}

/// Linear and angular chassis velocities.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisSpeeds {
    /// Linear speed of the chassis center.
    pub v: f64,
    /// Angular speed of the chassis (rad/s).
    pub omega: f64,
}

impl ChassisSpeeds {
    /// Construct chassis speeds.
    pub const fn new(v: f64, omega: f64) -> Self {
        ChassisSpeeds { v, omega }
    }
}

impl From<Twist> for ChassisSpeeds {
    fn from(t: Twist) -> Self {
        ChassisSpeeds::new(t.vx, t.wz)
    }
}

/// Differential‑drive model.
///
/// Holds the drive geometry and a per-wheel speed limit, and integrates
/// chassis speeds into poses.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialDrive {
    wheel_radius: f64,
    axle_length: f64,
    max_wheel_speed: f64,
}

impl DifferentialDrive {
    /// Construct a drive model without a wheel speed limit.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidWheelRadius)` if `wheel_radius` is not positive.
    /// Returns `Err(KinematicsError::InvalidAxleLength)` if `axle_length` is not positive.
    pub const fn new(wheel_radius: f64, axle_length: f64) -> Result<Self, KinematicsError> {
        if wheel_radius <= 0.0 {
            return Err(KinematicsError::InvalidWheelRadius("must be positive"));
        }
        if axle_length <= 0.0 {
            return Err(KinematicsError::InvalidAxleLength("must be positive"));
        }
        Ok(DifferentialDrive {
            wheel_radius,
            axle_length,
            max_wheel_speed: f64::INFINITY,
        })
    }

    /// Limit each wheel to `max_wheel_speed` rad/s in either direction.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidSpeedLimit)` if the limit is not positive.
    pub fn with_wheel_speed_limit(mut self, max_wheel_speed: f64) -> Result<Self, KinematicsError> {
        if !(max_wheel_speed > 0.0) {
            return Err(KinematicsError::InvalidSpeedLimit("must be positive"));
        }
        self.max_wheel_speed = max_wheel_speed;
        Ok(self)
    }

    /// Returns the wheel radius.
    pub fn wheel_radius(&self) -> f64 {
        self.wheel_radius
    }

    /// Returns the axle length.
    pub fn axle_length(&self) -> f64 {
        self.axle_length
    }

    /// Returns the per-wheel speed limit (rad/s).
    pub fn max_wheel_speed(&self) -> f64 {
        self.max_wheel_speed
    }

    /// Chassis speeds produced by the given wheel speeds.
    pub fn forward_kinematics(&self, wheel_speeds: WheelSpeeds) -> ChassisSpeeds {
        let v_l = wheel_speeds.omega_l * self.wheel_radius;
        let v_r = wheel_speeds.omega_r * self.wheel_radius;

        ChassisSpeeds::new((v_r + v_l) / 2.0, (v_r - v_l) / self.axle_length)
    }

    /// Wheel speeds needed to achieve the given chassis speeds.
    pub fn inverse_kinematics(&self, chassis_speeds: ChassisSpeeds) -> WheelSpeeds {
        let half_track = self.axle_length / 2.0;
        let v_r = chassis_speeds.v + chassis_speeds.omega * half_track;
        let v_l = chassis_speeds.v - chassis_speeds.omega * half_track;

        WheelSpeeds::new(v_l / self.wheel_radius, v_r / self.wheel_radius)
    }

    /// Chassis speeds the drive can actually deliver for a requested command.
    ///
    /// Each wheel is clamped to the speed limit independently, so a saturated
    /// command also changes its curvature, as it would on real motors.
    pub fn achievable(&self, requested: ChassisSpeeds) -> ChassisSpeeds {
        let wheels = self.inverse_kinematics(requested);
        let limit = self.max_wheel_speed;
        self.forward_kinematics(WheelSpeeds::new(
            wheels.omega_l.clamp(-limit, limit),
            wheels.omega_r.clamp(-limit, limit),
        ))
    }

    /// Integrates chassis speeds over `dt` seconds starting from `current_pose`.
    ///
    /// Speeds are assumed constant over the interval and are first passed
    /// through [`achievable`](Self::achievable). The resulting heading is
    /// wrapped into `[-π, π)`.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative.
    pub fn update_pose(
        &self,
        current_pose: Pose,
        chassis_speeds: ChassisSpeeds,
        dt: f64,
    ) -> Result<Pose, KinematicsError> {
        if dt < 0.0 {
            return Err(KinematicsError::NegativeTimeDelta("must be non-negative"));
        }

        let speeds = self.achievable(chassis_speeds);
        let delta_x = speeds.v * cos(current_pose.heading) * dt;
        let delta_y = speeds.v * sin(current_pose.heading) * dt;
        let delta_heading = speeds.omega * dt;

        Ok(Pose {
            x: current_pose.x + delta_x,
            y: current_pose.y + delta_y,
            heading: Pose::normalize_angle(current_pose.heading + delta_heading),
        })
    }
}

impl fmt::Display for DifferentialDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DifferentialDrive (r: {:.2}, L: {:.2}, ω_max: {:.1} rad/s)",
            self.wheel_radius, self.axle_length, self.max_wheel_speed
        )
    }
}
