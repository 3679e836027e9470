//! Error types for the kinematics library.
//!
//! Only the differential-drive model can fail: its geometry must be physical
//! and it refuses to integrate backwards in time.

use core::fmt;

/// Errors that can occur when building or stepping a drive model.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// Returned when a wheel radius is provided that is not positive.
    InvalidWheelRadius(&'static str),
    /// Returned when an axle length is provided that is not positive.
    InvalidAxleLength(&'static str),
    /// Returned when a wheel speed limit is provided that is not positive.
    InvalidSpeedLimit(&'static str),
    /// Returned when a negative time delta is used for pose updates.
    NegativeTimeDelta(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::InvalidWheelRadius(msg) => write!(f, "Invalid wheel radius: {}", msg),
            KinematicsError::InvalidAxleLength(msg) => write!(f, "Invalid axle length: {}", msg),
            KinematicsError::InvalidSpeedLimit(msg) => write!(f, "Invalid wheel speed limit: {}", msg),
            KinematicsError::NegativeTimeDelta(msg) => write!(f, "Negative time delta: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
