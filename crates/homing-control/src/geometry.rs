//! Planar geometry used by the controller on every tick.
//!
//! All headings here live in `[0, 2π)`.

use std::f64::consts::TAU;

use homing_kinematics::{Goal, Pose};

/// Straight-line distance between the robot position and the goal.
pub fn euclidean_distance(goal: Goal, pose: Pose) -> f64 {
    let dx = goal.x - pose.x;
    let dy = goal.y - pose.y;
    (dx * dx + dy * dy).sqrt()
}

/// Heading that points from the robot position at the goal, in `[0, 2π)`.
pub fn desired_heading(goal: Goal, pose: Pose) -> f64 {
    Pose::normalize_heading((goal.y - pose.y).atan2(goal.x - pose.x))
}

/// Magnitude of the raw heading difference.
///
/// This is not the shortest angular distance: for headings on either side of
/// the 0/2π seam it is the long way round.
pub fn angular_error(heading: f64, desired: f64) -> f64 {
    (heading - desired).abs()
}

/// Sense of rotation around the z-axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnDirection {
    /// Counter-clockwise, increasing heading.
    #[default]
    Positive,
    /// Clockwise, decreasing heading.
    Negative,
}

impl TurnDirection {
    /// `+1.0` or `-1.0`.
    pub fn sign(self) -> f64 {
        match self {
            TurnDirection::Positive => 1.0,
            TurnDirection::Negative => -1.0,
        }
    }
}

/// Picks the cheaper way around the circle from `heading` to `desired`.
///
/// Both sides compare with a strict `<` against the wrap-around cost, so a
/// tie keeps the non-wrapping direction: `Negative` when `desired < heading`,
/// `Positive` otherwise.
pub fn turn_direction(heading: f64, desired: f64) -> TurnDirection {
    if desired < heading {
        if TAU - heading + desired < heading - desired {
            TurnDirection::Positive
        } else {
            TurnDirection::Negative
        }
    } else if TAU - desired + heading < desired - heading {
        TurnDirection::Negative
    } else {
        TurnDirection::Positive
    }
}

/// Angle swept when turning from `heading` to `desired` in `direction`.
pub fn turn_cost(heading: f64, desired: f64, direction: TurnDirection) -> f64 {
    match direction {
        TurnDirection::Positive if desired >= heading => desired - heading,
        TurnDirection::Positive => TAU - heading + desired,
        TurnDirection::Negative if desired < heading => heading - desired,
        TurnDirection::Negative => TAU - desired + heading,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPSILON: f64 = 1e-9;

    #[test]
    fn distance_is_euclidean() {
        let d = euclidean_distance(Goal::new(3.0, 4.0), Pose::new(0.0, 0.0, 1.0));
        assert!((d - 5.0).abs() < EPSILON);
        assert_eq!(euclidean_distance(Goal::new(1.0, 1.0), Pose::new(1.0, 1.0, 0.0)), 0.0);
    }

    #[test]
    fn desired_heading_is_wrapped() {
        let straight_down = desired_heading(Goal::new(0.0, -5.0), Pose::default());
        assert!((straight_down - 3.0 * FRAC_PI_2).abs() < EPSILON);

        let ahead = desired_heading(Goal::new(5.0, 0.0), Pose::default());
        assert_eq!(ahead, 0.0);

        let behind = desired_heading(Goal::new(-1.0, 0.0), Pose::default());
        assert!((behind - PI).abs() < EPSILON);
    }

    #[test]
    fn angular_error_is_raw_difference() {
        assert!((angular_error(0.1, TAU - 0.1) - (TAU - 0.2)).abs() < EPSILON);
        assert!((angular_error(2.0, 1.5) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn direction_takes_short_way_across_seam() {
        // 0.1 -> 6.0 is shorter going down through zero
        assert_eq!(turn_direction(0.1, 6.0), TurnDirection::Negative);
        // 6.0 -> 0.1 is shorter going up through 2π
        assert_eq!(turn_direction(6.0, 0.1), TurnDirection::Positive);
        assert_eq!(turn_direction(1.0, 2.0), TurnDirection::Positive);
        assert_eq!(turn_direction(2.0, 1.0), TurnDirection::Negative);
    }

    #[test]
    fn direction_ties_keep_non_wrapping_side() {
        // TAU - PI == PI exactly, so both costs are equal
        assert_eq!(turn_direction(0.0, PI), TurnDirection::Positive);
        assert_eq!(turn_direction(PI, 0.0), TurnDirection::Negative);
        assert_eq!(turn_direction(1.0, 1.0), TurnDirection::Positive);
    }

    #[test]
    fn cost_matches_direction() {
        assert!((turn_cost(0.1, 6.0, TurnDirection::Negative) - (TAU - 5.9)).abs() < EPSILON);
        assert!((turn_cost(0.1, 6.0, TurnDirection::Positive) - 5.9).abs() < EPSILON);
        assert!((turn_cost(6.0, 0.1, TurnDirection::Positive) - (TAU - 5.9)).abs() < EPSILON);
        assert!((turn_cost(6.0, 0.1, TurnDirection::Negative) - 5.9).abs() < EPSILON);
    }
}
