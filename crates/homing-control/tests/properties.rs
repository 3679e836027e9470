//! Property tests for heading wrap, turn selection and run termination.

use std::f64::consts::TAU;

use homing_control::{
    DISTANCE_TOLERANCE, Goal, GoalController, MAX_ITERATIONS, Pose, TerminationReason, Twist, TurnDirection,
    turn_cost, turn_direction,
};
use proptest::prelude::*;

fn other(direction: TurnDirection) -> TurnDirection {
    match direction {
        TurnDirection::Positive => TurnDirection::Negative,
        TurnDirection::Negative => TurnDirection::Positive,
    }
}

proptest! {
    /// Wrapped headings stay in [0, 2π) and differ from the input by whole turns
    #[test]
    fn heading_wrap_is_in_range_and_congruent(h in -1000.0..1000.0f64) {
        let n = Pose::normalize_heading(h);
        prop_assert!((0.0..TAU).contains(&n));
        let turns = ((h - n) / TAU).round();
        prop_assert!((h - n - turns * TAU).abs() < 1e-9);
    }

    /// The chosen turn never sweeps more than the opposite one
    #[test]
    fn chosen_turn_is_never_longer(heading in 0.0..TAU, desired in 0.0..TAU) {
        let chosen = turn_direction(heading, desired);
        let chosen_cost = turn_cost(heading, desired, chosen);
        let other_cost = turn_cost(heading, desired, other(chosen));
        prop_assert!(chosen_cost <= other_cost + 1e-12);
    }

    /// Starting inside the tolerance ends the run on the first tick with a stop command
    #[test]
    fn start_near_goal_ends_in_one_tick(
        x in -50.0..50.0f64,
        y in -50.0..50.0f64,
        heading in 0.0..TAU,
        r in 0.0..0.249f64,
        bearing in 0.0..TAU,
    ) {
        let goal = Goal::new(x + r * bearing.cos(), y + r * bearing.sin());
        prop_assume!(!goal.is_stop_sentinel());
        let mut ctl = GoalController::new(goal);
        let tick = ctl.tick(Pose::new(x, y, heading));
        let report = tick.report.expect("run should end on the first tick");
        prop_assert_eq!(report.reason, TerminationReason::GoalReached);
        prop_assert_eq!(report.iterations, 1);
        prop_assert!(report.final_distance < DISTANCE_TOLERANCE);
        prop_assert_eq!(tick.stop_command, Some(Twist::ZERO));
    }

    /// With a frozen pose the counter climbs by one per tick and the run always ends
    #[test]
    fn frozen_pose_run_terminates(
        px in -20.0..20.0f64,
        py in -20.0..20.0f64,
        heading in 0.0..TAU,
        gx in -20.0..20.0f64,
        gy in -20.0..20.0f64,
    ) {
        let mut ctl = GoalController::new(Goal::new(gx, gy));
        let pose = Pose::new(px, py, heading);
        let mut ticks = 0;
        loop {
            let before = ctl.state().iteration;
            let tick = ctl.tick(pose);
            ticks += 1;
            prop_assert!(ticks <= MAX_ITERATIONS);
            if tick.is_final() {
                break;
            }
            prop_assert_eq!(ctl.state().iteration, before + 1);
        }
        prop_assert!(ctl.state().iteration <= MAX_ITERATIONS);
    }

    /// Moving away from the goal while translating stops the robot and ends the run
    #[test]
    fn moving_away_while_translating_is_overshoot(d in 1.0..10.0f64, back in 0.01..5.0f64, heading in 0.0..TAU) {
        let mut ctl = GoalController::new(Goal::new(d, 0.0));
        let first = ctl.tick(Pose::new(0.0, 0.0, 0.0));
        prop_assert!(first.command.vx > 0.0);
        let tick = ctl.tick(Pose::new(-back, 0.0, heading));
        prop_assert_eq!(tick.command.vx, 0.0);
        let report = tick.report.expect("overshoot ends the run");
        prop_assert_eq!(report.reason, TerminationReason::Overshoot);
    }
}
