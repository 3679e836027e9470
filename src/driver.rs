use std::time::Duration;

use homing_control::{GoalController, RunReport, TerminationReason};
use homing_kinematics::{Goal, Twist};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::blackboard::PoseTracker;
use crate::bus::Topic;
use crate::goal_source::{GoalRequest, GoalSource};

/// 10 Hz control loop.
pub const CONTROL_PERIOD: Duration = Duration::from_millis(100);

/// Where velocity commands go.
pub trait VelocitySink {
    fn send(&mut self, command: Twist);
}

impl VelocitySink for Topic<Twist> {
    fn send(&mut self, command: Twist) {
        trace!(topic = self.name(), linear = ?command.linear(), angular = ?command.angular(), "send");
        self.publish(command);
    }
}

/// Runs one goal after another until the goal source says stop.
pub struct Driver<G, S> {
    goals: G,
    sink: S,
    tracker: PoseTracker,
    max_linear_speed: Option<f64>,
}

impl<G: GoalSource, S: VelocitySink> Driver<G, S> {
    pub fn new(goals: G, sink: S, tracker: PoseTracker) -> Self {
        Driver {
            goals,
            sink,
            tracker,
            max_linear_speed: None,
        }
    }

    pub fn with_max_linear_speed(mut self, max_linear_speed: Option<f64>) -> Self {
        self.max_linear_speed = max_linear_speed;
        self
    }

    /// Returns the number of completed runs once goal input stops.
    pub async fn run(&mut self) -> anyhow::Result<usize> {
        let mut runs = 0;
        loop {
            let goal = match self.goals.next_goal().await? {
                GoalRequest::Goal(goal) if !goal.is_stop_sentinel() => goal,
                GoalRequest::Goal(_) | GoalRequest::Stop => {
                    info!(runs, "Stop requested.");
                    return Ok(runs);
                }
            };
            let report = self.run_goal(goal).await;
            print_report(&report);
            runs += 1;
        }
    }

    /// Drives to `goal` at the control rate until the controller finishes.
    pub async fn run_goal(&mut self, goal: Goal) -> RunReport {
        let mut controller = GoalController::new(goal).with_max_linear_speed(self.max_linear_speed);
        let mut ticker = time::interval(CONTROL_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            %goal,
            start = %self.tracker.current_pose(),
            pose_age = ?self.tracker.last_update().map(|at| at.elapsed()),
            "Run started."
        );

        loop {
            // pose feed updates land while we wait here
            ticker.tick().await;
            let pose = self.tracker.current_pose();
            let tick = controller.tick(pose);
            for command in tick.commands() {
                self.sink.send(command);
            }
            if let Some(report) = tick.report {
                match report.reason {
                    TerminationReason::GoalReached => info!(?report, "Run finished."),
                    TerminationReason::Overshoot | TerminationReason::IterationLimit => {
                        warn!(?report, pose = %pose, "Run ended before reaching the goal.")
                    }
                }
                return report;
            }
            debug!(phase = ?controller.phase(), pose = %pose, "tick");
        }
    }
}

fn print_report(report: &RunReport) {
    println!("The process has finished in {} iterations", report.iterations);
    println!("The position error is {}", report.final_distance);
    println!();
}
