//! Simulated robot standing in for the real base: consumes velocity commands,
//! publishes the odometry pose.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Context;
use homing_kinematics::{DifferentialDrive, KinematicsError, Pose, Twist};
use spin_sleep::SpinSleeper;
use tokio::sync::broadcast::Receiver;
use tracing::{error, info, warn};

use crate::bus::{Topic, drain_latest};
use crate::config::PlantSettings;

pub struct Plant {
    drive: DifferentialDrive,
    pose: Pose,
    step: Duration,
    command_timeout: Duration,
    command: Twist,
    last_command: Option<Instant>,
    timed_out: bool,
}

impl Plant {
    pub fn new(drive: DifferentialDrive, initial: Pose, step: Duration, command_timeout: Duration) -> Self {
        Plant {
            drive,
            pose: initial,
            step,
            command_timeout,
            command: Twist::ZERO,
            last_command: None,
            timed_out: false,
        }
    }

    pub fn from_settings(settings: &PlantSettings) -> anyhow::Result<Self> {
        let drive = DifferentialDrive::new(settings.wheel_radius, settings.axle_length)
            .and_then(|d| d.with_wheel_speed_limit(settings.max_wheel_speed))
            .context("invalid plant drive parameters")?;
        info!(
            wheel_radius = drive.wheel_radius(),
            axle_length = drive.axle_length(),
            max_wheel_speed = drive.max_wheel_speed(),
            "Plant drive configured."
        );
        Ok(Plant::new(
            drive,
            settings.initial_pose,
            settings.step(),
            settings.command_timeout(),
        ))
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Latches a new velocity command received at `now`.
    pub fn command(&mut self, twist: Twist, now: Instant) {
        self.command = twist;
        self.last_command = Some(now);
        self.timed_out = false;
    }

    /// Advances the simulation by one step. A command older than the timeout is treated as zero.
    pub fn step(&mut self, now: Instant) -> Result<Pose, KinematicsError> {
        let active = match self.last_command {
            Some(at) if now.saturating_duration_since(at) <= self.command_timeout => self.command,
            Some(at) => {
                if !self.timed_out {
                    warn!(age = ?now.saturating_duration_since(at), "Velocity command timed out, stopping.");
                    self.timed_out = true;
                }
                Twist::ZERO
            }
            None => Twist::ZERO,
        };
        self.pose = self.drive.update_pose(self.pose, active.into(), self.step.as_secs_f64())?;
        Ok(self.pose)
    }

    /// Runs the simulation on its own thread until `running` is cleared.
    pub fn spawn(
        mut self,
        mut cmd_rx: Receiver<Arc<Twist>>,
        pose_topic: Topic<Pose>,
        running: Arc<AtomicBool>,
    ) -> anyhow::Result<JoinHandle<()>> {
        let handle = thread::Builder::new().name("plant".into()).spawn(move || {
            info!(pose = %self.pose(), drive = %self.drive, "Plant thread started.");
            let sleeper = SpinSleeper::new(10_000);
            pose_topic.publish(self.pose);
            while running.load(Ordering::Relaxed) {
                let now = Instant::now();
                if let Some(twist) = drain_latest("cmd_vel", &mut cmd_rx) {
                    self.command(*twist, now);
                }
                match self.step(now) {
                    Ok(pose) => pose_topic.publish(pose),
                    Err(e) => {
                        error!(error = %e, "Plant step failed, stopping simulation.");
                        break;
                    }
                }
                sleeper.sleep(self.step);
            }
            info!(pose = %self.pose(), "Plant thread stopped.");
        })?;
        Ok(handle)
    }
}
