mod blackboard; // latest pose shared between the feed and the driver
mod bus; // broadcast topics
mod config;
mod driver; // goal-by-goal control loop
mod goal_source;
mod plant; // simulated robot base

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use homing_kinematics::{Pose, Twist};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use blackboard::PoseTracker;
use bus::Topic;
use driver::Driver;
use goal_source::ConsoleGoals;
use plant::Plant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = config::load_settings(config::DEFAULT_CONFIG_PATH)?;
    let level: tracing::Level = settings.log.level.parse().context("invalid log level")?;

    // stdout belongs to the prompt and the run reports
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level, &directives))
        .with_writer(std::io::stderr)
        .init();

    info!(?settings, "Homing started.");

    let pose_topic: Topic<Pose> = Topic::new("pose", settings.bus.pose_capacity);
    let cmd_topic: Topic<Twist> = Topic::new("cmd_vel", settings.bus.cmd_capacity);
    let tracker = PoseTracker::new(settings.plant.initial_pose);
    let running = Arc::new(AtomicBool::new(true));
    info!(pose = pose_topic.name(), cmd = cmd_topic.name(), "Topics ready.");

    let feed = tokio::spawn(blackboard::pose_feed(tracker.clone(), pose_topic.subscribe()));

    info!("Spawning plant thread...");
    let plant = Plant::from_settings(&settings.plant)?.spawn(
        cmd_topic.subscribe(),
        pose_topic.clone(),
        Arc::clone(&running),
    )?;

    let mut driver = Driver::new(ConsoleGoals::stdin()?, cmd_topic.clone(), tracker)
        .with_max_linear_speed(settings.control.max_linear_speed);

    let result = tokio::select! {
        res = driver.run() => res.map(|runs| info!(runs, "Goal input finished.")),
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for ctrl-c")?;
            warn!("Interrupted, shutting down.");
            Ok(())
        }
    };

    cmd_topic.publish(Twist::ZERO);
    running.store(false, Ordering::Relaxed);
    if plant.join().is_err() {
        error!("Plant thread panicked.");
    }
    feed.abort();

    info!("Homing stopped.");
    result
}

/// `RUST_LOG`-style directives, falling back to `level` when they are empty.
fn log_filter(level: tracing::Level, directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives)
}
