use std::time::Duration;

use anyhow::{Context, bail};
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File, FileFormat};
use homing_kinematics::Pose;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Where turtlesim spawns its first turtle.
const SPAWN_POINT: f64 = 5.544445;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: LogSettings,
    pub control: ControlSettings,
    pub plant: PlantSettings,
    pub bus: BusSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Level used when `RUST_LOG` is unset or empty.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings { level: "info".into() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub max_linear_speed: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlantSettings {
    pub initial_pose: Pose,
    pub step_ms: u64,
    pub command_timeout_ms: u64,
    pub wheel_radius: f64,
    pub axle_length: f64,
    pub max_wheel_speed: f64,
}

impl Default for PlantSettings {
    fn default() -> Self {
        PlantSettings {
            initial_pose: Pose::new(SPAWN_POINT, SPAWN_POINT, 0.0),
            step_ms: 10,
            command_timeout_ms: 1000,
            wheel_radius: 0.1,
            axle_length: 0.5,
            max_wheel_speed: 1000.0,
        }
    }
}

impl PlantSettings {
    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusSettings {
    pub pose_capacity: usize,
    pub cmd_capacity: usize,
}

impl Default for BusSettings {
    fn default() -> Self {
        BusSettings {
            pose_capacity: 16,
            cmd_capacity: 4,
        }
    }
}

impl Settings {
    fn validate(&self) -> anyhow::Result<()> {
        if let Some(max) = self.control.max_linear_speed {
            if !(max > 0.0) {
                bail!("control.max_linear_speed must be positive, got {max}");
            }
        }
        if self.plant.step_ms == 0 {
            bail!("plant.step_ms must be at least 1");
        }
        if self.bus.pose_capacity == 0 || self.bus.cmd_capacity == 0 {
            bail!("bus capacities must be non-zero");
        }
        self.log
            .level
            .parse::<tracing::Level>()
            .with_context(|| format!("log.level `{}` is not a tracing level", self.log.level))?;
        Ok(())
    }
}

/// Loads settings from an optional TOML file layered under `HOMING_*` environment variables.
pub fn load_settings(path: &str) -> anyhow::Result<Settings> {
    let builder = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix("HOMING")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
    finish(builder).with_context(|| format!("failed to load configuration from {path}"))
}

fn finish(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Settings> {
    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
