use parking_lot::RwLock;
use std::{sync::Arc, time::Instant};

use homing_kinematics::Pose;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
struct PoseSlot {
    pose: Pose,
    updated_at: Option<Instant>,
}

/// Latest known robot pose, shared between the pose feed (writer) and the driver (reader).
///
/// Cloning hands out another handle to the same slot. Headings are stored in `[0, 2π)`.
#[derive(Debug, Clone, Default)]
pub struct PoseTracker {
    slot: Arc<RwLock<PoseSlot>>,
}

impl PoseTracker {
    pub fn new(initial: Pose) -> Self {
        PoseTracker {
            slot: Arc::new(RwLock::new(PoseSlot {
                pose: initial.normalized(),
                updated_at: None,
            })),
        }
    }

    pub fn current_pose(&self) -> Pose {
        self.slot.read().pose
    }

    /// When the feed last delivered a pose. Informational only, nothing expires.
    pub fn last_update(&self) -> Option<Instant> {
        self.slot.read().updated_at
    }

    /// Stores a raw pose from the feed. No range checks: NaN goes through as is.
    pub fn on_pose_update(&self, raw: Pose) {
        let pose = raw.normalized();
        let mut g = self.slot.write();
        g.pose = pose;
        g.updated_at = Some(Instant::now());
    }
}

/// Applies every pose published on the topic to `tracker` until the topic closes.
pub async fn pose_feed(tracker: PoseTracker, mut pose_rx: Receiver<Arc<Pose>>) -> anyhow::Result<()> {
    info!("Pose feed started.");
    loop {
        match pose_rx.recv().await {
            Ok(pose) => {
                tracker.on_pose_update(*pose);
                debug!(raw = %pose, "pose update");
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "pose feed lagged, continuing with newest pose");
            }
            Err(RecvError::Closed) => {
                info!("Pose topic closed, pose feed finished.");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Topic;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn update_normalizes_negative_heading() {
        let tracker = PoseTracker::default();
        assert!(tracker.last_update().is_none());
        tracker.on_pose_update(Pose::new(1.0, 2.0, -FRAC_PI_2));
        let pose = tracker.current_pose();
        assert_eq!((pose.x, pose.y), (1.0, 2.0));
        assert!((pose.heading - 1.5 * PI).abs() < 1e-12);
        assert!(tracker.last_update().is_some());
    }

    #[test]
    fn clones_share_the_same_pose() {
        let writer = PoseTracker::new(Pose::new(0.0, 0.0, 0.0));
        let reader = writer.clone();
        writer.on_pose_update(Pose::new(3.0, 4.0, 0.5));
        assert_eq!(reader.current_pose(), Pose::new(3.0, 4.0, 0.5));
    }

    #[test]
    fn initial_pose_is_normalized() {
        let tracker = PoseTracker::new(Pose::new(0.0, 0.0, -PI));
        assert!((tracker.current_pose().heading - PI).abs() < 1e-12);
    }

    #[test]
    fn nan_heading_propagates() {
        let tracker = PoseTracker::default();
        tracker.on_pose_update(Pose::new(0.0, 0.0, f64::NAN));
        assert!(tracker.current_pose().heading.is_nan());
    }

    #[tokio::test]
    async fn feed_applies_published_poses_until_closed() {
        let topic: Topic<Pose> = Topic::new("pose", 4);
        let tracker = PoseTracker::default();
        let feed = tokio::spawn(pose_feed(tracker.clone(), topic.subscribe()));

        topic.publish(Pose::new(2.0, -1.0, -PI / 4.0));
        drop(topic);
        feed.await.unwrap().unwrap();

        let pose = tracker.current_pose();
        assert_eq!((pose.x, pose.y), (2.0, -1.0));
        assert!((pose.heading - 1.75 * PI).abs() < 1e-12);
    }
}
