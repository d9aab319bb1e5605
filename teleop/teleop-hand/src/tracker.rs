//! Per-frame hand pose extraction.

use hashbrown::HashMap;
use nalgebra::{Point3, UnitQuaternion};
use tracing::{debug, warn};

use teleop_types::{
    HandJoint, HandPose, JointData, JointMap, MonotonicClock, Result, Side, TeleopError,
    ALL_JOINTS, DEFAULT_JOINT_RADIUS,
};

use crate::pinch::{PinchConfig, PinchDetector};
use crate::xr::{JointPoseQuery, ReferenceSpace, XrFrame, XrHand};

/// Hand poses keyed by side. At most one entry per side.
pub type HandPoses = HashMap<Side, HandPose>;

/// Extracts [`HandPose`]s from spatial-tracking frames.
///
/// The tracker keeps the poses produced by the most recent [`update`]
/// so consumers polling at a different cadence can read them through
/// [`latest_poses`].
///
/// [`update`]: HandTracker::update
/// [`latest_poses`]: HandTracker::latest_poses
///
/// # Example
///
/// ```
/// use teleop_hand::{HandTracker, RecordedFrame, RecordedHand, ReferenceSpace};
/// use teleop_types::{Handedness, Point3, Side, UnitQuaternion};
///
/// let frame = RecordedFrame::new().with_hand(
///     Handedness::Right,
///     RecordedHand::synthetic(Point3::new(0.3, 1.0, -0.2), UnitQuaternion::identity(), 0.01),
/// );
///
/// let mut tracker = HandTracker::new();
/// let poses = tracker.update(&frame, ReferenceSpace::LocalFloor).unwrap();
///
/// let right = &poses[&Side::Right];
/// assert_eq!(right.joint_count(), 25);
/// assert!(right.pinch_state.is_pinching);
/// assert!(tracker.latest(Side::Left).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct HandTracker {
    pinch: PinchDetector,
    clock: MonotonicClock,
    latest: HandPoses,
}

impl HandTracker {
    /// Create a tracker with the default pinch threshold and a fresh clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom pinch configuration.
    #[must_use]
    pub fn with_pinch_config(mut self, config: PinchConfig) -> Self {
        self.pinch = PinchDetector::new(config);
        self
    }

    /// Stamp poses with `clock`, typically shared with state capture.
    #[must_use]
    pub fn with_clock(mut self, clock: MonotonicClock) -> Self {
        self.clock = clock;
        self
    }

    /// The pinch detector in use.
    #[must_use]
    pub const fn pinch_detector(&self) -> &PinchDetector {
        &self.pinch
    }

    /// Extract hand poses from one frame.
    ///
    /// Sources tagged neither left nor right, and sources without a hand
    /// feed, are skipped. Joints whose space or pose is unavailable are
    /// skipped. A hand with no resolved joints is omitted.
    ///
    /// The returned map also replaces the retained latest poses.
    ///
    /// # Errors
    ///
    /// [`TeleopError::PoseQueryUnavailable`] if the frame cannot resolve
    /// joint poses at all. The retained poses are cleared in that case.
    pub fn update(&mut self, frame: &dyn XrFrame, reference: ReferenceSpace) -> Result<HandPoses> {
        self.latest.clear();

        let Some(query) = frame.pose_query() else {
            warn!("Frame has no joint pose capability");
            return Err(TeleopError::PoseQueryUnavailable);
        };

        let timestamp = self.clock.now_ms();
        let mut poses = HandPoses::new();

        for source in frame.input_sources() {
            let Some(side) = source.handedness().side() else {
                continue;
            };
            let Some(hand) = source.hand() else {
                continue;
            };

            let joints = collect_joints(hand, query, reference);
            if joints.is_empty() {
                debug!(side = %side, "Dropping hand with no resolved joints");
                continue;
            }

            poses.insert(side, self.assemble(side, timestamp, joints));
        }

        self.latest.clone_from(&poses);
        Ok(poses)
    }

    /// Poses produced by the most recent [`update`](Self::update).
    #[must_use]
    pub const fn latest_poses(&self) -> &HandPoses {
        &self.latest
    }

    /// Most recent pose for one side.
    #[must_use]
    pub fn latest(&self, side: Side) -> Option<&HandPose> {
        self.latest.get(&side)
    }

    fn assemble(&self, side: Side, timestamp: f64, joints: JointMap) -> HandPose {
        let (wrist_position, wrist_orientation) = joints
            .get(&HandJoint::Wrist)
            .map_or((Point3::origin(), UnitQuaternion::identity()), |w| {
                (w.position, w.orientation)
            });

        HandPose {
            handedness: side,
            timestamp,
            pinch_state: self.pinch.detect(&joints),
            joints,
            wrist_position,
            wrist_orientation,
        }
    }
}

/// Resolve every catalog joint the hand exposes this frame.
fn collect_joints(
    hand: &dyn XrHand,
    query: &dyn JointPoseQuery,
    reference: ReferenceSpace,
) -> JointMap {
    let mut joints = JointMap::with_capacity(ALL_JOINTS.len());
    for joint in ALL_JOINTS {
        let Some(space) = hand.joint_space(joint) else {
            continue;
        };
        let Some(pose) = query.joint_pose(space, reference) else {
            continue;
        };
        joints.insert(
            joint,
            JointData::new(
                pose.position,
                pose.orientation,
                pose.radius.unwrap_or(DEFAULT_JOINT_RADIUS),
            ),
        );
    }
    joints
}
