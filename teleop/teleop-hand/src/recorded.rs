//! In-memory tracking frames.
//!
//! [`RecordedFrame`] implements the [`xr`](crate::xr) traits from plain
//! data, for replaying captured sessions and for driving the pipeline
//! without a live XR runtime.

use hashbrown::HashMap;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use teleop_types::{HandJoint, Handedness, ALL_JOINTS};

use crate::xr::{
    JointPoseQuery, JointSpace, ReferenceSpace, XrFrame, XrHand, XrInputSource, XrJointPose,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Recorded joint data for one hand.
///
/// A joint key that is present exposes a tracking space. A `None` value
/// means the space exists but its pose did not resolve on this frame.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecordedHand {
    /// Per-joint samples.
    pub joints: HashMap<HandJoint, Option<XrJointPose>>,
}

impl RecordedHand {
    /// A hand with no joint spaces.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a joint at `position` with identity orientation.
    #[must_use]
    pub fn with_joint(self, joint: HandJoint, position: Point3<f64>) -> Self {
        self.with_joint_pose(joint, XrJointPose::at(position))
    }

    /// Add a joint with a full pose.
    #[must_use]
    pub fn with_joint_pose(mut self, joint: HandJoint, pose: XrJointPose) -> Self {
        self.joints.insert(joint, Some(pose));
        self
    }

    /// Expose a joint space whose pose does not resolve.
    #[must_use]
    pub fn with_unresolved_joint(mut self, joint: HandJoint) -> Self {
        self.joints.insert(joint, None);
        self
    }

    /// A full 25-joint hand with its wrist at `wrist`, oriented by
    /// `orientation`, and the thumb and index tips `pinch_gap` meters apart.
    ///
    /// Finger joints are laid out along the hand's local +Y with fingers
    /// spread along local X, roughly at adult hand proportions.
    #[must_use]
    pub fn synthetic(wrist: Point3<f64>, orientation: UnitQuaternion<f64>, pinch_gap: f64) -> Self {
        let mut hand = Self::new();
        for joint in ALL_JOINTS {
            let local = synthetic_offset(joint, pinch_gap);
            let pose = XrJointPose::at(wrist + orientation * local)
                .with_orientation(orientation)
                .with_radius(if joint.is_tip() { 0.008 } else { 0.01 });
            hand.joints.insert(joint, Some(pose));
        }
        hand
    }
}

/// Local joint offset from the wrist for [`RecordedHand::synthetic`].
fn synthetic_offset(joint: HandJoint, pinch_gap: f64) -> Vector3<f64> {
    // Thumb tip sits at a fixed spot; the index tip is placed `pinch_gap`
    // away from it along local X.
    let thumb_tip = Vector3::new(0.02, 0.09, 0.02);
    let index = joint.index();
    match joint {
        HandJoint::Wrist => Vector3::zeros(),
        HandJoint::ThumbTip => thumb_tip,
        HandJoint::IndexFingerTip => thumb_tip + Vector3::new(pinch_gap, 0.0, 0.0),
        _ => {
            // Fingers are grouped in fives after the wrist; thumb has four.
            let (finger, segment) = if index <= 4 {
                (0, index)
            } else {
                ((index - 5) / 5 + 1, (index - 5) % 5 + 1)
            };
            let spread = -0.02 + 0.02 * finger as f64;
            Vector3::new(spread, 0.025 * segment as f64, 0.0)
        }
    }
}

/// A recorded input source.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecordedInputSource {
    /// Runtime-assigned source id.
    pub id: u32,
    /// Handedness tag.
    pub handedness: Handedness,
    /// Hand feed, if any.
    pub hand: Option<RecordedHand>,
}

impl RecordedInputSource {
    /// A hand-tracked source.
    #[must_use]
    pub fn hand(id: u32, handedness: Handedness, hand: RecordedHand) -> Self {
        Self {
            id,
            handedness,
            hand: Some(hand),
        }
    }

    /// A source without a hand feed (controller, gaze).
    #[must_use]
    pub fn without_hand(id: u32, handedness: Handedness) -> Self {
        Self {
            id,
            handedness,
            hand: None,
        }
    }
}

/// A hand bound to its source id, so joint spaces carry the owner.
struct BoundHand<'a> {
    source: u32,
    hand: &'a RecordedHand,
}

impl XrHand for BoundHand<'_> {
    fn joint_space(&self, joint: HandJoint) -> Option<JointSpace> {
        self.hand.joints.contains_key(&joint).then_some(JointSpace {
            source: self.source,
            joint,
        })
    }
}

impl XrHand for RecordedInputSource {
    fn joint_space(&self, joint: HandJoint) -> Option<JointSpace> {
        let hand = self.hand.as_ref()?;
        BoundHand {
            source: self.id,
            hand,
        }
        .joint_space(joint)
    }
}

impl XrInputSource for RecordedInputSource {
    fn handedness(&self) -> Handedness {
        self.handedness
    }

    fn hand(&self) -> Option<&dyn XrHand> {
        self.hand.as_ref().map(|_| self as &dyn XrHand)
    }
}

/// One recorded tracking frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecordedFrame {
    /// Input sources active on this frame.
    pub sources: Vec<RecordedInputSource>,
    /// Reference space the recorded poses are expressed in.
    pub reference: ReferenceSpace,
    /// Whether the frame offers joint pose queries.
    pub pose_query_available: bool,
}

impl Default for RecordedFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordedFrame {
    /// An empty frame in the default reference space.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            reference: ReferenceSpace::default(),
            pose_query_available: true,
        }
    }

    /// Add an input source.
    #[must_use]
    pub fn with_source(mut self, source: RecordedInputSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Add a tracked hand. Source ids are assigned in insertion order.
    #[must_use]
    pub fn with_hand(self, handedness: Handedness, hand: RecordedHand) -> Self {
        let id = self.next_source_id();
        self.with_source(RecordedInputSource::hand(id, handedness, hand))
    }

    /// Record poses relative to `reference`.
    #[must_use]
    pub fn in_reference(mut self, reference: ReferenceSpace) -> Self {
        self.reference = reference;
        self
    }

    /// Remove the joint pose capability.
    #[must_use]
    pub fn without_pose_query(mut self) -> Self {
        self.pose_query_available = false;
        self
    }

    fn next_source_id(&self) -> u32 {
        self.sources.iter().map(|s| s.id + 1).max().unwrap_or(0)
    }
}

impl JointPoseQuery for RecordedFrame {
    fn joint_pose(&self, space: JointSpace, reference: ReferenceSpace) -> Option<XrJointPose> {
        if reference != self.reference {
            return None;
        }
        self.sources
            .iter()
            .find(|s| s.id == space.source)?
            .hand
            .as_ref()?
            .joints
            .get(&space.joint)
            .copied()
            .flatten()
    }
}

impl XrFrame for RecordedFrame {
    fn input_sources(&self) -> Vec<&dyn XrInputSource> {
        self.sources
            .iter()
            .map(|s| s as &dyn XrInputSource)
            .collect()
    }

    fn pose_query(&self) -> Option<&dyn JointPoseQuery> {
        self.pose_query_available
            .then_some(self as &dyn JointPoseQuery)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_joint_space_and_pose() {
        let frame = RecordedFrame::new().with_hand(
            Handedness::Left,
            RecordedHand::new()
                .with_joint(HandJoint::Wrist, Point3::new(0.1, 0.2, 0.3))
                .with_unresolved_joint(HandJoint::ThumbTip),
        );

        let sources = frame.input_sources();
        assert_eq!(sources.len(), 1);
        let hand = sources[0].hand().unwrap();

        let wrist = hand.joint_space(HandJoint::Wrist).unwrap();
        let query = frame.pose_query().unwrap();
        let pose = query.joint_pose(wrist, ReferenceSpace::LocalFloor).unwrap();
        assert_eq!(pose.position, Point3::new(0.1, 0.2, 0.3));

        let thumb = hand.joint_space(HandJoint::ThumbTip).unwrap();
        assert!(query.joint_pose(thumb, ReferenceSpace::LocalFloor).is_none());
        assert!(hand.joint_space(HandJoint::IndexFingerTip).is_none());
    }

    #[test]
    fn test_other_reference_does_not_resolve() {
        let frame = RecordedFrame::new().with_hand(
            Handedness::Right,
            RecordedHand::new().with_joint(HandJoint::Wrist, Point3::origin()),
        );
        let space = frame.input_sources()[0]
            .hand()
            .unwrap()
            .joint_space(HandJoint::Wrist)
            .unwrap();
        assert!(frame
            .pose_query()
            .unwrap()
            .joint_pose(space, ReferenceSpace::Viewer)
            .is_none());
    }

    #[test]
    fn test_source_ids_are_distinct() {
        let frame = RecordedFrame::new()
            .with_hand(Handedness::Left, RecordedHand::new())
            .with_hand(Handedness::Right, RecordedHand::new());
        assert_eq!(frame.sources[0].id, 0);
        assert_eq!(frame.sources[1].id, 1);
    }

    #[test]
    fn test_without_hand_feed() {
        let frame = RecordedFrame::new()
            .with_source(RecordedInputSource::without_hand(3, Handedness::Left));
        assert!(frame.input_sources()[0].hand().is_none());
    }

    #[test]
    fn test_without_pose_query() {
        let frame = RecordedFrame::new().without_pose_query();
        assert!(frame.pose_query().is_none());
    }

    #[test]
    fn test_synthetic_hand_pinch_gap() {
        let hand = RecordedHand::synthetic(
            Point3::new(0.0, 1.0, 0.0),
            UnitQuaternion::identity(),
            0.01,
        );
        assert_eq!(hand.joints.len(), 25);

        let thumb = hand.joints[&HandJoint::ThumbTip].unwrap();
        let index = hand.joints[&HandJoint::IndexFingerTip].unwrap();
        assert_relative_eq!(
            nalgebra::distance(&thumb.position, &index.position),
            0.01,
            epsilon = 1e-12
        );
        let wrist = hand.joints[&HandJoint::Wrist].unwrap();
        assert_eq!(wrist.position, Point3::new(0.0, 1.0, 0.0));
    }
}
