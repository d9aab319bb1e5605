//! Spatial-tracking input abstraction.
//!
//! Mirrors the shape of WebXR / OpenXR hand input: each frame exposes zero
//! or more input sources, a source may carry a hand, a hand exposes one
//! tracking space per joint, and the frame may be able to resolve a joint
//! space into a pose relative to a reference space. Any of these may be
//! missing on a given frame.

use nalgebra::{Point3, UnitQuaternion};
use teleop_types::{HandJoint, Handedness};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reference coordinate frames a joint pose can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ReferenceSpace {
    /// Head-locked frame.
    Viewer,
    /// Origin near the viewer's starting position.
    Local,
    /// Like `Local` with the origin on the floor.
    #[default]
    LocalFloor,
    /// Floor-level frame with a known boundary.
    BoundedFloor,
    /// Large-scale frame without a fixed origin.
    Unbounded,
}

/// Opaque handle to one joint's tracking space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointSpace {
    /// Runtime-assigned id of the owning input source.
    pub source: u32,
    /// Joint this space tracks.
    pub joint: HandJoint,
}

/// A joint pose as delivered by the tracking runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct XrJointPose {
    /// Joint position in the reference space.
    pub position: Point3<f64>,
    /// Joint orientation in the reference space.
    pub orientation: UnitQuaternion<f64>,
    /// Joint radius, when the runtime reports one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub radius: Option<f64>,
}

impl XrJointPose {
    /// Pose at `position` with identity orientation and no radius.
    #[must_use]
    pub fn at(position: Point3<f64>) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::identity(),
            radius: None,
        }
    }

    /// Set the orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: UnitQuaternion<f64>) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }
}

/// A tracked hand: maps joint names to tracking spaces.
pub trait XrHand {
    /// Tracking space for `joint`, if the runtime exposes it.
    fn joint_space(&self, joint: HandJoint) -> Option<JointSpace>;
}

/// One tracked input source (hand, controller, gaze, ...).
pub trait XrInputSource {
    /// Handedness tag reported by the runtime.
    fn handedness(&self) -> Handedness;

    /// Hand-tracking feed, absent for controllers and untracked hands.
    fn hand(&self) -> Option<&dyn XrHand>;
}

/// Resolves joint spaces to poses for one frame.
pub trait JointPoseQuery {
    /// Pose of `space` relative to `reference`, if available this frame.
    fn joint_pose(&self, space: JointSpace, reference: ReferenceSpace) -> Option<XrJointPose>;
}

/// One animation frame of spatial-tracking input.
pub trait XrFrame {
    /// Currently active input sources.
    fn input_sources(&self) -> Vec<&dyn XrInputSource>;

    /// Joint pose capability, `None` if the frame cannot resolve joint poses
    /// at all.
    fn pose_query(&self) -> Option<&dyn JointPoseQuery>;
}
