//! Hand tracking data types.
//!
//! Models the 25 joints per hand exposed by WebXR hand input (wrist plus
//! 24 finger joints), per-joint pose samples, and the assembled per-frame
//! [`HandPose`].

use hashbrown::HashMap;
use nalgebra::{Point3, Quaternion, UnitQuaternion};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Joint radius used when the tracking source does not report one (meters).
pub const DEFAULT_JOINT_RADIUS: f64 = 0.005;

/// Default thumb-to-index distance below which a pinch is reported (meters).
pub const PINCH_THRESHOLD: f64 = 0.02;

/// Build an orientation from raw `(x, y, z, w)` components.
///
/// No normalization is performed. Tracking runtimes already deliver unit
/// quaternions and downstream Euler decoding reads the raw components.
#[must_use]
pub fn quat_from_xyzw(x: f64, y: f64, z: f64, w: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::new_unchecked(Quaternion::new(w, x, y, z))
}

/// Left or right, for hands and for the arms they drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Side {
    /// Left hand / left arm.
    Left,
    /// Right hand / right arm.
    Right,
}

impl Side {
    /// Both sides, left first.
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    /// String representation (`"left"` / `"right"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handedness tag carried by a tracked input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Handedness {
    /// Not associated with a hand (gaze, screen input, ...).
    #[default]
    None,
    /// Left hand.
    Left,
    /// Right hand.
    Right,
}

impl Handedness {
    /// The hand side, or `None` for sources that are neither left nor right.
    #[must_use]
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::Left => Some(Side::Left),
            Self::Right => Some(Side::Right),
            Self::None => None,
        }
    }
}

/// The 25 tracked hand joints, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[allow(missing_docs)]
pub enum HandJoint {
    Wrist,
    ThumbMetacarpal,
    ThumbPhalanxProximal,
    ThumbPhalanxDistal,
    ThumbTip,
    IndexFingerMetacarpal,
    IndexFingerPhalanxProximal,
    IndexFingerPhalanxIntermediate,
    IndexFingerPhalanxDistal,
    IndexFingerTip,
    MiddleFingerMetacarpal,
    MiddleFingerPhalanxProximal,
    MiddleFingerPhalanxIntermediate,
    MiddleFingerPhalanxDistal,
    MiddleFingerTip,
    RingFingerMetacarpal,
    RingFingerPhalanxProximal,
    RingFingerPhalanxIntermediate,
    RingFingerPhalanxDistal,
    RingFingerTip,
    PinkyFingerMetacarpal,
    PinkyFingerPhalanxProximal,
    PinkyFingerPhalanxIntermediate,
    PinkyFingerPhalanxDistal,
    PinkyFingerTip,
}

/// Number of joints per hand.
pub const JOINT_COUNT: usize = 25;

/// Wrist followed by the 24 finger joints, in the order they are queried.
pub const ALL_JOINTS: [HandJoint; JOINT_COUNT] = [
    HandJoint::Wrist,
    HandJoint::ThumbMetacarpal,
    HandJoint::ThumbPhalanxProximal,
    HandJoint::ThumbPhalanxDistal,
    HandJoint::ThumbTip,
    HandJoint::IndexFingerMetacarpal,
    HandJoint::IndexFingerPhalanxProximal,
    HandJoint::IndexFingerPhalanxIntermediate,
    HandJoint::IndexFingerPhalanxDistal,
    HandJoint::IndexFingerTip,
    HandJoint::MiddleFingerMetacarpal,
    HandJoint::MiddleFingerPhalanxProximal,
    HandJoint::MiddleFingerPhalanxIntermediate,
    HandJoint::MiddleFingerPhalanxDistal,
    HandJoint::MiddleFingerTip,
    HandJoint::RingFingerMetacarpal,
    HandJoint::RingFingerPhalanxProximal,
    HandJoint::RingFingerPhalanxIntermediate,
    HandJoint::RingFingerPhalanxDistal,
    HandJoint::RingFingerTip,
    HandJoint::PinkyFingerMetacarpal,
    HandJoint::PinkyFingerPhalanxProximal,
    HandJoint::PinkyFingerPhalanxIntermediate,
    HandJoint::PinkyFingerPhalanxDistal,
    HandJoint::PinkyFingerTip,
];

impl HandJoint {
    /// Position of this joint in [`ALL_JOINTS`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// WebXR joint name (e.g. `"index-finger-tip"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbMetacarpal => "thumb-metacarpal",
            Self::ThumbPhalanxProximal => "thumb-phalanx-proximal",
            Self::ThumbPhalanxDistal => "thumb-phalanx-distal",
            Self::ThumbTip => "thumb-tip",
            Self::IndexFingerMetacarpal => "index-finger-metacarpal",
            Self::IndexFingerPhalanxProximal => "index-finger-phalanx-proximal",
            Self::IndexFingerPhalanxIntermediate => "index-finger-phalanx-intermediate",
            Self::IndexFingerPhalanxDistal => "index-finger-phalanx-distal",
            Self::IndexFingerTip => "index-finger-tip",
            Self::MiddleFingerMetacarpal => "middle-finger-metacarpal",
            Self::MiddleFingerPhalanxProximal => "middle-finger-phalanx-proximal",
            Self::MiddleFingerPhalanxIntermediate => "middle-finger-phalanx-intermediate",
            Self::MiddleFingerPhalanxDistal => "middle-finger-phalanx-distal",
            Self::MiddleFingerTip => "middle-finger-tip",
            Self::RingFingerMetacarpal => "ring-finger-metacarpal",
            Self::RingFingerPhalanxProximal => "ring-finger-phalanx-proximal",
            Self::RingFingerPhalanxIntermediate => "ring-finger-phalanx-intermediate",
            Self::RingFingerPhalanxDistal => "ring-finger-phalanx-distal",
            Self::RingFingerTip => "ring-finger-tip",
            Self::PinkyFingerMetacarpal => "pinky-finger-metacarpal",
            Self::PinkyFingerPhalanxProximal => "pinky-finger-phalanx-proximal",
            Self::PinkyFingerPhalanxIntermediate => "pinky-finger-phalanx-intermediate",
            Self::PinkyFingerPhalanxDistal => "pinky-finger-phalanx-distal",
            Self::PinkyFingerTip => "pinky-finger-tip",
        }
    }

    /// Parse a WebXR joint name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_JOINTS.iter().copied().find(|j| j.as_str() == name)
    }

    /// Whether this is one of the five fingertip joints.
    #[must_use]
    pub const fn is_tip(self) -> bool {
        matches!(
            self,
            Self::ThumbTip
                | Self::IndexFingerTip
                | Self::MiddleFingerTip
                | Self::RingFingerTip
                | Self::PinkyFingerTip
        )
    }
}

impl std::fmt::Display for HandJoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pose sample for one tracked joint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointData {
    /// Position in the reference frame (meters).
    pub position: Point3<f64>,
    /// Orientation in the reference frame.
    pub orientation: UnitQuaternion<f64>,
    /// Joint radius (meters).
    pub radius: f64,
}

impl JointData {
    /// Create a joint sample.
    #[must_use]
    pub const fn new(position: Point3<f64>, orientation: UnitQuaternion<f64>, radius: f64) -> Self {
        Self {
            position,
            orientation,
            radius,
        }
    }

    /// Joint at `position` with identity orientation and the default radius.
    #[must_use]
    pub fn at(position: Point3<f64>) -> Self {
        Self::new(position, UnitQuaternion::identity(), DEFAULT_JOINT_RADIUS)
    }
}

/// Joint map for one hand. Keys are unique; iteration order is unspecified.
pub type JointMap = HashMap<HandJoint, JointData>;

/// Result of pinch detection for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinchState {
    /// Whether thumb and index tips are closer than the threshold.
    pub is_pinching: bool,
    /// Thumb-to-index tip distance, `f64::INFINITY` if either tip is missing.
    pub distance: f64,
}

impl PinchState {
    /// The state reported when a fingertip is not tracked.
    #[must_use]
    pub const fn untracked() -> Self {
        Self {
            is_pinching: false,
            distance: f64::INFINITY,
        }
    }

    /// Whether both fingertips were available for this reading.
    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.distance.is_finite()
    }
}

/// Normalized pose of one hand, rebuilt from scratch every tracked frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HandPose {
    /// Which hand.
    pub handedness: Side,
    /// Monotonic capture time in milliseconds.
    pub timestamp: f64,
    /// Every joint that resolved this frame. Never empty.
    pub joints: JointMap,
    /// Pinch reading derived from `joints`.
    pub pinch_state: PinchState,
    /// Wrist position, origin when the wrist joint did not resolve.
    pub wrist_position: Point3<f64>,
    /// Wrist orientation, identity when the wrist joint did not resolve.
    pub wrist_orientation: UnitQuaternion<f64>,
}

impl HandPose {
    /// Look up a single joint.
    #[must_use]
    pub fn joint(&self, joint: HandJoint) -> Option<&JointData> {
        self.joints.get(&joint)
    }

    /// Number of joints that resolved.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }
}
