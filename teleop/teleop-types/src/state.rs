//! Immutable per-tick simulation snapshots.
//!
//! A [`SimulationState`] always reflects exactly one completed physics step.
//! Consumers (scoring, visualization, logging) only ever read it.

use nalgebra::{Point3, UnitQuaternion};

use crate::action::GRIPPER_OPEN;
use crate::hand::Side;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type tag used for objects without a configured type.
pub const UNKNOWN_OBJECT_TYPE: &str = "unknown";

/// Snapshot of one arm's end effector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArmState {
    /// End-effector position in world coordinates.
    pub end_effector_position: Point3<f64>,
    /// End-effector orientation.
    pub end_effector_orientation: UnitQuaternion<f64>,
    /// Gripper openness in `[0, 1]`.
    pub gripper_open: f64,
    /// Whether a grasp constraint is active for this arm's gripper.
    pub is_grasping: bool,
    /// Id of the grasped object, if any.
    pub grasped_object_id: Option<String>,
}

impl Default for ArmState {
    /// Origin, identity, open, not grasping.
    fn default() -> Self {
        Self {
            end_effector_position: Point3::origin(),
            end_effector_orientation: UnitQuaternion::identity(),
            gripper_open: GRIPPER_OPEN,
            is_grasping: false,
            grasped_object_id: None,
        }
    }
}

/// Snapshot of one tracked object.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObjectState {
    /// Body id.
    pub id: String,
    /// World position.
    pub position: Point3<f64>,
    /// World orientation.
    pub orientation: UnitQuaternion<f64>,
    /// Object type tag (`"unknown"` when untyped).
    pub object_type: String,
}

impl ObjectState {
    /// Placeholder for an object whose body is missing.
    #[must_use]
    pub fn placeholder(id: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: Point3::origin(),
            orientation: UnitQuaternion::identity(),
            object_type: object_type.into(),
        }
    }
}

/// Atomic snapshot handed to scoring and logging.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationState {
    /// Capture time in milliseconds on a monotonic clock.
    pub timestamp: f64,
    /// Left arm.
    pub left_arm: ArmState,
    /// Right arm.
    pub right_arm: ArmState,
    /// Tracked objects, in configured order.
    pub objects: Vec<ObjectState>,
}

impl SimulationState {
    /// Arm snapshot for one side.
    #[must_use]
    pub const fn arm(&self, side: Side) -> &ArmState {
        match side {
            Side::Left => &self.left_arm,
            Side::Right => &self.right_arm,
        }
    }

    /// Look up an object by id.
    #[must_use]
    pub fn object(&self, id: &str) -> Option<&ObjectState> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Whether either arm holds a grasp.
    #[must_use]
    pub fn any_grasping(&self) -> bool {
        self.left_arm.is_grasping || self.right_arm.is_grasping
    }
}
