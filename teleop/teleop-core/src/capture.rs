//! Post-step world snapshots.

use hashbrown::HashMap;
use nalgebra::{Point3, UnitQuaternion};
use teleop_physics::PhysicsWorld;
use teleop_types::{
    ArmState, MonotonicClock, ObjectState, Result, Side, SimulationState, TeleopError,
    GRIPPER_OPEN, UNKNOWN_OBJECT_TYPE,
};
use tracing::debug;

use crate::grasp::GraspManager;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default body id of the left gripper.
pub const DEFAULT_LEFT_GRIPPER: &str = "gripper-left";
/// Default body id of the right gripper.
pub const DEFAULT_RIGHT_GRIPPER: &str = "gripper-right";

/// Gripper body ids per arm side.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArmIds {
    /// Left gripper body.
    pub left: String,
    /// Right gripper body.
    pub right: String,
}

impl Default for ArmIds {
    fn default() -> Self {
        Self {
            left: DEFAULT_LEFT_GRIPPER.to_owned(),
            right: DEFAULT_RIGHT_GRIPPER.to_owned(),
        }
    }
}

impl ArmIds {
    /// Explicit ids.
    #[must_use]
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Gripper id for `side`.
    #[must_use]
    pub fn get(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Side owning `gripper_id`, if any.
    #[must_use]
    pub fn side_of(&self, gripper_id: &str) -> Option<Side> {
        Side::BOTH.into_iter().find(|&s| self.get(s) == gripper_id)
    }
}

/// What to read from the world on capture.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CaptureConfig {
    /// Gripper ids per arm.
    pub arm_ids: ArmIds,
    /// Tracked object ids, in snapshot order.
    pub object_ids: Vec<String>,
    /// Type tags by object id.
    pub object_types: HashMap<String, String>,
}

impl CaptureConfig {
    /// Default arm ids, no objects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gripper ids.
    #[must_use]
    pub fn with_arm_ids(mut self, arm_ids: ArmIds) -> Self {
        self.arm_ids = arm_ids;
        self
    }

    /// Track an object with a type tag.
    #[must_use]
    pub fn with_object(mut self, id: impl Into<String>, object_type: impl Into<String>) -> Self {
        self.track(id, Some(object_type.into()));
        self
    }

    /// Track an object without a type tag.
    #[must_use]
    pub fn with_untyped_object(mut self, id: impl Into<String>) -> Self {
        self.track(id, None);
        self
    }

    /// Track an object. Re-tracking an id keeps its position in the order
    /// and replaces its tag.
    pub fn track(&mut self, id: impl Into<String>, object_type: Option<String>) {
        let id = id.into();
        if !self.object_ids.contains(&id) {
            self.object_ids.push(id.clone());
        }
        match object_type {
            Some(t) => {
                self.object_types.insert(id, t);
            }
            None => {
                self.object_types.remove(&id);
            }
        }
    }

    /// Stop tracking all objects.
    pub fn clear_objects(&mut self) {
        self.object_ids.clear();
        self.object_types.clear();
    }

    /// Type tag for `id`, `"unknown"` when untyped.
    #[must_use]
    pub fn object_type(&self, id: &str) -> &str {
        self.object_types
            .get(id)
            .map_or(UNKNOWN_OBJECT_TYPE, String::as_str)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.arm_ids.left.is_empty() || self.arm_ids.right.is_empty() {
            return Err(TeleopError::invalid_config("gripper ids must be non-empty"));
        }
        if self.arm_ids.left == self.arm_ids.right {
            return Err(TeleopError::invalid_config(format!(
                "left and right arms share gripper id '{}'",
                self.arm_ids.left
            )));
        }
        Ok(())
    }
}

/// Reads [`SimulationState`] snapshots out of a physics world.
///
/// Missing bodies never fail a capture: a missing gripper yields
/// [`ArmState::default`], a missing object an origin placeholder.
#[derive(Debug, Clone, Default)]
pub struct StateCapture {
    config: CaptureConfig,
    clock: MonotonicClock,
}

impl StateCapture {
    /// Create a capture with its own clock.
    #[must_use]
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            clock: MonotonicClock::new(),
        }
    }

    /// Stamp snapshots with `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: MonotonicClock) -> Self {
        self.clock = clock;
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Mutable configuration, e.g. to install a task's objects.
    pub fn config_mut(&mut self) -> &mut CaptureConfig {
        &mut self.config
    }

    /// Take a snapshot.
    pub fn capture<W: PhysicsWorld + ?Sized>(
        &self,
        world: &W,
        grasps: &GraspManager,
    ) -> SimulationState {
        let objects = self
            .config
            .object_ids
            .iter()
            .map(|id| self.capture_object(world, id))
            .collect();

        SimulationState {
            timestamp: self.clock.now_ms(),
            left_arm: self.capture_arm(world, grasps, Side::Left),
            right_arm: self.capture_arm(world, grasps, Side::Right),
            objects,
        }
    }

    fn capture_arm<W: PhysicsWorld + ?Sized>(
        &self,
        world: &W,
        grasps: &GraspManager,
        side: Side,
    ) -> ArmState {
        let gripper_id = self.config.arm_ids.get(side);
        let Some(pose) = world.body_pose(gripper_id) else {
            debug!(side = %side, gripper_id, "Gripper body missing, using default arm state");
            return ArmState::default();
        };

        ArmState {
            end_effector_position: pose.position,
            end_effector_orientation: pose.rotation,
            gripper_open: GRIPPER_OPEN,
            is_grasping: grasps.is_grasping(gripper_id),
            grasped_object_id: grasps.grasped_object_id(gripper_id).map(str::to_owned),
        }
    }

    fn capture_object<W: PhysicsWorld + ?Sized>(&self, world: &W, id: &str) -> ObjectState {
        let object_type = self.config.object_type(id);
        match world.body_pose(id) {
            Some(pose) => ObjectState {
                id: id.to_owned(),
                position: pose.position,
                orientation: pose.rotation,
                object_type: object_type.to_owned(),
            },
            None => {
                debug!(object_id = id, "Object body missing, using placeholder");
                ObjectState {
                    id: id.to_owned(),
                    position: Point3::origin(),
                    orientation: UnitQuaternion::identity(),
                    object_type: object_type.to_owned(),
                }
            }
        }
    }
}
