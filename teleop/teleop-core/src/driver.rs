//! Applying arm commands to the world.
//!
//! The stepper hands every [`DualArmAction`] to an [`ArmDriver`] once per
//! side before the physics step. A driver owns whatever turns a delta
//! command into body motion; [`KinematicGripperDriver`] moves free-floating
//! kinematic gripper bodies directly.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use teleop_physics::PhysicsWorld;
use teleop_types::{
    BodyDescriptor, ColliderShape, DualArmAction, Pose, Result, Side, TeleopError,
};
use tracing::debug;

use crate::capture::ArmIds;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Moves one arm toward a commanded delta.
pub trait ArmDriver<W: PhysicsWorld + ?Sized> {
    /// Apply `action`'s command for `side`.
    fn apply(&mut self, world: &mut W, side: Side, action: &DualArmAction) -> Result<()>;
}

/// Driver that ignores every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDriver;

impl<W: PhysicsWorld + ?Sized> ArmDriver<W> for NullDriver {
    fn apply(&mut self, _world: &mut W, _side: Side, _action: &DualArmAction) -> Result<()> {
        Ok(())
    }
}

/// Kinematic gripper driver configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KinematicDriverConfig {
    /// Gripper body ids.
    pub arm_ids: ArmIds,
    /// Longest translation applied in one step (meters). `None` is
    /// unlimited.
    pub max_translation_per_step: Option<f64>,
    /// Spawn position of the left gripper.
    pub left_home: Point3<f64>,
    /// Spawn position of the right gripper.
    pub right_home: Point3<f64>,
    /// Gripper collider half extents.
    pub gripper_half_extents: Vector3<f64>,
}

impl Default for KinematicDriverConfig {
    fn default() -> Self {
        Self {
            arm_ids: ArmIds::default(),
            max_translation_per_step: None,
            left_home: Point3::new(-0.4, 1.1, -0.3),
            right_home: Point3::new(0.4, 1.1, -0.3),
            gripper_half_extents: Vector3::new(0.02, 0.03, 0.02),
        }
    }
}

impl KinematicDriverConfig {
    /// Set the gripper ids.
    #[must_use]
    pub fn with_arm_ids(mut self, arm_ids: ArmIds) -> Self {
        self.arm_ids = arm_ids;
        self
    }

    /// Clamp per-step translation.
    #[must_use]
    pub fn with_max_translation(mut self, max: f64) -> Self {
        self.max_translation_per_step = Some(max);
        self
    }

    /// Set both home positions.
    #[must_use]
    pub fn with_homes(mut self, left: Point3<f64>, right: Point3<f64>) -> Self {
        self.left_home = left;
        self.right_home = right;
        self
    }

    /// Home position for `side`.
    #[must_use]
    pub fn home(&self, side: Side) -> Point3<f64> {
        match side {
            Side::Left => self.left_home,
            Side::Right => self.right_home,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if let Some(max) = self.max_translation_per_step {
            if !max.is_finite() || max <= 0.0 {
                return Err(TeleopError::invalid_config(format!(
                    "max_translation_per_step must be positive, got {max}"
                )));
            }
        }
        let mut homes = self.left_home.coords.iter().chain(self.right_home.coords.iter());
        if !homes.all(|c| c.is_finite()) {
            return Err(TeleopError::invalid_config("gripper homes must be finite"));
        }
        let he = self.gripper_half_extents;
        if !ColliderShape::cuboid(he.x, he.y, he.z).is_valid() {
            return Err(TeleopError::invalid_config(
                "gripper half extents must be positive",
            ));
        }
        Ok(())
    }
}

/// Drives kinematic gripper bodies by direct pose writes.
///
/// Translation adds `(dx, dy, dz)` to the gripper position; rotation
/// pre-multiplies the world-frame roll/pitch/yaw delta. Grippers whose body
/// is missing are skipped.
#[derive(Debug, Clone, Default)]
pub struct KinematicGripperDriver {
    config: KinematicDriverConfig,
}

impl KinematicGripperDriver {
    /// Create a driver.
    #[must_use]
    pub const fn new(config: KinematicDriverConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &KinematicDriverConfig {
        &self.config
    }

    /// Add any missing gripper bodies at their home positions. Existing
    /// grippers are left where they are.
    pub fn spawn_grippers<W: PhysicsWorld + ?Sized>(&self, world: &mut W) -> Result<()> {
        let he = self.config.gripper_half_extents;
        for side in Side::BOTH {
            let id = self.config.arm_ids.get(side);
            if world.has_body(id) {
                continue;
            }
            world.add_body(
                BodyDescriptor::kinematic(id)
                    .with_position(self.config.home(side))
                    .with_collider(ColliderShape::cuboid(he.x, he.y, he.z)),
            )?;
            debug!(side = %side, gripper_id = id, "Spawned gripper");
        }
        Ok(())
    }

    /// Move both grippers back to their homes with identity orientation,
    /// at rest.
    pub fn home_grippers<W: PhysicsWorld + ?Sized>(&self, world: &mut W) -> Result<()> {
        for side in Side::BOTH {
            let id = self.config.arm_ids.get(side);
            if world.has_body(id) {
                world.teleport_body(id, Pose::from_position(self.config.home(side)))?;
            }
        }
        Ok(())
    }

    fn clamp_translation(&self, delta: Vector3<f64>) -> Vector3<f64> {
        match self.config.max_translation_per_step {
            Some(max) if delta.norm() > max => delta.normalize() * max,
            _ => delta,
        }
    }
}

impl<W: PhysicsWorld + ?Sized> ArmDriver<W> for KinematicGripperDriver {
    fn apply(&mut self, world: &mut W, side: Side, action: &DualArmAction) -> Result<()> {
        let id = self.config.arm_ids.get(side);
        let Some(pose) = world.body_pose(id) else {
            return Ok(());
        };
        let command = action.get(side);

        let delta = self.clamp_translation(Vector3::new(command.dx, command.dy, command.dz));
        let turn = UnitQuaternion::from_euler_angles(command.droll, command.dpitch, command.dyaw);

        world.set_pose(
            id,
            Pose::from_position_rotation(pose.position + delta, turn * pose.rotation),
        )
    }
}
