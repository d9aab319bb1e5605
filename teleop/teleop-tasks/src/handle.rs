//! Handle rotation: swing a hinged lever to a target angle.

use std::f64::consts::FRAC_PI_2;

use nalgebra::{Point3, Unit, Vector3};
use teleop_core::TrackedObject;
use teleop_physics::solver::hinge_angle;
use teleop_physics::PhysicsWorld;
use teleop_types::{
    BodyDescriptor, ColliderShape, EpisodeConfig, JointLimits, Pose, Result, TeleopError,
};
use tracing::debug;

use crate::spawn::{restore_body, Spawned};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Body id of the fixed handle mount.
pub const HANDLE_MOUNT_ID: &str = "handle-mount";
/// Body id of the lever.
pub const HANDLE_LEVER_ID: &str = "handle-lever";
/// Type tag of the lever.
pub const HANDLE_TYPE: &str = "handle";

/// Lever half thickness in Y and Z.
const LEVER_HALF_THICKNESS: f64 = 0.0125;

/// Handle configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HandleConfig {
    /// Mount center; the lever's pivot end sits here.
    pub position: Point3<f64>,
    /// Hinge axis, in both bodies' local frames.
    pub axis: Vector3<f64>,
    /// Lever rotation that counts as success (radians).
    pub target_angle: f64,
    /// Lowest hinge angle; the lever rests here under gravity (radians).
    pub min_angle: f64,
    /// Highest hinge angle (radians).
    pub max_angle: f64,
    /// Allowed deviation from `target_angle` (radians).
    pub tolerance: f64,
    /// Lever length along local X (meters).
    pub length: f64,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            position: Point3::new(0.3, 1.0, -0.3),
            axis: Vector3::z(),
            target_angle: FRAC_PI_2,
            min_angle: 0.0,
            max_angle: FRAC_PI_2,
            tolerance: 0.1,
            length: 0.15,
        }
    }
}

impl HandleConfig {
    /// Set the target angle.
    #[must_use]
    pub fn with_target_angle(mut self, angle: f64) -> Self {
        self.target_angle = angle;
        self
    }

    /// Set the hinge range.
    #[must_use]
    pub fn with_angle_range(mut self, min_angle: f64, max_angle: f64) -> Self {
        self.min_angle = min_angle;
        self.max_angle = max_angle;
        self
    }

    /// Hinge range as joint limits.
    #[must_use]
    pub const fn limits(&self) -> JointLimits {
        JointLimits::new(self.min_angle, self.max_angle)
    }

    /// Set the lever length.
    #[must_use]
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    /// Lever center at rest.
    #[must_use]
    pub fn lever_rest_position(&self) -> Point3<f64> {
        self.position + Vector3::new(self.length / 2.0, 0.0, 0.0)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.position.coords.iter().all(|c| c.is_finite()) {
            return Err(TeleopError::invalid_config("handle position must be finite"));
        }
        if !self.axis.iter().all(|c| c.is_finite()) || self.axis.norm() < 1e-9 {
            return Err(TeleopError::invalid_config("handle axis must be a non-zero vector"));
        }
        if !self.target_angle.is_finite() || !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(TeleopError::invalid_config(
                "handle target_angle and tolerance must be finite, tolerance non-negative",
            ));
        }
        if !self.min_angle.is_finite()
            || !self.max_angle.is_finite()
            || self.min_angle > self.max_angle
        {
            return Err(TeleopError::invalid_config(format!(
                "handle angle range must be finite and ordered, got [{}, {}]",
                self.min_angle, self.max_angle
            )));
        }
        if !self.limits().contains(self.target_angle) {
            return Err(TeleopError::invalid_config(format!(
                "handle target_angle {} lies outside [{}, {}]",
                self.target_angle, self.min_angle, self.max_angle
            )));
        }
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(TeleopError::invalid_config(format!(
                "handle length must be positive, got {}",
                self.length
            )));
        }
        Ok(())
    }
}

/// Handle rotation task instance.
///
/// The lever is hinged at one end and starts horizontal. Gravity holds it
/// against `min_angle`; the operator has to lift it toward the target.
#[derive(Debug, Clone, Default)]
pub struct HandleRotationTask {
    config: HandleConfig,
    spawned: Spawned,
}

impl HandleRotationTask {
    /// Create an unloaded task.
    #[must_use]
    pub fn new(config: HandleConfig) -> Self {
        Self {
            config,
            spawned: Spawned::default(),
        }
    }

    /// Task configuration.
    #[must_use]
    pub const fn config(&self) -> &HandleConfig {
        &self.config
    }

    /// Spawn the mount, the lever and the hinge at the lever's end.
    pub fn setup<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        _episode: &EpisodeConfig,
    ) -> Result<()> {
        self.teardown(world);
        self.config.validate()?;
        let c = self.config;
        let half = c.length / 2.0;

        self.spawned.body(
            world,
            BodyDescriptor::fixed(HANDLE_MOUNT_ID)
                .with_position(c.position)
                .with_collider(ColliderShape::cuboid(0.02, 0.02, 0.02)),
        )?;
        self.spawned.body(
            world,
            BodyDescriptor::dynamic(HANDLE_LEVER_ID)
                .with_position(c.lever_rest_position())
                .with_collider(ColliderShape::cuboid(
                    half,
                    LEVER_HALF_THICKNESS,
                    LEVER_HALF_THICKNESS,
                )),
        )?;
        let joint = world.create_revolute_joint(
            HANDLE_MOUNT_ID,
            HANDLE_LEVER_ID,
            Point3::origin(),
            Point3::new(-half, 0.0, 0.0),
            c.axis,
        )?;
        self.spawned.joint(joint);
        world.set_joint_limits(joint, c.limits())?;

        debug!(
            %joint,
            target_angle = c.target_angle,
            min_angle = c.min_angle,
            max_angle = c.max_angle,
            "Handle ready"
        );
        Ok(())
    }

    /// Remove everything `setup` created.
    pub fn teardown<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        self.spawned.clear(world);
    }

    /// Put the lever back horizontal at rest.
    pub fn reset<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<()> {
        let rest = Pose::from_position(self.config.lever_rest_position());
        restore_body(world, HANDLE_LEVER_ID, rest)
    }

    /// Signed hinge angle of the lever relative to the mount, positive
    /// when lifted. Zero when either body is missing.
    #[must_use]
    pub fn current_angle<W: PhysicsWorld + ?Sized>(&self, world: &W) -> f64 {
        let (Some(mount), Some(lever)) = (
            world.body_pose(HANDLE_MOUNT_ID),
            world.body_pose(HANDLE_LEVER_ID),
        ) else {
            return 0.0;
        };
        Unit::try_new(self.config.axis, 1e-9)
            .map_or(0.0, |axis| hinge_angle(&mount, &lever, &axis))
    }

    /// The lever is within tolerance of the target.
    #[must_use]
    pub fn check_success<W: PhysicsWorld + ?Sized>(&self, world: &W) -> bool {
        (self.current_angle(world) - self.config.target_angle).abs() <= self.config.tolerance
    }

    /// Angle over target, within `[0, 1]`. A zero target is complete.
    #[must_use]
    pub fn progress<W: PhysicsWorld + ?Sized>(&self, world: &W) -> f64 {
        if self.config.target_angle == 0.0 {
            return 1.0;
        }
        (self.current_angle(world) / self.config.target_angle).clamp(0.0, 1.0)
    }

    /// The lever.
    #[must_use]
    pub fn tracked_objects(&self) -> Vec<TrackedObject> {
        if self.spawned.is_empty() {
            return Vec::new();
        }
        vec![TrackedObject::new(HANDLE_LEVER_ID, HANDLE_TYPE)]
    }
}
