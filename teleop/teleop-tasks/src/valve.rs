//! Valve turning: rotate a hinged wheel past a target angle.

use std::f64::consts::PI;

use nalgebra::{Point3, UnitQuaternion, Vector3};
use teleop_core::TrackedObject;
use teleop_physics::PhysicsWorld;
use teleop_types::{BodyDescriptor, ColliderShape, EpisodeConfig, Pose, Result, TeleopError};
use tracing::debug;

use crate::spawn::{restore_body, Spawned};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Body id of the fixed valve mount.
pub const VALVE_MOUNT_ID: &str = "valve-mount";
/// Body id of the turning wheel.
pub const VALVE_HANDLE_ID: &str = "valve-handle";
/// Type tag of the wheel.
pub const VALVE_TYPE: &str = "valve";

/// Magnitude of the rotation a quaternion represents, in `[0, π]`:
/// `2·acos(min(1, |w|))`. The axis is ignored.
#[must_use]
pub fn rotation_angle(rotation: &UnitQuaternion<f64>) -> f64 {
    2.0 * rotation.w.abs().min(1.0).acos()
}

/// Valve configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ValveConfig {
    /// Mount and wheel center.
    pub position: Point3<f64>,
    /// Hinge axis, in both bodies' local frames.
    pub axis: Vector3<f64>,
    /// Rotation magnitude that counts as success (radians).
    pub target_angle: f64,
    /// Wheel radius (meters).
    pub radius: f64,
    /// Wheel density.
    pub density: f64,
}

impl Default for ValveConfig {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 1.0, -0.4),
            axis: Vector3::z(),
            target_angle: PI,
            radius: 0.1,
            density: 2.0,
        }
    }
}

impl ValveConfig {
    /// Set the target angle.
    #[must_use]
    pub fn with_target_angle(mut self, angle: f64) -> Self {
        self.target_angle = angle;
        self
    }

    /// Set the hinge axis.
    #[must_use]
    pub fn with_axis(mut self, axis: Vector3<f64>) -> Self {
        self.axis = axis;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.position.coords.iter().all(|c| c.is_finite()) {
            return Err(TeleopError::invalid_config("valve position must be finite"));
        }
        if !self.axis.iter().all(|c| c.is_finite()) || self.axis.norm() < 1e-9 {
            return Err(TeleopError::invalid_config("valve axis must be a non-zero vector"));
        }
        if !self.target_angle.is_finite() {
            return Err(TeleopError::invalid_config("valve target_angle must be finite"));
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(TeleopError::invalid_config("valve radius must be positive"));
        }
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(TeleopError::invalid_config("valve density must be positive"));
        }
        Ok(())
    }
}

/// Valve turning task instance.
#[derive(Debug, Clone, Default)]
pub struct ValveTurningTask {
    config: ValveConfig,
    spawned: Spawned,
}

impl ValveTurningTask {
    /// Create an unloaded task.
    #[must_use]
    pub fn new(config: ValveConfig) -> Self {
        Self {
            config,
            spawned: Spawned::default(),
        }
    }

    /// Task configuration.
    #[must_use]
    pub const fn config(&self) -> &ValveConfig {
        &self.config
    }

    /// Spawn the mount, the wheel and the hinge between them.
    pub fn setup<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        _episode: &EpisodeConfig,
    ) -> Result<()> {
        self.teardown(world);
        self.config.validate()?;
        let c = self.config;

        self.spawned.body(
            world,
            BodyDescriptor::fixed(VALVE_MOUNT_ID)
                .with_position(c.position)
                .with_collider(ColliderShape::cylinder(0.025, 0.03)),
        )?;
        self.spawned.body(
            world,
            BodyDescriptor::dynamic(VALVE_HANDLE_ID)
                .with_position(c.position)
                .with_collider(ColliderShape::ball(c.radius))
                .with_density(c.density),
        )?;
        let joint = world.create_revolute_joint(
            VALVE_MOUNT_ID,
            VALVE_HANDLE_ID,
            Point3::origin(),
            Point3::origin(),
            c.axis,
        )?;
        self.spawned.joint(joint);

        debug!(%joint, target_angle = c.target_angle, "Valve ready");
        Ok(())
    }

    /// Remove everything `setup` created.
    pub fn teardown<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        self.spawned.clear(world);
    }

    /// Turn the wheel back to zero at rest.
    pub fn reset<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<()> {
        let rest = Pose::from_position(self.config.position);
        restore_body(world, VALVE_HANDLE_ID, rest)
    }

    /// Current wheel rotation magnitude. Zero when the wheel is missing.
    #[must_use]
    pub fn current_angle<W: PhysicsWorld + ?Sized>(&self, world: &W) -> f64 {
        world
            .body_pose(VALVE_HANDLE_ID)
            .map_or(0.0, |pose| rotation_angle(&pose.rotation))
    }

    /// The wheel has turned at least the target magnitude.
    #[must_use]
    pub fn check_success<W: PhysicsWorld + ?Sized>(&self, world: &W) -> bool {
        self.current_angle(world).abs() >= self.config.target_angle.abs()
    }

    /// Turned fraction of the target, capped at 1. A zero target is
    /// complete.
    #[must_use]
    pub fn progress<W: PhysicsWorld + ?Sized>(&self, world: &W) -> f64 {
        if self.config.target_angle == 0.0 {
            return 1.0;
        }
        (self.current_angle(world).abs() / self.config.target_angle.abs()).min(1.0)
    }

    /// The wheel.
    #[must_use]
    pub fn tracked_objects(&self) -> Vec<TrackedObject> {
        if self.spawned.is_empty() {
            return Vec::new();
        }
        vec![TrackedObject::new(VALVE_HANDLE_ID, VALVE_TYPE)]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;
    use teleop_physics::{PhysicsConfig, World};
    use teleop_types::TaskKind;

    fn loaded(config: ValveConfig) -> (World, ValveTurningTask) {
        let mut world = World::new(PhysicsConfig::default());
        let mut task = ValveTurningTask::new(config);
        task.setup(&mut world, &EpisodeConfig::new(TaskKind::ValveTurning))
            .unwrap();
        (world, task)
    }

    #[test]
    fn test_rotation_angle() {
        assert_eq!(rotation_angle(&UnitQuaternion::identity()), 0.0);
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        assert_relative_eq!(rotation_angle(&q), FRAC_PI_2, epsilon = 1e-12);
        let q = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -1.0);
        assert_relative_eq!(rotation_angle(&q), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_setup_creates_hinged_wheel() {
        let (world, task) = loaded(ValveConfig::default());
        assert!(world.has_body(VALVE_MOUNT_ID));
        assert!(world.has_body(VALVE_HANDLE_ID));
        assert_eq!(world.joint_count(), 1);
        assert_eq!(task.tracked_objects(), [TrackedObject::new("valve-handle", "valve")]);
    }

    #[test]
    fn test_wheel_stays_put_under_gravity() {
        let (mut world, task) = loaded(ValveConfig::default());
        for _ in 0..60 {
            world.step().unwrap();
        }
        let pose = world.body_pose(VALVE_HANDLE_ID).unwrap();
        assert_relative_eq!(pose.position.y, 1.0, epsilon = 1e-3);
        assert!(task.current_angle(&world) < 1e-3);
        assert!(!task.check_success(&world));
    }

    #[test]
    fn test_progress_and_success() {
        let (mut world, task) = loaded(ValveConfig::default().with_target_angle(3.0));
        assert_eq!(task.progress(&world), 0.0);

        let partial = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 1.5);
        world.set_rotation(VALVE_HANDLE_ID, partial).unwrap();
        assert_relative_eq!(task.progress(&world), 0.5, epsilon = 1e-9);
        assert!(!task.check_success(&world));

        let past = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 3.05);
        world.set_rotation(VALVE_HANDLE_ID, past).unwrap();
        assert_eq!(task.progress(&world), 1.0);
        assert!(task.check_success(&world));
    }

    #[test]
    fn test_zero_target_is_complete() {
        let (world, task) = loaded(ValveConfig::default().with_target_angle(0.0));
        assert_eq!(task.progress(&world), 1.0);
        assert!(task.check_success(&world));
    }

    #[test]
    fn test_reset_and_teardown() {
        let (mut world, mut task) = loaded(ValveConfig::default());
        world
            .set_rotation(
                VALVE_HANDLE_ID,
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 2.0),
            )
            .unwrap();
        task.reset(&mut world).unwrap();
        assert_eq!(task.current_angle(&world), 0.0);

        task.teardown(&mut world);
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.joint_count(), 0);
        assert_eq!(task.current_angle(&world), 0.0);
        assert!(task.tracked_objects().is_empty());
    }

    #[test]
    fn test_config_validation() {
        assert!(ValveConfig::default().validate().is_ok());
        assert!(ValveConfig::default()
            .with_axis(Vector3::zeros())
            .validate()
            .is_err());
        assert!(ValveConfig::default()
            .with_target_angle(f64::NAN)
            .validate()
            .is_err());
    }
}
