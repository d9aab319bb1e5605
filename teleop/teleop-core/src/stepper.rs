//! Per-tick simulation control flow.
//!
//! [`SimulationStepper`] owns the physics world and runs one tick as
//! three ordered stages:
//!
//! 1. the [`ArmDriver`] applies the left then the right command,
//! 2. the world advances by exactly one fixed timestep,
//! 3. [`StateCapture`] reads the post-step world.
//!
//! A snapshot therefore never mixes pre- and post-step readings.
//!
//! # Example
//!
//! ```
//! use teleop_core::{CaptureConfig, KinematicGripperDriver, SimulationStepper, StateCapture};
//! use teleop_physics::{PhysicsConfig, PhysicsWorld, World};
//! use teleop_types::DualArmAction;
//!
//! let driver = KinematicGripperDriver::default();
//! let mut world = World::new(PhysicsConfig::default());
//! driver.spawn_grippers(&mut world).unwrap();
//!
//! let mut stepper = SimulationStepper::new(world, driver, StateCapture::new(CaptureConfig::new()));
//! let mut action = DualArmAction::zero();
//! action.left.dy = 0.01;
//!
//! let state = stepper.step(&action).unwrap();
//! assert!((state.left_arm.end_effector_position.y - 1.11).abs() < 1e-9);
//! assert_eq!(stepper.world().step_count(), 1);
//! ```

use teleop_physics::PhysicsWorld;
use teleop_types::{DualArmAction, Result, Side, SimulationState};
use tracing::warn;

use crate::capture::{CaptureConfig, StateCapture};
use crate::driver::ArmDriver;
use crate::grasp::{GraspConstraint, GraspManager};

/// Drives a physics world one tick at a time.
#[derive(Debug)]
pub struct SimulationStepper<W, D> {
    world: W,
    driver: D,
    grasps: GraspManager,
    capture: StateCapture,
    state: SimulationState,
}

impl<W, D> SimulationStepper<W, D>
where
    W: PhysicsWorld,
    D: ArmDriver<W>,
{
    /// Create a stepper. The initial snapshot is the empty default state
    /// with timestamp 0.
    #[must_use]
    pub fn new(world: W, driver: D, capture: StateCapture) -> Self {
        Self {
            world,
            driver,
            grasps: GraspManager::new(),
            capture,
            state: SimulationState::default(),
        }
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Apply `action`, advance one timestep and capture the result.
    ///
    /// # Errors
    ///
    /// Propagates driver errors and physics divergence. The last good
    /// snapshot is kept in that case.
    pub fn step(&mut self, action: &DualArmAction) -> Result<SimulationState> {
        for side in Side::BOTH {
            self.driver.apply(&mut self.world, side, action)?;
        }

        if let Err(err) = self.world.step() {
            warn!(step = self.world.step_count(), %err, "Physics step failed");
            return Err(err);
        }

        self.state = self.capture.capture(&self.world, &self.grasps);
        Ok(self.state.clone())
    }

    /// Last captured snapshot, without stepping.
    #[must_use]
    pub const fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Release every grasp and capture a fresh snapshot. Physics time does
    /// not advance.
    pub fn reset(&mut self) -> SimulationState {
        self.grasps.release_all(&mut self.world);
        self.state = self.capture.capture(&self.world, &self.grasps);
        self.state.clone()
    }

    // =========================================================================
    // Grasping
    // =========================================================================

    /// Grasp `object_id` with `side`'s gripper.
    pub fn try_grasp(&mut self, side: Side, object_id: &str) -> Option<GraspConstraint> {
        let gripper = self.capture.config().arm_ids.get(side);
        self.grasps.try_grasp(&mut self.world, gripper, object_id)
    }

    /// Release `side`'s grasp. Returns whether one was held.
    pub fn release(&mut self, side: Side) -> bool {
        let gripper = self.capture.config().arm_ids.get(side);
        self.grasps.release(&mut self.world, gripper)
    }

    /// Release every grasp without capturing.
    pub fn release_all(&mut self) -> usize {
        self.grasps.release_all(&mut self.world)
    }

    /// Whether `side`'s gripper holds an object.
    #[must_use]
    pub fn is_grasping(&self, side: Side) -> bool {
        self.grasps
            .is_grasping(self.capture.config().arm_ids.get(side))
    }

    /// Grasp table.
    #[must_use]
    pub const fn grasps(&self) -> &GraspManager {
        &self.grasps
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The physics world.
    #[must_use]
    pub const fn world(&self) -> &W {
        &self.world
    }

    /// Mutable physics world, for task setup and teardown.
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// The arm driver.
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// World and driver together, for driver calls that need the world.
    pub fn world_and_driver_mut(&mut self) -> (&mut W, &mut D) {
        (&mut self.world, &mut self.driver)
    }

    /// Capture configuration.
    #[must_use]
    pub const fn capture_config(&self) -> &CaptureConfig {
        self.capture.config()
    }

    /// Mutable capture configuration.
    pub fn capture_config_mut(&mut self) -> &mut CaptureConfig {
        self.capture.config_mut()
    }

    /// Tear the stepper apart.
    pub fn into_parts(self) -> (W, D, GraspManager) {
        (self.world, self.driver, self.grasps)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::driver::{KinematicGripperDriver, NullDriver};
    use approx::assert_relative_eq;
    use nalgebra::Point3;
    use teleop_physics::{PhysicsConfig, World};
    use teleop_types::{BodyDescriptor, ColliderShape};

    fn stepper_with_cube() -> SimulationStepper<World, KinematicGripperDriver> {
        let driver = KinematicGripperDriver::default();
        let mut world = World::new(PhysicsConfig::default());
        driver.spawn_grippers(&mut world).unwrap();
        world
            .add_body(
                BodyDescriptor::dynamic("cube")
                    .with_position(Point3::new(-0.4, 1.1, -0.3))
                    .with_collider(ColliderShape::cuboid(0.025, 0.025, 0.025)),
            )
            .unwrap();
        SimulationStepper::new(
            world,
            driver,
            StateCapture::new(CaptureConfig::new().with_object("cube", "cube")),
        )
    }

    #[test]
    fn test_free_fall_captured() {
        let mut world = World::new(PhysicsConfig::default());
        world
            .add_body(BodyDescriptor::dynamic("ball").with_position(Point3::new(0.0, 2.0, 0.0)))
            .unwrap();
        let mut stepper = SimulationStepper::new(
            world,
            NullDriver,
            StateCapture::new(CaptureConfig::new().with_untyped_object("ball")),
        );

        let mut last = None;
        for _ in 0..60 {
            last = Some(stepper.step(&DualArmAction::zero()).unwrap());
        }
        let state = last.unwrap();
        assert!(state.object("ball").unwrap().position.y < 2.0);
        assert_eq!(stepper.world().step_count(), 60);
        assert_relative_eq!(stepper.world().time(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_state_is_last_snapshot() {
        let mut stepper = stepper_with_cube();
        assert_eq!(stepper.state().timestamp, 0.0);
        assert!(stepper.state().objects.is_empty());

        let stepped = stepper.step(&DualArmAction::zero()).unwrap();
        assert_eq!(stepper.state(), &stepped);
        assert_eq!(stepper.world().step_count(), 1);
    }

    #[test]
    fn test_action_applied_before_step() {
        let mut stepper = stepper_with_cube();
        let mut action = DualArmAction::zero();
        action.right.dx = -0.05;
        let state = stepper.step(&action).unwrap();
        assert_relative_eq!(state.right_arm.end_effector_position.x, 0.35, epsilon = 1e-12);
        assert_relative_eq!(state.left_arm.end_effector_position.x, -0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_grasped_cube_follows_gripper() {
        let mut stepper = stepper_with_cube();
        let constraint = stepper.try_grasp(Side::Left, "cube").unwrap();
        assert_eq!(constraint.object_id, "cube");

        let mut action = DualArmAction::zero();
        action.left.dy = 0.002;
        let mut state = stepper.state().clone();
        for _ in 0..50 {
            state = stepper.step(&action).unwrap();
        }
        assert!(state.left_arm.is_grasping);
        assert_eq!(state.left_arm.grasped_object_id.as_deref(), Some("cube"));
        let cube = state.object("cube").unwrap();
        assert_relative_eq!(cube.position.y, state.left_arm.end_effector_position.y, epsilon = 1e-3);
    }

    #[test]
    fn test_reset_releases_and_keeps_time() {
        let mut stepper = stepper_with_cube();
        stepper.try_grasp(Side::Left, "cube").unwrap();
        stepper.try_grasp(Side::Right, "cube").unwrap();
        stepper.step(&DualArmAction::zero()).unwrap();
        let time = stepper.world().time();

        let state = stepper.reset();
        assert!(!state.left_arm.is_grasping);
        assert!(!state.right_arm.is_grasping);
        assert_eq!(stepper.world().time(), time);
        assert_eq!(stepper.world().step_count(), 1);
        assert_eq!(stepper.world().joint_count(), 0);
        assert_eq!(stepper.state(), &state);
    }

    #[test]
    fn test_release_by_side() {
        let mut stepper = stepper_with_cube();
        assert!(!stepper.release(Side::Left));
        stepper.try_grasp(Side::Left, "cube").unwrap();
        assert!(stepper.is_grasping(Side::Left));
        assert!(stepper.release(Side::Left));
        assert!(!stepper.is_grasping(Side::Left));
    }

    #[test]
    fn test_divergence_keeps_last_snapshot() {
        let mut stepper = stepper_with_cube();
        let good = stepper.step(&DualArmAction::zero()).unwrap();

        stepper
            .world_mut()
            .set_linear_velocity("cube", nalgebra::Vector3::new(f64::NAN, 0.0, 0.0))
            .unwrap();
        let err = stepper.step(&DualArmAction::zero()).unwrap_err();
        assert!(err.is_diverged());
        assert_eq!(stepper.state(), &good);
    }
}
