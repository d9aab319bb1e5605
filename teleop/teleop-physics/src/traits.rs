//! The physics-world capability consumed by the teleoperation core.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use teleop_types::{BodyDescriptor, JointHandle, JointLimits, Pose, Result, Twist};

/// Everything the control loop, grasp manager, capture and tasks need from
/// a physics engine.
///
/// Bodies are addressed by string id. Missing bodies are reported as `None`
/// or `false` by queries and as [`TeleopError::BodyNotFound`] by mutations
/// and joint creation.
///
/// [`TeleopError::BodyNotFound`]: teleop_types::TeleopError::BodyNotFound
pub trait PhysicsWorld {
    /// Create a body.
    ///
    /// # Errors
    ///
    /// Returns [`TeleopError::DuplicateBody`](teleop_types::TeleopError::DuplicateBody)
    /// if the id is taken, or a configuration error for an invalid collider.
    fn add_body(&mut self, desc: BodyDescriptor) -> Result<()>;

    /// Remove a body and every joint that references it. Returns whether a
    /// body was removed.
    fn remove_body(&mut self, id: &str) -> bool;

    /// Whether a body with this id exists.
    fn has_body(&self, id: &str) -> bool;

    /// Current pose of a body.
    fn body_pose(&self, id: &str) -> Option<Pose>;

    /// Current velocity of a body.
    fn body_velocity(&self, id: &str) -> Option<Twist>;

    /// Ids of all bodies, sorted.
    fn body_ids(&self) -> Vec<String>;

    /// Teleport a body.
    fn set_translation(&mut self, id: &str, position: Point3<f64>) -> Result<()>;

    /// Set a body's orientation.
    fn set_rotation(&mut self, id: &str, rotation: UnitQuaternion<f64>) -> Result<()>;

    /// Set a body's linear velocity.
    fn set_linear_velocity(&mut self, id: &str, velocity: Vector3<f64>) -> Result<()>;

    /// Set a body's angular velocity.
    fn set_angular_velocity(&mut self, id: &str, velocity: Vector3<f64>) -> Result<()>;

    /// Rigidly attach `child` to `parent` so that `parent * frame1` and
    /// `child * frame2` coincide.
    fn create_fixed_joint(
        &mut self,
        parent: &str,
        child: &str,
        frame1: Pose,
        frame2: Pose,
    ) -> Result<JointHandle>;

    /// Hinge `child` to `parent` about `axis` (given in both local frames),
    /// keeping the two local anchors coincident.
    fn create_revolute_joint(
        &mut self,
        parent: &str,
        child: &str,
        anchor1: Point3<f64>,
        anchor2: Point3<f64>,
        axis: Vector3<f64>,
    ) -> Result<JointHandle>;

    /// Restrict a revolute joint's hinge angle.
    ///
    /// # Errors
    ///
    /// [`TeleopError::JointNotFound`](teleop_types::TeleopError::JointNotFound)
    /// for an unknown handle, a configuration error for a non-revolute joint
    /// or unordered bounds.
    fn set_joint_limits(&mut self, joint: JointHandle, limits: JointLimits) -> Result<()>;

    /// Remove a joint. Returns whether it existed.
    fn remove_joint(&mut self, joint: JointHandle) -> bool;

    /// Whether a joint is live.
    fn has_joint(&self, joint: JointHandle) -> bool;

    /// Advance by exactly one fixed timestep.
    ///
    /// # Errors
    ///
    /// Returns [`TeleopError::Diverged`](teleop_types::TeleopError::Diverged)
    /// if any body state becomes non-finite.
    fn step(&mut self) -> Result<()>;

    /// Fixed timestep in seconds.
    fn timestep(&self) -> f64;

    /// Simulated time in seconds.
    fn time(&self) -> f64;

    /// Number of completed steps.
    fn step_count(&self) -> u64;

    /// Write a full pose. Convenience over translation and rotation.
    fn set_pose(&mut self, id: &str, pose: Pose) -> Result<()> {
        self.set_translation(id, pose.position)?;
        self.set_rotation(id, pose.rotation)
    }

    /// Zero both velocities.
    fn stop_body(&mut self, id: &str) -> Result<()> {
        self.set_linear_velocity(id, Vector3::zeros())?;
        self.set_angular_velocity(id, Vector3::zeros())
    }

    /// Place a body at `pose`, at rest. Unlike [`set_pose`](Self::set_pose)
    /// the jump is not read as motion on the next step.
    fn teleport_body(&mut self, id: &str, pose: Pose) -> Result<()> {
        self.set_pose(id, pose)?;
        self.stop_body(id)
    }
}
