//! Built-in rigid-body world.
//!
//! The [`World`] owns bodies and joints keyed by id and advances them with a
//! fixed timestep. It implements [`PhysicsWorld`], the capability the
//! teleoperation core is written against.

use hashbrown::HashMap;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use teleop_types::{
    BodyDescriptor, BodyKind, ColliderShape, JointHandle, JointLimits, Pose, Result, TeleopError,
    Twist,
};
use tracing::{debug, warn};

use crate::body::{Body, Joint, JointKind};
use crate::config::PhysicsConfig;
use crate::integrators::{
    apply_damping, clamp_velocities, semi_implicit_euler, velocity_from_displacement,
};
use crate::solver::{resolve_resting_contact, solve_joint, SolverBody};
use crate::traits::PhysicsWorld;

/// The simulation world containing all bodies and joints.
///
/// # Example
///
/// ```
/// use teleop_physics::{PhysicsConfig, PhysicsWorld, World};
/// use teleop_types::{BodyDescriptor, ColliderShape};
/// use nalgebra::Point3;
///
/// let mut world = World::new(PhysicsConfig::default());
/// world
///     .add_body(
///         BodyDescriptor::dynamic("ball")
///             .with_position(Point3::new(0.0, 1.0, 0.0))
///             .with_collider(ColliderShape::ball(0.05)),
///     )
///     .unwrap();
///
/// for _ in 0..60 {
///     world.step().unwrap();
/// }
/// assert!(world.body_pose("ball").unwrap().position.y < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct World {
    config: PhysicsConfig,
    time: f64,
    step_count: u64,
    bodies: HashMap<String, Body>,
    joints: HashMap<JointHandle, Joint>,
    next_joint_id: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            time: 0.0,
            step_count: 0,
            bodies: HashMap::new(),
            joints: HashMap::new(),
            next_joint_id: 1,
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Number of bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of joints.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Get a body by id.
    #[must_use]
    pub fn body(&self, id: &str) -> Option<&Body> {
        self.bodies.get(id)
    }

    /// Get a mutable body by id.
    #[must_use]
    pub fn body_mut(&mut self, id: &str) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    /// Iterate over all bodies.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    /// Get a joint by handle.
    #[must_use]
    pub fn joint(&self, handle: JointHandle) -> Option<&Joint> {
        self.joints.get(&handle)
    }

    /// Iterate over all joints.
    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.values()
    }

    /// Apply a force to a body for the next step.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not exist.
    pub fn apply_force(&mut self, id: &str, force: Vector3<f64>) -> Result<()> {
        self.require_body_mut(id)?.apply_force(force);
        Ok(())
    }

    /// Apply a torque to a body for the next step.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not exist.
    pub fn apply_torque(&mut self, id: &str, torque: Vector3<f64>) -> Result<()> {
        self.require_body_mut(id)?.apply_torque(torque);
        Ok(())
    }

    /// Reset simulated time and the step counter.
    pub fn reset_time(&mut self) {
        self.time = 0.0;
        self.step_count = 0;
    }

    /// Validate configuration and body states.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or any body has a
    /// non-finite state.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;

        for body in self.bodies.values() {
            if !body.is_finite() {
                return Err(TeleopError::diverged(format!(
                    "body {} has non-finite state",
                    body.id
                )));
            }
        }

        Ok(())
    }

    fn require_body_mut(&mut self, id: &str) -> Result<&mut Body> {
        self.bodies
            .get_mut(id)
            .ok_or_else(|| TeleopError::body_not_found(id))
    }

    fn require_pair(&self, parent: &str, child: &str) -> Result<()> {
        for id in [parent, child] {
            if !self.bodies.contains_key(id) {
                return Err(TeleopError::body_not_found(id));
            }
        }
        if parent == child {
            return Err(TeleopError::invalid_config(format!(
                "cannot join body {parent} to itself"
            )));
        }
        Ok(())
    }

    fn insert_joint(&mut self, parent: &str, child: &str, kind: JointKind) -> JointHandle {
        let handle = JointHandle(self.next_joint_id);
        self.next_joint_id += 1;

        debug!(
            joint = handle.raw(),
            kind = kind.name(),
            parent,
            child,
            "Created joint"
        );

        self.joints.insert(
            handle,
            Joint {
                handle,
                parent: parent.to_owned(),
                child: child.to_owned(),
                kind,
            },
        );
        handle
    }

    // =========================================================================
    // Step phases
    // =========================================================================

    /// Integrate dynamic bodies and derive kinematic velocities.
    fn integrate(&mut self, dt: f64) {
        let gravity = self.config.gravity;

        for body in self.bodies.values_mut() {
            match body.kind {
                BodyKind::Fixed => {
                    body.twist = Twist::zero();
                    body.step_start = body.pose;
                }
                BodyKind::Kinematic => {
                    body.twist = velocity_from_displacement(&body.step_start, &body.pose, dt);
                    body.step_start = body.pose;
                }
                BodyKind::Dynamic => {
                    let linear_accel =
                        gravity + body.accumulated_force * body.mass_props.inverse_mass();
                    let angular_accel = body.inverse_inertia_world() * body.accumulated_torque;
                    body.step_start = body.pose;
                    semi_implicit_euler(
                        &mut body.pose,
                        &mut body.twist,
                        linear_accel,
                        angular_accel,
                        dt,
                    );
                }
            }
            body.clear_forces();
        }
    }

    /// Project every joint, in handle order, `solver_iterations` times.
    fn solve_joints(&mut self) {
        if self.joints.is_empty() {
            return;
        }

        let mut handles: Vec<JointHandle> = self.joints.keys().copied().collect();
        handles.sort_unstable();

        for _ in 0..self.config.solver_iterations {
            for handle in &handles {
                let Some(joint) = self.joints.get(handle) else {
                    continue;
                };
                let (Some(parent), Some(child)) =
                    (self.bodies.get(&joint.parent), self.bodies.get(&joint.child))
                else {
                    continue;
                };

                let mut p = SolverBody::from_body(parent);
                let mut c = SolverBody::from_body(child);
                if p.is_static() && c.is_static() {
                    continue;
                }
                solve_joint(&joint.kind, &mut p, &mut c);

                if let Some(body) = self.bodies.get_mut(&joint.parent) {
                    if body.is_dynamic() {
                        body.pose = p.pose;
                    }
                }
                if let Some(body) = self.bodies.get_mut(&joint.child) {
                    if body.is_dynamic() {
                        body.pose = c.pose;
                    }
                }
            }
        }
    }

    /// Rest dynamic bodies on fixed cuboids. Jointed pairs do not collide.
    fn solve_contacts(&mut self) -> usize {
        let obstacles: Vec<(String, Pose, Vector3<f64>)> = self
            .bodies
            .values()
            .filter(|b| b.kind == BodyKind::Fixed)
            .filter_map(|b| match b.collider {
                Some(ColliderShape::Cuboid { half_extents }) => {
                    Some((b.id.clone(), b.pose, half_extents))
                }
                _ => None,
            })
            .collect();
        if obstacles.is_empty() {
            return 0;
        }

        let joints: Vec<&Joint> = self.joints.values().collect();
        let mut resolved = 0;
        for body in self.bodies.values_mut() {
            if !body.is_dynamic() || body.collider.is_none() {
                continue;
            }
            for (fixed_id, fixed_pose, half_extents) in &obstacles {
                if joints.iter().any(|j| j.connects(&body.id, fixed_id)) {
                    continue;
                }
                if resolve_resting_contact(body, fixed_pose, half_extents).is_some() {
                    resolved += 1;
                }
            }
        }
        resolved
    }

    /// Re-derive dynamic velocities from corrected displacement, then
    /// damp and clamp.
    fn update_velocities(&mut self, dt: f64) {
        let config = &self.config;
        for body in self.bodies.values_mut().filter(|b| b.is_dynamic()) {
            let mut twist = velocity_from_displacement(&body.step_start, &body.pose, dt);
            if config.linear_damping > 0.0 || config.angular_damping > 0.0 {
                twist = apply_damping(&twist, config.linear_damping, config.angular_damping, dt);
            }
            body.twist = clamp_velocities(
                &twist,
                config.max_linear_velocity,
                config.max_angular_velocity,
            );
        }
    }
}

impl PhysicsWorld for World {
    fn add_body(&mut self, desc: BodyDescriptor) -> Result<()> {
        if self.bodies.contains_key(&desc.id) {
            return Err(TeleopError::DuplicateBody { id: desc.id });
        }
        let body = Body::from_descriptor(desc)?;
        debug!(id = %body.id, kind = ?body.kind, "Added body");
        self.bodies.insert(body.id.clone(), body);
        Ok(())
    }

    fn remove_body(&mut self, id: &str) -> bool {
        if self.bodies.remove(id).is_none() {
            return false;
        }
        let before = self.joints.len();
        self.joints.retain(|_, joint| !joint.involves(id));
        debug!(id, dropped_joints = before - self.joints.len(), "Removed body");
        true
    }

    fn has_body(&self, id: &str) -> bool {
        self.bodies.contains_key(id)
    }

    fn body_pose(&self, id: &str) -> Option<Pose> {
        self.bodies.get(id).map(|b| b.pose)
    }

    fn body_velocity(&self, id: &str) -> Option<Twist> {
        self.bodies.get(id).map(|b| b.twist)
    }

    fn body_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.bodies.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn set_translation(&mut self, id: &str, position: Point3<f64>) -> Result<()> {
        self.require_body_mut(id)?.pose.position = position;
        Ok(())
    }

    fn set_rotation(&mut self, id: &str, rotation: UnitQuaternion<f64>) -> Result<()> {
        self.require_body_mut(id)?.pose.rotation = rotation;
        Ok(())
    }

    fn teleport_body(&mut self, id: &str, pose: Pose) -> Result<()> {
        let body = self.require_body_mut(id)?;
        body.pose = pose;
        body.step_start = pose;
        body.twist = Twist::zero();
        Ok(())
    }

    fn set_linear_velocity(&mut self, id: &str, velocity: Vector3<f64>) -> Result<()> {
        let body = self.require_body_mut(id)?;
        if body.kind != BodyKind::Fixed {
            body.twist.linear = velocity;
        }
        Ok(())
    }

    fn set_angular_velocity(&mut self, id: &str, velocity: Vector3<f64>) -> Result<()> {
        let body = self.require_body_mut(id)?;
        if body.kind != BodyKind::Fixed {
            body.twist.angular = velocity;
        }
        Ok(())
    }

    fn create_fixed_joint(
        &mut self,
        parent: &str,
        child: &str,
        frame1: Pose,
        frame2: Pose,
    ) -> Result<JointHandle> {
        self.require_pair(parent, child)?;
        Ok(self.insert_joint(parent, child, JointKind::Fixed { frame1, frame2 }))
    }

    fn create_revolute_joint(
        &mut self,
        parent: &str,
        child: &str,
        anchor1: Point3<f64>,
        anchor2: Point3<f64>,
        axis: Vector3<f64>,
    ) -> Result<JointHandle> {
        self.require_pair(parent, child)?;
        let axis = nalgebra::Unit::try_new(axis, 1e-9)
            .ok_or_else(|| TeleopError::invalid_config("revolute axis cannot be zero"))?;
        Ok(self.insert_joint(
            parent,
            child,
            JointKind::Revolute {
                anchor1,
                anchor2,
                axis,
                limits: JointLimits::unlimited(),
            },
        ))
    }

    fn set_joint_limits(&mut self, joint: JointHandle, new_limits: JointLimits) -> Result<()> {
        if !new_limits.is_valid() {
            return Err(TeleopError::invalid_config(format!(
                "joint limits must be ordered, got [{}, {}]",
                new_limits.lower, new_limits.upper
            )));
        }
        let entry = self
            .joints
            .get_mut(&joint)
            .ok_or(TeleopError::JointNotFound(joint.raw()))?;
        match &mut entry.kind {
            JointKind::Revolute { limits, .. } => {
                *limits = new_limits;
                debug!(
                    joint = joint.raw(),
                    lower = new_limits.lower,
                    upper = new_limits.upper,
                    "Set joint limits"
                );
                Ok(())
            }
            other => Err(TeleopError::invalid_config(format!(
                "{} joints have no angle limits",
                other.name()
            ))),
        }
    }

    fn remove_joint(&mut self, joint: JointHandle) -> bool {
        let removed = self.joints.remove(&joint).is_some();
        if removed {
            debug!(joint = joint.raw(), "Removed joint");
        }
        removed
    }

    fn has_joint(&self, joint: JointHandle) -> bool {
        self.joints.contains_key(&joint)
    }

    /// Execute one simulation step.
    ///
    /// This performs:
    /// 1. Integrate dynamic bodies under gravity and applied forces, which
    ///    are then cleared
    /// 2. Project joints
    /// 3. Resolve resting contact against fixed cuboids (if enabled)
    /// 4. Derive velocities from the corrected motion, damp and clamp
    /// 5. Advance time
    /// 6. Check for divergence
    fn step(&mut self) -> Result<()> {
        self.config.validate()?;
        let dt = self.config.timestep;

        self.integrate(dt);
        self.solve_joints();
        if self.config.enable_contacts {
            self.solve_contacts();
        }
        self.update_velocities(dt);

        self.time += dt;
        self.step_count += 1;

        if let Err(err) = self.validate() {
            warn!(step = self.step_count, %err, "Physics diverged");
            return Err(err);
        }
        Ok(())
    }

    fn timestep(&self) -> f64 {
        self.config.timestep
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn step_count(&self) -> u64 {
        self.step_count
    }
}
