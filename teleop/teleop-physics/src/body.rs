//! Bodies and joints stored by the built-in world.

use nalgebra::{Matrix3, Point3, Unit, Vector3};
use teleop_types::{
    BodyDescriptor, BodyKind, ColliderShape, JointHandle, JointLimits, Pose, Result, TeleopError,
    Twist,
};

use crate::mass::MassProperties;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A rigid body in the world.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Body {
    /// Unique id.
    pub id: String,
    /// Dynamic, fixed or kinematic.
    pub kind: BodyKind,
    /// Current pose.
    pub pose: Pose,
    /// Current velocity.
    pub twist: Twist,
    /// Mass and inertia derived from the collider.
    pub mass_props: MassProperties,
    /// Collision shape, if any.
    pub collider: Option<ColliderShape>,
    /// Accumulated external force (consumed by the next step).
    pub accumulated_force: Vector3<f64>,
    /// Accumulated external torque (consumed by the next step).
    pub accumulated_torque: Vector3<f64>,
    /// Pose at the start of the most recent step.
    pub(crate) step_start: Pose,
}

impl Body {
    /// Build a body from a descriptor.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty id, a degenerate collider,
    /// a non-positive density or a non-finite pose.
    pub fn from_descriptor(desc: BodyDescriptor) -> Result<Self> {
        if desc.id.is_empty() {
            return Err(TeleopError::invalid_config("body id cannot be empty"));
        }
        if let Some(shape) = &desc.collider {
            if !shape.is_valid() {
                return Err(TeleopError::invalid_config(format!(
                    "body {} has a degenerate collider",
                    desc.id
                )));
            }
        }
        if !desc.density.is_finite() || desc.density <= 0.0 {
            return Err(TeleopError::invalid_config(format!(
                "body {} has non-positive density {}",
                desc.id, desc.density
            )));
        }
        if !desc.pose.is_finite() {
            return Err(TeleopError::invalid_config(format!(
                "body {} has a non-finite pose",
                desc.id
            )));
        }

        let mass_props = MassProperties::from_descriptor(&desc);
        Ok(Self {
            id: desc.id,
            kind: desc.kind,
            pose: desc.pose,
            twist: Twist::zero(),
            mass_props,
            collider: desc.collider,
            accumulated_force: Vector3::zeros(),
            accumulated_torque: Vector3::zeros(),
            step_start: desc.pose,
        })
    }

    /// Whether the solver may move this body.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.kind.is_dynamic()
    }

    /// Inverse mass, zero for fixed and kinematic bodies.
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        if self.is_dynamic() {
            self.mass_props.inverse_mass()
        } else {
            0.0
        }
    }

    /// Inverse inertia in world coordinates, zero for fixed and kinematic
    /// bodies.
    #[must_use]
    pub fn inverse_inertia_world(&self) -> Matrix3<f64> {
        if !self.is_dynamic() {
            return Matrix3::zeros();
        }
        let r = self.pose.rotation.to_rotation_matrix();
        r.matrix() * self.mass_props.inverse_inertia() * r.matrix().transpose()
    }

    /// Apply a force at the center of mass. Ignored unless dynamic.
    pub fn apply_force(&mut self, force: Vector3<f64>) {
        if self.is_dynamic() {
            self.accumulated_force += force;
        }
    }

    /// Apply a torque. Ignored unless dynamic.
    pub fn apply_torque(&mut self, torque: Vector3<f64>) {
        if self.is_dynamic() {
            self.accumulated_torque += torque;
        }
    }

    /// Clear accumulated forces and torques.
    pub fn clear_forces(&mut self) {
        self.accumulated_force = Vector3::zeros();
        self.accumulated_torque = Vector3::zeros();
    }

    /// Check for `NaN` or `Inf` in pose or velocity.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.pose.is_finite() && self.twist.is_finite()
    }
}

/// Joint constraint variants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointKind {
    /// Full pose lock: `parent * frame1 == child * frame2`.
    Fixed {
        /// Joint frame in the parent's local coordinates.
        frame1: Pose,
        /// Joint frame in the child's local coordinates.
        frame2: Pose,
    },
    /// Hinge: anchors coincide, child rotates only about `axis` and stays
    /// within `limits`.
    Revolute {
        /// Anchor in the parent's local coordinates.
        anchor1: Point3<f64>,
        /// Anchor in the child's local coordinates.
        anchor2: Point3<f64>,
        /// Hinge axis, in both local frames.
        axis: Unit<Vector3<f64>>,
        /// Allowed hinge angle.
        limits: JointLimits,
    },
}

impl JointKind {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Revolute { .. } => "revolute",
        }
    }
}

/// A joint between two bodies.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Joint {
    /// Handle issued at creation.
    pub handle: JointHandle,
    /// Parent body id.
    pub parent: String,
    /// Child body id.
    pub child: String,
    /// Constraint.
    pub kind: JointKind,
}

impl Joint {
    /// Whether this joint references `id`.
    #[must_use]
    pub fn involves(&self, id: &str) -> bool {
        self.parent == id || self.child == id
    }

    /// Whether this joint connects `a` and `b` in either order.
    #[must_use]
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.parent == a && self.child == b) || (self.parent == b && self.child == a)
    }
}
