//! Position-level joint and contact projection.
//!
//! Joints are enforced by iteratively moving bodies so the constraint error
//! vanishes, with each correction split between the two bodies by their
//! generalized inverse masses (translational plus rotational about the
//! anchor). Fixed and kinematic bodies carry zero inverse mass and are never
//! moved. The world re-derives velocities from the corrected displacement
//! afterwards.

use nalgebra::{Matrix3, Point3, Unit, UnitQuaternion, Vector3};
use teleop_types::{angle_about_axis, ColliderShape, JointLimits, Pose};

use crate::body::{Body, JointKind};

/// Corrections below this magnitude are skipped.
const EPSILON: f64 = 1e-12;

/// Snapshot of the body state needed for one projection.
#[derive(Debug, Clone, Copy)]
pub struct SolverBody {
    /// Pose, updated in place by the solver.
    pub pose: Pose,
    /// Inverse mass (0 for fixed and kinematic bodies).
    pub inv_mass: f64,
    /// Inverse inertia tensor in world frame.
    pub inv_inertia: Matrix3<f64>,
}

impl SolverBody {
    /// Snapshot a body.
    #[must_use]
    pub fn from_body(body: &Body) -> Self {
        Self {
            pose: body.pose,
            inv_mass: body.inverse_mass(),
            inv_inertia: body.inverse_inertia_world(),
        }
    }

    /// Whether the solver can move this body at all.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0 && self.inv_inertia == Matrix3::zeros()
    }

    fn rotate(&mut self, rotation_vector: Vector3<f64>) {
        if rotation_vector.norm() > EPSILON {
            self.pose.rotation = UnitQuaternion::from_scaled_axis(rotation_vector) * self.pose.rotation;
        }
    }

    fn angular_weight(&self, n: &Vector3<f64>) -> f64 {
        n.dot(&(self.inv_inertia * n))
    }
}

/// Apply one projection of `joint` to its two bodies.
pub fn solve_joint(kind: &JointKind, parent: &mut SolverBody, child: &mut SolverBody) {
    match kind {
        JointKind::Fixed { frame1, frame2 } => {
            let target = parent.pose.rotation * frame1.rotation * frame2.rotation.inverse();
            let error = target * child.pose.rotation.inverse();
            angular_correction(parent, child, error.scaled_axis());
            positional_correction(parent, child, &frame1.position, &frame2.position);
        }
        JointKind::Revolute {
            anchor1,
            anchor2,
            axis,
            limits,
        } => {
            align_axes(parent, child, axis);
            if limits.is_limited() {
                enforce_limits(parent, child, axis, limits);
            }
            positional_correction(parent, child, anchor1, anchor2);
        }
    }
}

/// Hinge angle of the child relative to the parent.
#[must_use]
pub fn hinge_angle(parent: &Pose, child: &Pose, axis: &Unit<Vector3<f64>>) -> f64 {
    angle_about_axis(&(parent.rotation.inverse() * child.rotation), axis)
}

/// Rotate the child back into `limits` about the parent's copy of `axis`.
fn enforce_limits(
    parent: &mut SolverBody,
    child: &mut SolverBody,
    axis: &Unit<Vector3<f64>>,
    limits: &JointLimits,
) {
    let angle = hinge_angle(&parent.pose, &child.pose, axis);
    let clamped = limits.clamp(angle);
    if (clamped - angle).abs() < EPSILON {
        return;
    }
    let world_axis = parent.pose.rotation * axis.into_inner();
    angular_correction(parent, child, world_axis * (clamped - angle));
}

/// Rotate the child's copy of `axis` onto the parent's copy.
fn align_axes(parent: &mut SolverBody, child: &mut SolverBody, axis: &Unit<Vector3<f64>>) {
    let a1 = parent.pose.rotation * axis.into_inner();
    let a2 = child.pose.rotation * axis.into_inner();
    if let Some(q) = UnitQuaternion::rotation_between(&a2, &a1) {
        angular_correction(parent, child, q.scaled_axis());
    }
}

/// Pull two local anchors together.
fn positional_correction(
    parent: &mut SolverBody,
    child: &mut SolverBody,
    anchor1: &Point3<f64>,
    anchor2: &Point3<f64>,
) {
    let r1 = parent.pose.rotation * anchor1.coords;
    let r2 = child.pose.rotation * anchor2.coords;
    let p1 = parent.pose.position + r1;
    let p2 = child.pose.position + r2;

    let delta = p1 - p2;
    let c = delta.norm();
    if c < EPSILON {
        return;
    }
    let n = delta / c;

    let w1 = parent.inv_mass + parent.angular_weight(&r1.cross(&n));
    let w2 = child.inv_mass + child.angular_weight(&r2.cross(&n));
    let w = w1 + w2;
    if w <= 0.0 {
        return;
    }

    let impulse = n * (c / w);

    child.pose.position += impulse * child.inv_mass;
    child.rotate(child.inv_inertia * r2.cross(&impulse));

    parent.pose.position -= impulse * parent.inv_mass;
    parent.rotate(-(parent.inv_inertia * r1.cross(&impulse)));
}

/// Rotate the child by `rotation` (world frame) relative to the parent,
/// sharing the correction by rotational inverse inertia.
fn angular_correction(parent: &mut SolverBody, child: &mut SolverBody, rotation: Vector3<f64>) {
    let theta = rotation.norm();
    if theta < EPSILON {
        return;
    }
    let n = rotation / theta;

    let w = parent.angular_weight(&n) + child.angular_weight(&n);
    if w <= 0.0 {
        return;
    }

    let impulse = n * (theta / w);
    child.rotate(child.inv_inertia * impulse);
    parent.rotate(-(parent.inv_inertia * impulse));
}

/// Push a dynamic body out of a fixed cuboid along the axis of least
/// penetration. Returns the world-space displacement applied, if any.
///
/// The dynamic body is approximated by its oriented bounding box expressed
/// in the cuboid's frame.
pub fn resolve_resting_contact(
    dynamic: &mut Body,
    fixed_pose: &Pose,
    fixed_half_extents: &Vector3<f64>,
) -> Option<Vector3<f64>> {
    let shape = dynamic.collider?;
    let local_center = fixed_pose.inverse_transform_point(&dynamic.pose.position);

    let extents = match shape {
        ColliderShape::Ball { radius } => Vector3::repeat(radius),
        _ => {
            let relative = fixed_pose.rotation.inverse() * dynamic.pose.rotation;
            relative.to_rotation_matrix().matrix().abs() * shape.local_half_extents()
        }
    };

    let mut best_axis = 0;
    let mut best_overlap = f64::INFINITY;
    for axis in 0..3 {
        let overlap = fixed_half_extents[axis] + extents[axis] - local_center[axis].abs();
        if overlap <= 0.0 {
            return None;
        }
        if overlap < best_overlap {
            best_overlap = overlap;
            best_axis = axis;
        }
    }

    let mut local_push = Vector3::zeros();
    local_push[best_axis] = if local_center[best_axis] >= 0.0 {
        best_overlap
    } else {
        -best_overlap
    };

    let push = fixed_pose.rotation * local_push;
    dynamic.pose.position += push;
    Some(push)
}
