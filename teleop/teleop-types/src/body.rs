//! Rigid body descriptors and state for the physics-world boundary.
//!
//! Bodies are addressed by string id (`"gripper-left"`, `"valve-handle"`,
//! ...). Joints are addressed by an opaque [`JointHandle`] issued by the
//! world that created them.

use nalgebra::{Isometry3, Point3, Unit, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position and orientation of a rigid body.
///
/// # Example
///
/// ```
/// use teleop_types::Pose;
/// use nalgebra::Point3;
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let world = pose.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(world, Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position in world coordinates.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Origin, no rotation.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Pose at `position` with identity rotation.
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Convert to an isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(self.position.coords.into(), self.rotation)
    }

    /// Transform a point from local to world coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Transform a point from world to local coordinates.
    #[must_use]
    pub fn inverse_transform_point(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    /// Compose two poses: `self * other`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(&other.position),
            rotation: self.rotation * other.rotation,
        }
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist {
    /// Linear velocity in world coordinates (m/s).
    pub linear: Vector3<f64>,
    /// Angular velocity in world coordinates (rad/s).
    pub angular: Vector3<f64>,
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl Twist {
    /// Create a twist with specified linear and angular velocity.
    #[must_use]
    pub const fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    /// At rest.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            linear: Vector3::zeros(),
            angular: Vector3::zeros(),
        }
    }

    /// Check if the twist contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.linear.iter().all(|x| x.is_finite()) && self.angular.iter().all(|x| x.is_finite())
    }
}

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyKind {
    /// Integrated under gravity and joint/contact corrections.
    #[default]
    Dynamic,
    /// Never moves.
    Fixed,
    /// Moved only by explicit pose writes (grippers).
    Kinematic,
}

impl BodyKind {
    /// Whether the solver may move this body.
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic)
    }
}

/// Collision shape attached to a body, in body-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColliderShape {
    /// Axis-aligned box with the given half extents.
    Cuboid {
        /// Half extents along local X, Y, Z.
        half_extents: Vector3<f64>,
    },
    /// Sphere.
    Ball {
        /// Radius.
        radius: f64,
    },
    /// Cylinder aligned with local Y.
    Cylinder {
        /// Half of the cylinder height.
        half_height: f64,
        /// Radius.
        radius: f64,
    },
}

impl ColliderShape {
    /// Cuboid from half extents.
    #[must_use]
    pub fn cuboid(hx: f64, hy: f64, hz: f64) -> Self {
        Self::Cuboid {
            half_extents: Vector3::new(hx, hy, hz),
        }
    }

    /// Ball from radius.
    #[must_use]
    pub const fn ball(radius: f64) -> Self {
        Self::Ball { radius }
    }

    /// Cylinder from half height and radius.
    #[must_use]
    pub const fn cylinder(half_height: f64, radius: f64) -> Self {
        Self::Cylinder {
            half_height,
            radius,
        }
    }

    /// Enclosed volume (m³).
    #[must_use]
    pub fn volume(&self) -> f64 {
        match *self {
            Self::Cuboid { half_extents } => {
                8.0 * half_extents.x * half_extents.y * half_extents.z
            }
            Self::Ball { radius } => 4.0 / 3.0 * std::f64::consts::PI * radius.powi(3),
            Self::Cylinder {
                half_height,
                radius,
            } => std::f64::consts::PI * radius * radius * 2.0 * half_height,
        }
    }

    /// Half extents of the local-frame bounding box.
    #[must_use]
    pub fn local_half_extents(&self) -> Vector3<f64> {
        match *self {
            Self::Cuboid { half_extents } => half_extents,
            Self::Ball { radius } => Vector3::repeat(radius),
            Self::Cylinder {
                half_height,
                radius,
            } => Vector3::new(radius, half_height, radius),
        }
    }

    /// Whether all dimensions are positive and finite.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let e = self.local_half_extents();
        e.iter().all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Default collider density (kg/m³).
pub const DEFAULT_DENSITY: f64 = 1.0;

/// Everything needed to create one body in a physics world.
///
/// # Example
///
/// ```
/// use teleop_types::{BodyDescriptor, BodyKind, ColliderShape};
/// use nalgebra::Point3;
///
/// let desc = BodyDescriptor::new("crate-0", BodyKind::Dynamic)
///     .with_position(Point3::new(0.0, 1.0, 0.0))
///     .with_collider(ColliderShape::cuboid(0.05, 0.05, 0.05))
///     .with_density(2.0);
/// assert_eq!(desc.id, "crate-0");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyDescriptor {
    /// Unique body id.
    pub id: String,
    /// Body kind.
    pub kind: BodyKind,
    /// Initial pose.
    pub pose: Pose,
    /// Collider, if any. Bodies without a collider get unit mass.
    pub collider: Option<ColliderShape>,
    /// Collider density.
    pub density: f64,
}

impl BodyDescriptor {
    /// Descriptor at the origin with no collider.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: BodyKind) -> Self {
        Self {
            id: id.into(),
            kind,
            pose: Pose::identity(),
            collider: None,
            density: DEFAULT_DENSITY,
        }
    }

    /// Shorthand for a dynamic body.
    #[must_use]
    pub fn dynamic(id: impl Into<String>) -> Self {
        Self::new(id, BodyKind::Dynamic)
    }

    /// Shorthand for a fixed body.
    #[must_use]
    pub fn fixed(id: impl Into<String>) -> Self {
        Self::new(id, BodyKind::Fixed)
    }

    /// Shorthand for a kinematic body.
    #[must_use]
    pub fn kinematic(id: impl Into<String>) -> Self {
        Self::new(id, BodyKind::Kinematic)
    }

    /// Set the initial position.
    #[must_use]
    pub fn with_position(mut self, position: Point3<f64>) -> Self {
        self.pose.position = position;
        self
    }

    /// Set the initial rotation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: UnitQuaternion<f64>) -> Self {
        self.pose.rotation = rotation;
        self
    }

    /// Attach a collider.
    #[must_use]
    pub fn with_collider(mut self, shape: ColliderShape) -> Self {
        self.collider = Some(shape);
        self
    }

    /// Set the collider density.
    #[must_use]
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    /// Mass implied by collider and density, 1 kg without a collider.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.collider
            .map_or(1.0, |shape| shape.volume() * self.density)
    }
}

/// Opaque handle to a joint created by a physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointHandle(pub u64);

impl JointHandle {
    /// Get the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JointHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Joint({})", self.0)
    }
}

/// Angular range of a revolute joint, in radians.
///
/// The joint angle is the child's rotation about the hinge axis relative
/// to the parent, zero when both share an orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointLimits {
    /// Lowest allowed angle.
    pub lower: f64,
    /// Highest allowed angle.
    pub upper: f64,
}

impl Default for JointLimits {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl JointLimits {
    /// Limits spanning `[lower, upper]`.
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// No limits.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    /// Whether either bound is finite.
    #[must_use]
    pub fn is_limited(&self) -> bool {
        self.lower.is_finite() || self.upper.is_finite()
    }

    /// Whether `angle` lies within the range.
    #[must_use]
    pub fn contains(&self, angle: f64) -> bool {
        (self.lower..=self.upper).contains(&angle)
    }

    /// Clamp `angle` into the range.
    #[must_use]
    pub fn clamp(&self, angle: f64) -> f64 {
        angle.max(self.lower).min(self.upper)
    }

    /// Bounds are ordered and not NaN.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.lower.is_nan() && !self.upper.is_nan() && self.lower <= self.upper
    }
}

/// Signed rotation of `rotation` about `axis`, in `(-π, π]`.
///
/// Only the twist component about the axis counts; any swing off the axis
/// is ignored.
#[must_use]
pub fn angle_about_axis(rotation: &UnitQuaternion<f64>, axis: &Unit<Vector3<f64>>) -> f64 {
    let along = rotation.imag().dot(&axis.into_inner());
    let angle = 2.0 * along.atan2(rotation.w);
    if angle > std::f64::consts::PI {
        angle - std::f64::consts::TAU
    } else if angle <= -std::f64::consts::PI {
        angle + std::f64::consts::TAU
    } else {
        angle
    }
}
