//! Mass properties derived from collider shapes.

use nalgebra::{Matrix3, Vector3};
use teleop_types::{BodyDescriptor, ColliderShape};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mass and body-local inertia tensor of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Total mass in kg.
    pub mass: f64,
    /// Inertia tensor about the body origin in local coordinates (kg·m²).
    pub inertia: Matrix3<f64>,
}

impl MassProperties {
    /// Point mass with no rotational inertia.
    #[must_use]
    pub fn point_mass(mass: f64) -> Self {
        Self {
            mass,
            inertia: Matrix3::zeros(),
        }
    }

    /// Uniform solid sphere: I = (2/5) m r².
    #[must_use]
    pub fn sphere(mass: f64, radius: f64) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self {
            mass,
            inertia: Matrix3::from_diagonal(&Vector3::new(i, i, i)),
        }
    }

    /// Uniform solid box.
    ///
    /// - Ixx = (1/12) m (y² + z²)
    /// - Iyy = (1/12) m (x² + z²)
    /// - Izz = (1/12) m (x² + y²)
    #[must_use]
    pub fn box_shape(mass: f64, half_extents: Vector3<f64>) -> Self {
        let x2 = 4.0 * half_extents.x * half_extents.x;
        let y2 = 4.0 * half_extents.y * half_extents.y;
        let z2 = 4.0 * half_extents.z * half_extents.z;

        Self {
            mass,
            inertia: Matrix3::from_diagonal(&Vector3::new(
                mass * (y2 + z2) / 12.0,
                mass * (x2 + z2) / 12.0,
                mass * (x2 + y2) / 12.0,
            )),
        }
    }

    /// Uniform solid cylinder aligned with local Y.
    ///
    /// - Ixx = Izz = (1/12) m (3r² + h²)
    /// - Iyy = (1/2) m r²
    #[must_use]
    pub fn cylinder(mass: f64, radius: f64, half_height: f64) -> Self {
        let r2 = radius * radius;
        let h2 = 4.0 * half_height * half_height;
        let ixx = mass * (3.0 * r2 + h2) / 12.0;
        let iyy = 0.5 * mass * r2;

        Self {
            mass,
            inertia: Matrix3::from_diagonal(&Vector3::new(ixx, iyy, ixx)),
        }
    }

    /// Mass properties of a collider filled at `density`.
    #[must_use]
    pub fn from_collider(shape: &ColliderShape, density: f64) -> Self {
        let mass = shape.volume() * density;
        match *shape {
            ColliderShape::Cuboid { half_extents } => Self::box_shape(mass, half_extents),
            ColliderShape::Ball { radius } => Self::sphere(mass, radius),
            ColliderShape::Cylinder {
                half_height,
                radius,
            } => Self::cylinder(mass, radius, half_height),
        }
    }

    /// Mass properties for a body descriptor. Bodies without a collider are
    /// unit spheres of 1 kg with a 0.1 m gyration radius.
    #[must_use]
    pub fn from_descriptor(desc: &BodyDescriptor) -> Self {
        desc.collider.map_or_else(
            || Self::sphere(1.0, 0.1),
            |shape| Self::from_collider(&shape, desc.density),
        )
    }

    /// Inverse mass (0 for massless or infinite bodies).
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        if self.mass <= 0.0 || !self.mass.is_finite() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Inverse of the local inertia tensor, zero when singular.
    #[must_use]
    pub fn inverse_inertia(&self) -> Matrix3<f64> {
        self.inertia.try_inverse().unwrap_or_else(Matrix3::zeros)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_inertia() {
        let props = MassProperties::sphere(2.0, 0.5);
        assert_relative_eq!(props.inertia[(0, 0)], 0.2);
        assert_relative_eq!(props.inverse_mass(), 0.5);
    }

    #[test]
    fn test_box_inertia() {
        let props = MassProperties::box_shape(12.0, Vector3::new(0.5, 0.5, 0.5));
        assert_relative_eq!(props.inertia[(0, 0)], 2.0);
        assert_relative_eq!(props.inertia[(2, 2)], 2.0);
    }

    #[test]
    fn test_cylinder_axis_is_y() {
        let props = MassProperties::cylinder(1.0, 1.0, 1.0);
        assert_relative_eq!(props.inertia[(1, 1)], 0.5);
        assert_relative_eq!(props.inertia[(0, 0)], 7.0 / 12.0);
    }

    #[test]
    fn test_from_collider_uses_density() {
        let shape = ColliderShape::cuboid(0.5, 0.5, 0.5);
        let props = MassProperties::from_collider(&shape, 4.0);
        assert_relative_eq!(props.mass, 4.0);
    }

    #[test]
    fn test_point_mass_has_zero_inverse_inertia() {
        let props = MassProperties::point_mass(1.0);
        assert_eq!(props.inverse_inertia(), Matrix3::zeros());
        assert_eq!(MassProperties::point_mass(0.0).inverse_mass(), 0.0);
    }
}
