//! Time integration helpers for rigid bodies.
//!
//! Bodies are advanced with semi-implicit (symplectic) Euler:
//!
//! ```text
//! v(t+dt) = v(t) + a(t) * dt
//! x(t+dt) = x(t) + v(t+dt) * dt
//! ```
//!
//! After joint and contact projection the world re-derives velocities from
//! the corrected displacement, see [`velocity_from_displacement`].

use nalgebra::{UnitQuaternion, Vector3};
use teleop_types::{Pose, Twist};

/// Advance `pose` and `twist` by `dt` under the given accelerations.
pub fn semi_implicit_euler(
    pose: &mut Pose,
    twist: &mut Twist,
    linear_accel: Vector3<f64>,
    angular_accel: Vector3<f64>,
    dt: f64,
) {
    twist.linear += linear_accel * dt;
    twist.angular += angular_accel * dt;

    pose.position += twist.linear * dt;
    integrate_rotation(&mut pose.rotation, &twist.angular, dt);
}

/// Rotate by a world-frame angular velocity over `dt`.
///
/// q(t+dt) = exp(omega * dt) * q(t)
pub fn integrate_rotation(rotation: &mut UnitQuaternion<f64>, omega: &Vector3<f64>, dt: f64) {
    if omega.norm() < 1e-12 {
        return;
    }
    *rotation = UnitQuaternion::from_scaled_axis(omega * dt) * *rotation;
}

/// Velocity that carries `previous` to `current` in `dt`.
#[must_use]
pub fn velocity_from_displacement(previous: &Pose, current: &Pose, dt: f64) -> Twist {
    let linear = (current.position - previous.position) / dt;
    let delta = current.rotation * previous.rotation.inverse();
    Twist::new(linear, delta.scaled_axis() / dt)
}

/// Exponential velocity damping.
#[must_use]
pub fn apply_damping(twist: &Twist, linear_damping: f64, angular_damping: f64, dt: f64) -> Twist {
    let linear_factor = (-linear_damping * dt).exp();
    let angular_factor = (-angular_damping * dt).exp();

    Twist::new(twist.linear * linear_factor, twist.angular * angular_factor)
}

/// Clamp linear and angular speed, each limit optional.
#[must_use]
pub fn clamp_velocities(twist: &Twist, max_linear: Option<f64>, max_angular: Option<f64>) -> Twist {
    let clamp = |v: Vector3<f64>, max: Option<f64>| match max {
        Some(max) if v.norm() > max => v.normalize() * max,
        _ => v,
    };

    Twist::new(
        clamp(twist.linear, max_linear),
        clamp(twist.angular, max_angular),
    )
}
