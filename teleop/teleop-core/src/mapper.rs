//! Hand pose deltas to incremental arm commands.
//!
//! Translation deltas are wrist displacement between two consecutive poses.
//! Rotation deltas are differences of independently decoded roll/pitch/yaw
//! angles. Euler differencing inherits the gimbal-lock discontinuity near
//! pitch = ±π/2 and the ±π wrap of roll and yaw; callers that need smooth
//! rotation deltas across those regions must filter the output themselves.

use std::f64::consts::FRAC_PI_2;

use nalgebra::UnitQuaternion;
use teleop_types::{ArmAction, HandPose, Result, TeleopError, GRIPPER_CLOSED, GRIPPER_OPEN};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scale factors applied to hand motion.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MapperConfig {
    /// Multiplier on wrist translation deltas.
    pub translation_scale: f64,
    /// Multiplier on roll/pitch/yaw deltas.
    pub rotation_scale: f64,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            translation_scale: 1.0,
            rotation_scale: 1.0,
        }
    }
}

impl MapperConfig {
    /// Set the translation scale.
    #[must_use]
    pub fn with_translation_scale(mut self, scale: f64) -> Self {
        self.translation_scale = scale;
        self
    }

    /// Set the rotation scale.
    #[must_use]
    pub fn with_rotation_scale(mut self, scale: f64) -> Self {
        self.rotation_scale = scale;
        self
    }

    /// Validate the configuration. Scales must be finite; zero and
    /// negative scales are allowed (freeze or mirror an axis group).
    pub fn validate(&self) -> Result<()> {
        if !self.translation_scale.is_finite() {
            return Err(TeleopError::invalid_config("translation_scale must be finite"));
        }
        if !self.rotation_scale.is_finite() {
            return Err(TeleopError::invalid_config("rotation_scale must be finite"));
        }
        Ok(())
    }
}

/// Aerospace roll (X), pitch (Y), yaw (Z) angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EulerAngles {
    /// Rotation about X, in `(-π, π]`.
    pub roll: f64,
    /// Rotation about Y, in `[-π/2, π/2]`.
    pub pitch: f64,
    /// Rotation about Z, in `(-π, π]`.
    pub yaw: f64,
}

impl EulerAngles {
    /// Decode a unit quaternion.
    ///
    /// Pitch saturates to `±π/2` once `|2(wy - zx)|` reaches 1.
    #[must_use]
    pub fn from_quaternion(q: &UnitQuaternion<f64>) -> Self {
        let (x, y, z, w) = (q.i, q.j, q.k, q.w);

        let sinr_cosp = 2.0 * (w * x + y * z);
        let cosr_cosp = 1.0 - 2.0 * (x * x + y * y);
        let roll = sinr_cosp.atan2(cosr_cosp);

        let sinp = 2.0 * (w * y - z * x);
        let pitch = if sinp.abs() >= 1.0 {
            FRAC_PI_2.copysign(sinp)
        } else {
            sinp.asin()
        };

        let siny_cosp = 2.0 * (w * z + x * y);
        let cosy_cosp = 1.0 - 2.0 * (y * y + z * z);
        let yaw = siny_cosp.atan2(cosy_cosp);

        Self { roll, pitch, yaw }
    }
}

/// Gripper command for a pinch reading: closed while pinching.
#[must_use]
pub fn gripper_command(pose: &HandPose) -> f64 {
    if pose.pinch_state.is_pinching {
        GRIPPER_CLOSED
    } else {
        GRIPPER_OPEN
    }
}

/// Converts consecutive hand poses into [`ArmAction`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandToActionMapper {
    config: MapperConfig,
}

impl HandToActionMapper {
    /// Create a mapper.
    #[must_use]
    pub const fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Map `current` relative to `previous`.
    ///
    /// Without a previous pose every delta is zero. The gripper always
    /// follows the current pinch state only.
    #[must_use]
    pub fn map_hand_to_action(&self, current: &HandPose, previous: Option<&HandPose>) -> ArmAction {
        let gripper = gripper_command(current);
        let Some(previous) = previous else {
            return ArmAction::hold(gripper);
        };

        let t = self.config.translation_scale;
        let d = current.wrist_position - previous.wrist_position;

        let r = self.config.rotation_scale;
        let now = EulerAngles::from_quaternion(&current.wrist_orientation);
        let before = EulerAngles::from_quaternion(&previous.wrist_orientation);

        ArmAction {
            dx: d.x * t,
            dy: d.y * t,
            dz: d.z * t,
            droll: (now.roll - before.roll) * r,
            dpitch: (now.pitch - before.pitch) * r,
            dyaw: (now.yaw - before.yaw) * r,
            gripper,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};
    use teleop_types::{HandJoint, JointData, JointMap, PinchState, Side};

    fn pose(position: Point3<f64>, orientation: UnitQuaternion<f64>, pinching: bool) -> HandPose {
        HandPose {
            handedness: Side::Right,
            timestamp: 0.0,
            joints: JointMap::new(),
            pinch_state: PinchState {
                is_pinching: pinching,
                distance: if pinching { 0.01 } else { 0.05 },
            },
            wrist_position: position,
            wrist_orientation: orientation,
        }
    }

    #[test]
    fn test_first_observation_is_zero() {
        let mapper = HandToActionMapper::default();
        let current = pose(
            Point3::new(3.0, -2.0, 1.0),
            UnitQuaternion::from_euler_angles(0.4, 0.2, -1.0),
            false,
        );
        let action = mapper.map_hand_to_action(&current, None);
        assert!(action.is_stationary());
        assert_eq!(action.gripper, GRIPPER_OPEN);

        let pinching = pose(Point3::origin(), UnitQuaternion::identity(), true);
        assert_eq!(mapper.map_hand_to_action(&pinching, None).gripper, GRIPPER_CLOSED);
    }

    #[test]
    fn test_identical_wrists_give_zero_deltas() {
        let mapper = HandToActionMapper::new(
            MapperConfig::default()
                .with_translation_scale(3.0)
                .with_rotation_scale(2.0),
        );
        let rot = UnitQuaternion::from_euler_angles(0.3, -0.5, 2.0);
        let previous = pose(Point3::new(0.1, 1.0, -0.2), rot, false);
        let mut current = previous.clone();
        current
            .joints
            .insert(HandJoint::ThumbTip, JointData::at(Point3::new(9.0, 9.0, 9.0)));

        let action = mapper.map_hand_to_action(&current, Some(&previous));
        assert_relative_eq!(action.dx, 0.0);
        assert_relative_eq!(action.dy, 0.0);
        assert_relative_eq!(action.dz, 0.0);
        assert_relative_eq!(action.droll, 0.0);
        assert_relative_eq!(action.dpitch, 0.0);
        assert_relative_eq!(action.dyaw, 0.0);
    }

    #[test]
    fn test_translation_scaled() {
        let mapper =
            HandToActionMapper::new(MapperConfig::default().with_translation_scale(2.0));
        let previous = pose(Point3::new(0.0, 1.0, 0.0), UnitQuaternion::identity(), false);
        let current = pose(Point3::new(0.01, 0.98, 0.03), UnitQuaternion::identity(), true);

        let action = mapper.map_hand_to_action(&current, Some(&previous));
        assert_relative_eq!(action.dx, 0.02, epsilon = 1e-12);
        assert_relative_eq!(action.dy, -0.04, epsilon = 1e-12);
        assert_relative_eq!(action.dz, 0.06, epsilon = 1e-12);
        assert_eq!(action.gripper, GRIPPER_CLOSED);
    }

    #[test]
    fn test_rotation_deltas_are_euler_differences() {
        let mapper = HandToActionMapper::new(MapperConfig::default().with_rotation_scale(0.5));
        let previous = pose(
            Point3::origin(),
            UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3),
            false,
        );
        let current = pose(
            Point3::origin(),
            UnitQuaternion::from_euler_angles(0.3, 0.1, 0.7),
            false,
        );

        let action = mapper.map_hand_to_action(&current, Some(&previous));
        assert_relative_eq!(action.droll, 0.1, epsilon = 1e-9);
        assert_relative_eq!(action.dpitch, -0.05, epsilon = 1e-9);
        assert_relative_eq!(action.dyaw, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn test_gripper_ignores_previous_pinch() {
        let mapper = HandToActionMapper::default();
        let previous = pose(Point3::origin(), UnitQuaternion::identity(), true);
        let current = pose(Point3::origin(), UnitQuaternion::identity(), false);
        assert_eq!(
            mapper.map_hand_to_action(&current, Some(&previous)).gripper,
            GRIPPER_OPEN
        );
    }

    #[test]
    fn test_euler_matches_nalgebra_away_from_gimbal_lock() {
        let q = UnitQuaternion::from_euler_angles(0.7, -0.4, 1.9);
        let e = EulerAngles::from_quaternion(&q);
        let (roll, pitch, yaw) = q.euler_angles();
        assert_relative_eq!(e.roll, roll, epsilon = 1e-12);
        assert_relative_eq!(e.pitch, pitch, epsilon = 1e-12);
        assert_relative_eq!(e.yaw, yaw, epsilon = 1e-12);
    }

    #[test]
    fn test_pitch_saturates_at_gimbal_lock() {
        let up = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);
        assert_relative_eq!(EulerAngles::from_quaternion(&up).pitch, FRAC_PI_2, epsilon = 1e-7);

        let down = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -FRAC_PI_2);
        assert_relative_eq!(
            EulerAngles::from_quaternion(&down).pitch,
            -FRAC_PI_2,
            epsilon = 1e-7
        );
    }

    #[test]
    fn test_yaw_wrap_produces_large_delta() {
        // Crossing yaw = π flips the decoded yaw sign. The mapper reports
        // the raw difference.
        let mapper = HandToActionMapper::default();
        let previous = pose(
            Point3::origin(),
            UnitQuaternion::from_euler_angles(0.0, 0.0, 3.1),
            false,
        );
        let current = pose(
            Point3::origin(),
            UnitQuaternion::from_euler_angles(0.0, 0.0, -3.1),
            false,
        );
        let action = mapper.map_hand_to_action(&current, Some(&previous));
        assert_relative_eq!(action.dyaw, -6.2, epsilon = 1e-9);
    }

    #[test]
    fn test_config_validation() {
        assert!(MapperConfig::default().validate().is_ok());
        assert!(MapperConfig::default()
            .with_translation_scale(f64::NAN)
            .validate()
            .is_err());
        assert!(MapperConfig::default()
            .with_rotation_scale(f64::INFINITY)
            .validate()
            .is_err());
        assert!(MapperConfig::default()
            .with_rotation_scale(0.0)
            .validate()
            .is_ok());
    }
}
