//! Incremental end-effector commands.

use crate::hand::Side;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Gripper command value for a closed (pinching) gripper.
pub const GRIPPER_CLOSED: f64 = 0.0;

/// Gripper command value for an open gripper.
pub const GRIPPER_OPEN: f64 = 1.0;

/// Incremental 6-DoF command plus gripper openness for one arm.
///
/// All fields are deltas relative to the previous frame, except `gripper`
/// which is absolute: `0.0` closed, `1.0` open.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArmAction {
    /// Translation delta along X (meters).
    pub dx: f64,
    /// Translation delta along Y (meters).
    pub dy: f64,
    /// Translation delta along Z (meters).
    pub dz: f64,
    /// Roll delta (radians).
    pub droll: f64,
    /// Pitch delta (radians).
    pub dpitch: f64,
    /// Yaw delta (radians).
    pub dyaw: f64,
    /// Gripper command.
    pub gripper: f64,
}

impl Default for ArmAction {
    fn default() -> Self {
        Self::zero()
    }
}

impl ArmAction {
    /// No motion, gripper open.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            dz: 0.0,
            droll: 0.0,
            dpitch: 0.0,
            dyaw: 0.0,
            gripper: GRIPPER_OPEN,
        }
    }

    /// No motion with the given gripper command.
    #[must_use]
    pub const fn hold(gripper: f64) -> Self {
        Self {
            gripper,
            ..Self::zero()
        }
    }

    /// Whether the gripper is commanded closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.gripper < 0.5
    }

    /// Whether every delta is exactly zero.
    #[must_use]
    pub fn is_stationary(&self) -> bool {
        [self.dx, self.dy, self.dz, self.droll, self.dpitch, self.dyaw]
            .iter()
            .all(|d| *d == 0.0)
    }
}

/// Commands for both arms for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DualArmAction {
    /// Left arm command.
    pub left: ArmAction,
    /// Right arm command.
    pub right: ArmAction,
}

impl DualArmAction {
    /// Both arms stationary with open grippers.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            left: ArmAction::zero(),
            right: ArmAction::zero(),
        }
    }

    /// Build from two per-arm commands.
    #[must_use]
    pub const fn new(left: ArmAction, right: ArmAction) -> Self {
        Self { left, right }
    }

    /// Command for one side.
    #[must_use]
    pub const fn get(&self, side: Side) -> &ArmAction {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Mutable command for one side.
    pub fn get_mut(&mut self, side: Side) -> &mut ArmAction {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_action() {
        let a = ArmAction::zero();
        assert!(a.is_stationary());
        assert_eq!(a.gripper, GRIPPER_OPEN);
        assert!(!a.is_closed());
        assert_eq!(ArmAction::default(), a);
    }

    #[test]
    fn test_hold_closed() {
        let a = ArmAction::hold(GRIPPER_CLOSED);
        assert!(a.is_stationary());
        assert!(a.is_closed());
    }

    #[test]
    fn test_dual_side_access() {
        let mut dual = DualArmAction::zero();
        dual.get_mut(Side::Right).dx = 0.1;
        assert_eq!(dual.right.dx, 0.1);
        assert_eq!(dual.get(Side::Left).dx, 0.0);
    }
}
