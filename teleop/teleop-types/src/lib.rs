//! Core data types for hand-driven dual-arm teleoperation.
//!
//! This crate is **pure data**: hand poses extracted from spatial tracking,
//! incremental arm commands, physics-boundary descriptors, and the immutable
//! snapshots captured after each simulation tick. It is the common language
//! between:
//!
//! - Hand tracking (`teleop-hand`)
//! - The physics world (`teleop-physics`)
//! - The control loop and capture (`teleop-core`)
//! - Task environments and scoring (`teleop-tasks`)
//!
//! # Coordinate System
//!
//! Matches the AR reference frame:
//!
//! - X: right
//! - Y: up
//! - Z: toward the viewer
//! - Right-handed, meters
//!
//! # Example
//!
//! ```
//! use teleop_types::{ArmAction, DualArmAction, SimulationState};
//!
//! let action = DualArmAction::zero();
//! assert!(action.left.is_stationary());
//! assert_eq!(action.right.gripper, 1.0);
//!
//! let state = SimulationState::default();
//! assert!(!state.any_grasping());
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
)]

mod action;
mod body;
mod clock;
mod episode;
mod error;
mod hand;
mod state;

pub use action::{ArmAction, DualArmAction, GRIPPER_CLOSED, GRIPPER_OPEN};
pub use body::{
    angle_about_axis, BodyDescriptor, BodyKind, ColliderShape, JointHandle, JointLimits, Pose,
    Twist, DEFAULT_DENSITY,
};
pub use clock::MonotonicClock;
pub use episode::{EpisodeConfig, TaskKind};
pub use error::TeleopError;
pub use hand::{
    quat_from_xyzw, HandJoint, HandPose, Handedness, JointData, JointMap, PinchState, Side,
    ALL_JOINTS, DEFAULT_JOINT_RADIUS, JOINT_COUNT, PINCH_THRESHOLD,
};
pub use state::{ArmState, ObjectState, SimulationState, UNKNOWN_OBJECT_TYPE};

// Re-export nalgebra types commonly used with this crate
pub use nalgebra::{Isometry3, Point3, Quaternion, UnitQuaternion, Vector3};

/// Result type for teleoperation operations.
pub type Result<T> = std::result::Result<T, TeleopError>;
