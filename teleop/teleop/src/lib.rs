//! Hand-tracked dual-arm teleoperation.
//!
//! This crate wires the workspace together: XR hand input drives two
//! kinematic grippers in a rigid-body world, a task is scored while the
//! operator works, and every tick yields a [`SimulationState`] snapshot.
//!
//! # Crates
//!
//! | Crate | Provides |
//! |-------|----------|
//! | `teleop-types` | Hand poses, actions, snapshots, errors |
//! | `teleop-physics` | The [`PhysicsWorld`] capability and the built-in [`World`] |
//! | `teleop-hand` | Pose extraction from [`XrFrame`]s, pinch detection |
//! | `teleop-core` | Mapping, grasps, stepping, capture, episodes |
//! | `teleop-tasks` | Pick-and-place, valve turning, handle rotation |
//!
//! # Quick Start
//!
//! ```
//! use teleop::prelude::*;
//! use nalgebra::{Point3, UnitQuaternion};
//!
//! let mut session = TeleopSession::new(TeleopConfig::default()).unwrap();
//! session.start_episode(EpisodeConfig::new(TaskKind::PickAndPlace)).unwrap();
//!
//! let hand = RecordedHand::synthetic(Point3::new(-0.2, 1.2, -0.2), UnitQuaternion::identity(), 0.05);
//! let frame = RecordedFrame::new().with_hand(Handedness::Left, hand);
//!
//! let output = session.process_frame(&frame).unwrap();
//! assert_eq!(output.hands_tracked, 1);
//! assert!(output.score.is_some());
//! ```
//!
//! [`SimulationState`]: teleop_types::SimulationState
//! [`PhysicsWorld`]: teleop_physics::PhysicsWorld
//! [`World`]: teleop_physics::World
//! [`XrFrame`]: teleop_hand::XrFrame

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
)]

mod config;
mod session;

pub use config::{GraspAssistConfig, TeleopConfig};
pub use session::{Episodes, FrameOutput, TeleopSession};

pub use teleop_types::{Result, TeleopError};

/// Common imports for driving a session.
pub mod prelude {
    pub use crate::{FrameOutput, GraspAssistConfig, TeleopConfig, TeleopSession};

    pub use teleop_core::{
        EpisodeScore, HandToActionMapper, KinematicDriverConfig, MapperConfig,
    };
    pub use teleop_hand::{
        HandTracker, PinchConfig, RecordedFrame, RecordedHand, RecordedInputSource,
        ReferenceSpace, XrFrame,
    };
    pub use teleop_physics::{PhysicsConfig, PhysicsWorld, World};
    pub use teleop_tasks::{TaskConfigs, TaskManager};
    pub use teleop_types::{
        ArmAction, DualArmAction, EpisodeConfig, HandPose, Handedness, Side, SimulationState,
        TaskKind, TeleopError,
    };
}
