//! Teleoperation control loop.
//!
//! Everything between a tracked hand and a scored simulation tick:
//!
//! - [`HandToActionMapper`]: consecutive [`HandPose`]s to an [`ArmAction`]
//! - [`GraspManager`]: fixed-joint grasp constraints, at most one per gripper
//! - [`ArmDriver`]: applies arm commands to the world
//! - [`SimulationStepper`]: apply, step, capture, in that order
//! - [`StateCapture`]: post-step [`SimulationState`] snapshots
//! - [`EpisodeManager`]: task setup and teardown around the stepper
//!
//! All of it is single-threaded and synchronous. One tick is one call to
//! [`SimulationStepper::step`].
//!
//! [`HandPose`]: teleop_types::HandPose
//! [`ArmAction`]: teleop_types::ArmAction
//! [`SimulationState`]: teleop_types::SimulationState

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
)]

mod capture;
mod driver;
mod episode;
mod grasp;
mod mapper;
mod stepper;

pub use capture::{ArmIds, CaptureConfig, StateCapture, DEFAULT_LEFT_GRIPPER, DEFAULT_RIGHT_GRIPPER};
pub use driver::{ArmDriver, KinematicDriverConfig, KinematicGripperDriver, NullDriver};
pub use episode::{EpisodeManager, EpisodeScore, TaskLifecycle, TrackedObject};
pub use grasp::{GraspConstraint, GraspManager};
pub use mapper::{gripper_command, EulerAngles, HandToActionMapper, MapperConfig};
pub use stepper::SimulationStepper;

pub use teleop_types::{Result, TeleopError};
