//! Hand pose extraction from spatial-tracking input.
//!
//! Turns per-frame XR hand-tracking samples into [`HandPose`]s: one per
//! tracked side, each with the resolved joint map, the wrist pose and a
//! thumb-index [`PinchState`].
//!
//! # Input Abstraction
//!
//! The tracking runtime is reached through the [`XrFrame`] family of traits
//! so the extractor can run against a live runtime binding or against
//! [`RecordedFrame`] data in tests and replays.
//!
//! # Missing Data
//!
//! Partial tracking is normal. Missing joints are skipped, a hand without
//! any resolved joint is omitted, and missing fingertips produce a pinch
//! distance of `+inf`. The only error is a frame that cannot resolve joint
//! poses at all.
//!
//! [`HandPose`]: teleop_types::HandPose
//! [`PinchState`]: teleop_types::PinchState

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
)]

mod pinch;
mod recorded;
mod tracker;
pub mod xr;

pub use pinch::{pinch_distance, PinchConfig, PinchDetector};
pub use recorded::{RecordedFrame, RecordedHand, RecordedInputSource};
pub use tracker::{HandPoses, HandTracker};
pub use xr::{
    JointPoseQuery, JointSpace, ReferenceSpace, XrFrame, XrHand, XrInputSource, XrJointPose,
};

pub use teleop_types::{Result, TeleopError};
