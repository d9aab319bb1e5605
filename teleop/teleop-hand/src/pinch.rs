//! Thumb-index pinch detection.
//!
//! Every frame is evaluated independently: no smoothing, no hysteresis.
//! Readings that straddle the threshold flicker between frames.

use teleop_types::{HandJoint, JointMap, PinchState, Result, TeleopError, PINCH_THRESHOLD};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pinch detector configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PinchConfig {
    /// Thumb-to-index distance below which a pinch is reported (meters).
    pub threshold: f64,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            threshold: PINCH_THRESHOLD,
        }
    }
}

impl PinchConfig {
    /// Set the threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(TeleopError::invalid_config(format!(
                "pinch threshold must be positive, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Thumb-tip to index-tip distance, `None` if either tip is missing.
#[must_use]
pub fn pinch_distance(joints: &JointMap) -> Option<f64> {
    let thumb = joints.get(&HandJoint::ThumbTip)?;
    let index = joints.get(&HandJoint::IndexFingerTip)?;
    Some(nalgebra::distance(&thumb.position, &index.position))
}

/// Decides whether a joint map shows a pinch.
#[derive(Debug, Clone, Copy, Default)]
pub struct PinchDetector {
    config: PinchConfig,
}

impl PinchDetector {
    /// Create a detector.
    #[must_use]
    pub const fn new(config: PinchConfig) -> Self {
        Self { config }
    }

    /// Configured threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// Evaluate one joint map.
    ///
    /// Missing fingertips yield `{ is_pinching: false, distance: inf }`.
    /// Otherwise `is_pinching` is `distance < threshold`.
    #[must_use]
    pub fn detect(&self, joints: &JointMap) -> PinchState {
        match pinch_distance(joints) {
            Some(distance) => PinchState {
                is_pinching: distance < self.config.threshold,
                distance,
            },
            None => PinchState::untracked(),
        }
    }
}
