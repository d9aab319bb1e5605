//! Error types for teleoperation operations.

use thiserror::Error;

/// Errors that can occur while tracking, stepping, or configuring a session.
///
/// Missing-data conditions (absent joints, absent fingertips, missing bodies
/// during capture) are never reported through this type; they degrade to
/// defaults at the component boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeleopError {
    /// A body referenced by id does not exist in the physics world.
    #[error("body not found: {id}")]
    BodyNotFound {
        /// Id of the missing body.
        id: String,
    },

    /// A body with the same id is already present.
    #[error("body already exists: {id}")]
    DuplicateBody {
        /// The conflicting id.
        id: String,
    },

    /// A joint handle does not refer to a live joint.
    #[error("joint not found: {0}")]
    JointNotFound(u64),

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// Simulation diverged (`NaN` or `Inf` detected).
    #[error("simulation diverged: {reason}")]
    Diverged {
        /// Description of what went wrong.
        reason: String,
    },

    /// The frame offers no way to query joint poses at all.
    #[error("joint pose query is not available on this frame")]
    PoseQueryUnavailable,

    /// An operation required an active episode.
    #[error("no active episode")]
    NoActiveEpisode,

    /// Configuration text could not be parsed.
    #[error("failed to parse configuration: {reason}")]
    ConfigParse {
        /// Parser message.
        reason: String,
    },
}

impl TeleopError {
    /// Create a body-not-found error.
    #[must_use]
    pub fn body_not_found(id: impl Into<String>) -> Self {
        Self::BodyNotFound { id: id.into() }
    }

    /// Create a diverged error.
    #[must_use]
    pub fn diverged(reason: impl Into<String>) -> Self {
        Self::Diverged {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Check if this is a divergence error.
    #[must_use]
    pub fn is_diverged(&self) -> bool {
        matches!(self, Self::Diverged { .. })
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::InvalidTimestep(_) | Self::ConfigParse { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TeleopError::body_not_found("gripper-left");
        assert!(err.to_string().contains("gripper-left"));

        let err = TeleopError::JointNotFound(7);
        assert!(err.to_string().contains('7'));

        let err = TeleopError::diverged("NaN in velocity");
        assert!(err.to_string().contains("NaN"));
    }

    #[test]
    fn test_error_predicates() {
        let err = TeleopError::diverged("test");
        assert!(err.is_diverged());
        assert!(!err.is_config_error());

        let err = TeleopError::invalid_config("bad value");
        assert!(err.is_config_error());
        assert!(!err.is_diverged());

        assert!(TeleopError::InvalidTimestep(-1.0).is_config_error());
        assert!(!TeleopError::PoseQueryUnavailable.is_config_error());
    }
}
