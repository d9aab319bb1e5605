//! Session configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use teleop_core::{CaptureConfig, KinematicDriverConfig, MapperConfig};
use teleop_hand::{PinchConfig, ReferenceSpace};
use teleop_physics::PhysicsConfig;
use teleop_tasks::TaskConfigs;
use teleop_types::{Result, TeleopError};

/// Automatic grasping driven by the gripper command.
///
/// While a gripper is commanded closed and holds nothing, it grasps the
/// nearest tracked object whose center lies within `radius` of the
/// gripper. Commanding it open releases the grasp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraspAssistConfig {
    /// Whether the session grasps and releases on its own.
    pub enabled: bool,
    /// Reach around the gripper origin (meters).
    pub radius: f64,
}

impl Default for GraspAssistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 0.06,
        }
    }
}

impl GraspAssistConfig {
    /// Assist turned off. Grasps are then only made through the stepper.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set the reach.
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(TeleopError::invalid_config(format!(
                "grasp assist radius must be non-negative, got {}",
                self.radius
            )));
        }
        Ok(())
    }
}

/// Everything a [`TeleopSession`](crate::TeleopSession) needs.
///
/// Every section falls back to its default when absent from JSON, so
/// `{}` is a valid configuration.
///
/// # Example
///
/// ```
/// use teleop::TeleopConfig;
///
/// let config = TeleopConfig::from_json_str(
///     r#"{ "mapper": { "translation_scale": 1.5 }, "grasp_assist": { "radius": 0.08 } }"#,
/// ).unwrap();
/// assert_eq!(config.mapper.translation_scale, 1.5);
/// assert_eq!(config.pinch.threshold, 0.02);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleopConfig {
    /// Physics world.
    pub physics: PhysicsConfig,
    /// Pinch detection.
    pub pinch: PinchConfig,
    /// Hand-to-action scaling.
    pub mapper: MapperConfig,
    /// Gripper bodies and how they move. Its arm ids are also the ids
    /// captured into snapshots.
    pub driver: KinematicDriverConfig,
    /// Automatic grasping.
    pub grasp_assist: GraspAssistConfig,
    /// Per-task layouts.
    pub tasks: TaskConfigs,
    /// Frame hand joints are resolved in.
    pub reference_space: ReferenceSpace,
}

impl TeleopConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// [`TeleopError::ConfigParse`] for malformed JSON, otherwise any
    /// validation error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| TeleopError::ConfigParse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// [`TeleopError::ConfigParse`] when the file cannot be read or parsed,
    /// otherwise any validation error.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| TeleopError::ConfigParse {
            reason: format!("cannot read '{}': {e}", path.display()),
        })?;
        Self::from_json_str(&content)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// [`TeleopError::ConfigParse`] if a value cannot be represented.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| TeleopError::ConfigParse {
            reason: e.to_string(),
        })
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.physics.validate()?;
        self.pinch.validate()?;
        self.mapper.validate()?;
        self.driver.validate()?;
        CaptureConfig::new()
            .with_arm_ids(self.driver.arm_ids.clone())
            .validate()?;
        self.grasp_assist.validate()?;
        self.tasks.validate()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = TeleopConfig::from_json_str("{}").unwrap();
        assert_eq!(config, TeleopConfig::default());
        assert_eq!(config.reference_space, ReferenceSpace::LocalFloor);
        assert_eq!(config.grasp_assist.radius, 0.06);
    }

    #[test]
    fn test_partial_sections() {
        let config = TeleopConfig::from_json_str(
            r#"{
                "physics": { "timestep": 0.01 },
                "driver": { "arm_ids": { "left": "l", "right": "r" } },
                "tasks": { "valve": { "target_angle": 1.0 } },
                "reference_space": "local"
            }"#,
        )
        .unwrap();
        assert_eq!(config.physics.timestep, 0.01);
        assert_eq!(config.physics.solver_iterations, 8);
        assert_eq!(config.driver.arm_ids.left, "l");
        assert_eq!(config.tasks.valve.target_angle, 1.0);
        assert_eq!(config.tasks.handle, teleop_tasks::HandleConfig::default());
        assert_eq!(config.reference_space, ReferenceSpace::Local);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = TeleopConfig::from_json_str("{ physics: ").unwrap_err();
        assert!(matches!(err, TeleopError::ConfigParse { .. }));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_invalid_values_rejected_after_parse() {
        let err = TeleopConfig::from_json_str(r#"{ "pinch": { "threshold": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, TeleopError::InvalidConfig { .. }));

        let err =
            TeleopConfig::from_json_str(r#"{ "grasp_assist": { "radius": -0.1 } }"#).unwrap_err();
        assert!(matches!(err, TeleopError::InvalidConfig { .. }));

        let err = TeleopConfig::from_json_str(
            r#"{ "driver": { "arm_ids": { "left": "g", "right": "g" } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, TeleopError::InvalidConfig { .. }));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = TeleopConfig::default();
        config.grasp_assist = GraspAssistConfig::disabled();
        let json = config.to_json_string().unwrap();
        assert_eq!(TeleopConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let err = TeleopConfig::from_json_file("/nonexistent/teleop.json").unwrap_err();
        assert!(matches!(err, TeleopError::ConfigParse { .. }));
    }
}
