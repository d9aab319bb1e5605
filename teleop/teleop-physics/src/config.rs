//! Physics world configuration.

use nalgebra::Vector3;
use teleop_types::{Result, TeleopError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a [`World`](crate::World).
///
/// The default matches the AR scene: Y-up gravity of 9.81 m/s² and a
/// 120 Hz fixed step.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PhysicsConfig {
    /// Gravitational acceleration (m/s²).
    pub gravity: Vector3<f64>,
    /// Fixed timestep (seconds).
    pub timestep: f64,
    /// Position-projection iterations for joints per step.
    pub solver_iterations: usize,
    /// Whether dynamic bodies rest on fixed cuboids.
    pub enable_contacts: bool,
    /// Maximum linear speed (m/s). Faster bodies are clamped.
    pub max_linear_velocity: Option<f64>,
    /// Maximum angular speed (rad/s). Faster bodies are clamped.
    pub max_angular_velocity: Option<f64>,
    /// Linear velocity damping coefficient (1/s).
    pub linear_damping: f64,
    /// Angular velocity damping coefficient (1/s).
    pub angular_damping: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, -9.81, 0.0),
            timestep: 1.0 / 120.0,
            solver_iterations: 8,
            enable_contacts: true,
            max_linear_velocity: Some(100.0),
            max_angular_velocity: Some(100.0),
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }
}

impl PhysicsConfig {
    /// Configuration with the given timestep.
    #[must_use]
    pub fn with_timestep(timestep: f64) -> Self {
        Self {
            timestep,
            ..Default::default()
        }
    }

    /// Set gravity.
    #[must_use]
    pub fn gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Disable gravity.
    #[must_use]
    pub fn zero_gravity(mut self) -> Self {
        self.gravity = Vector3::zeros();
        self
    }

    /// Set the number of joint projection iterations.
    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.solver_iterations = iterations;
        self
    }

    /// Disable resting contact.
    #[must_use]
    pub fn without_contacts(mut self) -> Self {
        self.enable_contacts = false;
        self
    }

    /// Set velocity damping.
    #[must_use]
    pub fn with_damping(mut self, linear: f64, angular: f64) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Remove velocity limits.
    #[must_use]
    pub fn unlimited(mut self) -> Self {
        self.max_linear_velocity = None;
        self.max_angular_velocity = None;
        self
    }

    /// Step frequency in Hz.
    #[must_use]
    pub fn frequency(&self) -> f64 {
        1.0 / self.timestep
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(TeleopError::InvalidTimestep(self.timestep));
        }

        if self.timestep > 1.0 {
            return Err(TeleopError::invalid_config(
                "timestep > 1 second is likely an error",
            ));
        }

        if self.solver_iterations == 0 {
            return Err(TeleopError::invalid_config(
                "solver_iterations must be at least 1",
            ));
        }

        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(TeleopError::invalid_config("gravity must be finite"));
        }

        for limit in [self.max_linear_velocity, self.max_angular_velocity]
            .into_iter()
            .flatten()
        {
            if limit.is_nan() || limit <= 0.0 {
                return Err(TeleopError::invalid_config(
                    "velocity limits must be positive",
                ));
            }
        }

        if self.linear_damping < 0.0 || self.angular_damping < 0.0 {
            return Err(TeleopError::invalid_config("damping cannot be negative"));
        }

        Ok(())
    }
}
