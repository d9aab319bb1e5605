//! Closed set of task environments.

use teleop_core::TrackedObject;
use teleop_physics::PhysicsWorld;
use teleop_types::{EpisodeConfig, Result, TaskKind};

use crate::handle::{HandleConfig, HandleRotationTask};
use crate::pick_place::{PickAndPlaceTask, PickPlaceConfig};
use crate::valve::{ValveConfig, ValveTurningTask};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-task configuration, one entry per [`TaskKind`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TaskConfigs {
    /// Pick-and-place layout.
    pub pick_place: PickPlaceConfig,
    /// Valve layout.
    pub valve: ValveConfig,
    /// Handle layout.
    pub handle: HandleConfig,
}

impl TaskConfigs {
    /// Validate every task configuration.
    pub fn validate(&self) -> Result<()> {
        self.pick_place.validate()?;
        self.valve.validate()?;
        self.handle.validate()
    }
}

/// One loaded task. Dispatch is a plain `match`; the set is closed.
#[derive(Debug, Clone)]
pub enum TaskEnvironment {
    /// Move cubes into target zones.
    PickAndPlace(PickAndPlaceTask),
    /// Turn a valve wheel.
    ValveTurning(ValveTurningTask),
    /// Swing a lever to an angle.
    HandleRotation(HandleRotationTask),
}

impl TaskEnvironment {
    /// Unloaded environment of the given kind.
    #[must_use]
    pub fn from_kind(kind: TaskKind, configs: &TaskConfigs) -> Self {
        match kind {
            TaskKind::PickAndPlace => {
                Self::PickAndPlace(PickAndPlaceTask::new(configs.pick_place.clone()))
            }
            TaskKind::ValveTurning => Self::ValveTurning(ValveTurningTask::new(configs.valve)),
            TaskKind::HandleRotation => {
                Self::HandleRotation(HandleRotationTask::new(configs.handle))
            }
        }
    }

    /// Which task this is.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        match self {
            Self::PickAndPlace(_) => TaskKind::PickAndPlace,
            Self::ValveTurning(_) => TaskKind::ValveTurning,
            Self::HandleRotation(_) => TaskKind::HandleRotation,
        }
    }

    /// Spawn the task's bodies and joints.
    pub fn setup<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        episode: &EpisodeConfig,
    ) -> Result<()> {
        match self {
            Self::PickAndPlace(task) => task.setup(world, episode),
            Self::ValveTurning(task) => task.setup(world, episode),
            Self::HandleRotation(task) => task.setup(world, episode),
        }
    }

    /// Remove the task's bodies and joints.
    pub fn teardown<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        match self {
            Self::PickAndPlace(task) => task.teardown(world),
            Self::ValveTurning(task) => task.teardown(world),
            Self::HandleRotation(task) => task.teardown(world),
        }
    }

    /// Restore the start state.
    pub fn reset<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<()> {
        match self {
            Self::PickAndPlace(task) => task.reset(world),
            Self::ValveTurning(task) => task.reset(world),
            Self::HandleRotation(task) => task.reset(world),
        }
    }

    /// Whether the goal is met.
    #[must_use]
    pub fn check_success<W: PhysicsWorld + ?Sized>(&self, world: &W) -> bool {
        match self {
            Self::PickAndPlace(task) => task.check_success(world),
            Self::ValveTurning(task) => task.check_success(world),
            Self::HandleRotation(task) => task.check_success(world),
        }
    }

    /// Progress in `[0, 1]`.
    #[must_use]
    pub fn progress<W: PhysicsWorld + ?Sized>(&self, world: &W) -> f64 {
        match self {
            Self::PickAndPlace(task) => task.progress(world),
            Self::ValveTurning(task) => task.progress(world),
            Self::HandleRotation(task) => task.progress(world),
        }
    }

    /// Bodies to include in snapshots.
    #[must_use]
    pub fn tracked_objects(&self) -> Vec<TrackedObject> {
        match self {
            Self::PickAndPlace(task) => task.tracked_objects(),
            Self::ValveTurning(task) => task.tracked_objects(),
            Self::HandleRotation(task) => task.tracked_objects(),
        }
    }
}
