//! Episode lifecycle: task setup and teardown around the stepper.

use teleop_physics::PhysicsWorld;
use teleop_types::{DualArmAction, EpisodeConfig, Result, SimulationState, TaskKind, TeleopError};
use tracing::info;

use crate::driver::ArmDriver;
use crate::stepper::SimulationStepper;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An object a task wants included in every snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackedObject {
    /// Body id.
    pub id: String,
    /// Type tag reported in [`ObjectState`](teleop_types::ObjectState).
    pub object_type: String,
}

impl TrackedObject {
    /// Create a tracked object.
    #[must_use]
    pub fn new(id: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object_type: object_type.into(),
        }
    }
}

/// Task-side half of an episode.
pub trait TaskLifecycle<W: PhysicsWorld + ?Sized> {
    /// Build the task's bodies and joints. Returns the objects to track.
    fn setup(&mut self, world: &mut W, config: &EpisodeConfig) -> Result<Vec<TrackedObject>>;

    /// Remove everything `setup` created. No-op when nothing is loaded.
    fn teardown(&mut self, world: &mut W);

    /// Return the task to its start state.
    fn reset(&mut self, world: &mut W) -> Result<()>;

    /// Whether the task goal is met.
    fn check_success(&self, world: &W) -> bool;

    /// Completion fraction in `[0, 1]`.
    fn progress(&self, world: &W) -> f64;
}

/// Score of the active episode.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EpisodeScore {
    /// Task being attempted.
    pub task: TaskKind,
    /// Completion fraction in `[0, 1]`.
    pub progress: f64,
    /// Whether the goal is met.
    pub success: bool,
    /// Ticks since the episode started.
    pub steps: u64,
}

/// Brackets task setup and teardown around a [`SimulationStepper`].
///
/// At most one episode is active. Starting a new one always tears the
/// previous one down first.
#[derive(Debug)]
pub struct EpisodeManager<W, D, T> {
    stepper: SimulationStepper<W, D>,
    tasks: T,
    active: Option<EpisodeConfig>,
    steps: u64,
}

impl<W, D, T> EpisodeManager<W, D, T>
where
    W: PhysicsWorld,
    D: ArmDriver<W>,
    T: TaskLifecycle<W>,
{
    /// Create an idle manager.
    #[must_use]
    pub fn new(stepper: SimulationStepper<W, D>, tasks: T) -> Self {
        Self {
            stepper,
            tasks,
            active: None,
            steps: 0,
        }
    }

    /// Start an episode and return its first snapshot.
    ///
    /// # Errors
    ///
    /// Propagates task setup errors. The manager is idle afterwards.
    pub fn start_episode(&mut self, config: EpisodeConfig) -> Result<SimulationState> {
        self.end_episode();

        let objects = match self.tasks.setup(self.stepper.world_mut(), &config) {
            Ok(objects) => objects,
            Err(err) => {
                self.tasks.teardown(self.stepper.world_mut());
                return Err(err);
            }
        };

        let capture = self.stepper.capture_config_mut();
        capture.clear_objects();
        for object in objects {
            capture.track(object.id, Some(object.object_type));
        }

        info!(
            task = %config.task,
            randomize = config.randomize,
            seed = ?config.seed,
            "Episode started"
        );
        self.active = Some(config);
        self.steps = 0;
        Ok(self.stepper.reset())
    }

    /// End the active episode. No-op when idle.
    pub fn end_episode(&mut self) {
        let Some(config) = self.active.take() else {
            return;
        };
        self.stepper.release_all();
        self.tasks.teardown(self.stepper.world_mut());
        self.stepper.capture_config_mut().clear_objects();
        info!(task = %config.task, steps = self.steps, "Episode ended");
    }

    /// Whether an episode is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Configuration of the running episode.
    #[must_use]
    pub const fn current_config(&self) -> Option<&EpisodeConfig> {
        self.active.as_ref()
    }

    /// Advance one tick. Counts toward the episode when one is active.
    pub fn step(&mut self, action: &DualArmAction) -> Result<SimulationState> {
        let state = self.stepper.step(action)?;
        if self.active.is_some() {
            self.steps += 1;
        }
        Ok(state)
    }

    /// Put the active task back to its start state without reloading it.
    ///
    /// # Errors
    ///
    /// [`TeleopError::NoActiveEpisode`] when idle.
    pub fn reset_episode(&mut self) -> Result<SimulationState> {
        if self.active.is_none() {
            return Err(TeleopError::NoActiveEpisode);
        }
        self.stepper.release_all();
        self.tasks.reset(self.stepper.world_mut())?;
        self.steps = 0;
        Ok(self.stepper.reset())
    }

    /// Score of the active episode, `None` when idle.
    #[must_use]
    pub fn score(&self) -> Option<EpisodeScore> {
        let config = self.active.as_ref()?;
        let world = self.stepper.world();
        Some(EpisodeScore {
            task: config.task,
            progress: self.tasks.progress(world),
            success: self.tasks.check_success(world),
            steps: self.steps,
        })
    }

    /// The stepper.
    #[must_use]
    pub const fn stepper(&self) -> &SimulationStepper<W, D> {
        &self.stepper
    }

    /// Mutable stepper.
    pub fn stepper_mut(&mut self) -> &mut SimulationStepper<W, D> {
        &mut self.stepper
    }

    /// The task lifecycle implementation.
    #[must_use]
    pub const fn tasks(&self) -> &T {
        &self.tasks
    }
}
