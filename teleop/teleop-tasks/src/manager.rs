//! Owns at most one loaded task.

use teleop_core::{TaskLifecycle, TrackedObject};
use teleop_physics::PhysicsWorld;
use teleop_types::{EpisodeConfig, Result, TaskKind};
use tracing::{debug, info};

use crate::environment::{TaskConfigs, TaskEnvironment};

/// Loads, scores and unloads task environments.
///
/// Loading a task always tears the previous one down first, so the world
/// never holds bodies from two tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskManager {
    configs: TaskConfigs,
    current: Option<TaskEnvironment>,
}

impl TaskManager {
    /// Create an idle manager.
    #[must_use]
    pub fn new(configs: TaskConfigs) -> Self {
        Self {
            configs,
            current: None,
        }
    }

    /// Per-task configuration used for the next load.
    #[must_use]
    pub const fn configs(&self) -> &TaskConfigs {
        &self.configs
    }

    /// Mutable per-task configuration. Takes effect on the next load.
    pub fn configs_mut(&mut self) -> &mut TaskConfigs {
        &mut self.configs
    }

    /// Load the task `episode` names and return the objects to track.
    ///
    /// On error the partially built task stays current, so a following
    /// [`TaskManager::unload_task`] removes whatever it spawned.
    pub fn load_task<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        episode: &EpisodeConfig,
    ) -> Result<Vec<TrackedObject>> {
        self.unload_task(world);

        let env = self
            .current
            .insert(TaskEnvironment::from_kind(episode.task, &self.configs));
        env.setup(world, episode)?;

        let objects = env.tracked_objects();
        info!(
            task = %episode.task,
            objects = objects.len(),
            "Task loaded"
        );
        Ok(objects)
    }

    /// Tear down the current task. No-op when idle.
    pub fn unload_task<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        if let Some(mut env) = self.current.take() {
            env.teardown(world);
            debug!(task = %env.kind(), "Task unloaded");
        }
    }

    /// The loaded task.
    #[must_use]
    pub const fn current(&self) -> Option<&TaskEnvironment> {
        self.current.as_ref()
    }

    /// Kind of the loaded task.
    #[must_use]
    pub fn current_kind(&self) -> Option<TaskKind> {
        self.current.as_ref().map(TaskEnvironment::kind)
    }

    /// Whether the loaded task's goal is met. False when idle.
    #[must_use]
    pub fn check_success<W: PhysicsWorld + ?Sized>(&self, world: &W) -> bool {
        self.current
            .as_ref()
            .is_some_and(|env| env.check_success(world))
    }

    /// Progress of the loaded task. Zero when idle.
    #[must_use]
    pub fn progress<W: PhysicsWorld + ?Sized>(&self, world: &W) -> f64 {
        self.current
            .as_ref()
            .map_or(0.0, |env| env.progress(world))
    }

    /// Restore the loaded task's start state. No-op when idle.
    pub fn reset_current<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<()> {
        match self.current.as_mut() {
            Some(env) => env.reset(world),
            None => Ok(()),
        }
    }
}

impl<W: PhysicsWorld + ?Sized> TaskLifecycle<W> for TaskManager {
    fn setup(&mut self, world: &mut W, config: &EpisodeConfig) -> Result<Vec<TrackedObject>> {
        self.load_task(world, config)
    }

    fn teardown(&mut self, world: &mut W) {
        self.unload_task(world);
    }

    fn reset(&mut self, world: &mut W) -> Result<()> {
        self.reset_current(world)
    }

    fn check_success(&self, world: &W) -> bool {
        Self::check_success(self, world)
    }

    fn progress(&self, world: &W) -> f64 {
        Self::progress(self, world)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::handle::HANDLE_LEVER_ID;
    use crate::pick_place::{pick_object_id, TABLE_ID};
    use crate::valve::{VALVE_HANDLE_ID, VALVE_MOUNT_ID};
    use teleop_core::{
        CaptureConfig, EpisodeManager, KinematicGripperDriver, SimulationStepper, StateCapture,
    };
    use teleop_physics::{PhysicsConfig, World};
    use teleop_types::{DualArmAction, TeleopError};

    #[test]
    fn test_idle_manager() {
        let mut world = World::new(PhysicsConfig::default());
        let mut tasks = TaskManager::default();
        assert!(tasks.current().is_none());
        assert!(!tasks.check_success(&world));
        assert_eq!(tasks.progress(&world), 0.0);
        assert!(tasks.reset_current(&mut world).is_ok());
        tasks.unload_task(&mut world);
    }

    #[test]
    fn test_switching_tasks_removes_previous_bodies() {
        let mut world = World::new(PhysicsConfig::default());
        world.add_body(teleop_types::BodyDescriptor::kinematic("gripper-left")).unwrap();
        let mut tasks = TaskManager::default();

        let objects = tasks
            .load_task(&mut world, &EpisodeConfig::new(TaskKind::PickAndPlace))
            .unwrap();
        assert_eq!(objects.len(), 2);
        assert!(world.has_body(TABLE_ID));

        let objects = tasks
            .load_task(&mut world, &EpisodeConfig::new(TaskKind::ValveTurning))
            .unwrap();
        assert_eq!(objects, [TrackedObject::new(VALVE_HANDLE_ID, "valve")]);
        assert!(!world.has_body(TABLE_ID));
        assert!(!world.has_body(&pick_object_id(0)));
        assert_eq!(
            world.body_ids(),
            ["gripper-left", VALVE_HANDLE_ID, VALVE_MOUNT_ID]
        );
        assert_eq!(tasks.current_kind(), Some(TaskKind::ValveTurning));

        tasks.unload_task(&mut world);
        assert_eq!(world.body_ids(), ["gripper-left"]);
        assert_eq!(world.joint_count(), 0);
    }

    #[test]
    fn test_failed_load_is_cleaned_up_by_unload() {
        let mut world = World::new(PhysicsConfig::default());
        // Occupy the lever id so the second body of the handle task fails.
        world.add_body(teleop_types::BodyDescriptor::fixed(HANDLE_LEVER_ID)).unwrap();
        let mut tasks = TaskManager::default();

        let err = tasks
            .load_task(&mut world, &EpisodeConfig::new(TaskKind::HandleRotation))
            .unwrap_err();
        assert!(matches!(err, TeleopError::DuplicateBody { .. }));

        tasks.unload_task(&mut world);
        assert_eq!(world.body_ids(), [HANDLE_LEVER_ID]);
    }

    #[test]
    fn test_drives_episode_manager() {
        let driver = KinematicGripperDriver::default();
        let mut world = World::new(PhysicsConfig::default());
        driver.spawn_grippers(&mut world).unwrap();
        let stepper =
            SimulationStepper::new(world, driver, StateCapture::new(CaptureConfig::new()));
        let mut episodes = EpisodeManager::new(stepper, TaskManager::default());

        let state = episodes
            .start_episode(EpisodeConfig::new(TaskKind::PickAndPlace).randomized(Some(11)))
            .unwrap();
        assert_eq!(state.objects.len(), 2);
        assert!(state.objects.iter().all(|o| o.object_type == "cube"));

        for _ in 0..30 {
            episodes.step(&DualArmAction::zero()).unwrap();
        }
        let score = episodes.score().unwrap();
        assert_eq!(score.steps, 30);
        assert!(!score.success);
        assert_eq!(score.progress, 0.0);

        let state = episodes.reset_episode().unwrap();
        let start = episodes.tasks().current().map(TaskEnvironment::kind);
        assert_eq!(start, Some(TaskKind::PickAndPlace));
        let cube = state.object(&pick_object_id(0)).unwrap();
        assert!(cube.position.y > 0.84);

        episodes.end_episode();
        assert!(episodes.tasks().current().is_none());
        assert!(!episodes.stepper().world().has_body(TABLE_ID));
    }
}
