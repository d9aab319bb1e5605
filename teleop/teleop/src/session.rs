//! Per-frame teleoperation pipeline.

use hashbrown::HashMap;
use teleop_core::{
    ArmDriver, CaptureConfig, EpisodeManager, EpisodeScore, HandToActionMapper,
    KinematicGripperDriver, SimulationStepper, StateCapture,
};
use teleop_hand::{HandTracker, ReferenceSpace, XrFrame};
use teleop_physics::{PhysicsWorld, World};
use teleop_tasks::TaskManager;
use teleop_types::{
    DualArmAction, EpisodeConfig, HandPose, Result, Side, SimulationState,
};
use tracing::debug;

use crate::config::{GraspAssistConfig, TeleopConfig};

/// Episode manager the session drives.
pub type Episodes = EpisodeManager<World, KinematicGripperDriver, TaskManager>;

/// Result of one processed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    /// Action applied this tick.
    pub action: DualArmAction,
    /// Post-step snapshot.
    pub state: SimulationState,
    /// Score of the running episode, `None` when idle.
    pub score: Option<EpisodeScore>,
    /// Hands that produced a pose this frame.
    pub hands_tracked: usize,
}

/// Hand-driven teleoperation of two kinematic grippers.
///
/// One [`process_frame`](Self::process_frame) call runs the whole chain:
///
/// ```text
/// XrFrame -> HandTracker -> HandToActionMapper (per side)
///         -> grasp assist -> EpisodeManager::step -> FrameOutput
/// ```
///
/// Deltas are taken against the previous frame's pose of the same side.
/// When a hand drops out its previous pose is forgotten, so tracking that
/// resumes later starts from zero deltas instead of a jump.
#[derive(Debug)]
pub struct TeleopSession {
    tracker: HandTracker,
    mapper: HandToActionMapper,
    previous: HashMap<Side, HandPose>,
    episodes: Episodes,
    assist: GraspAssistConfig,
    reference: ReferenceSpace,
}

impl TeleopSession {
    /// Build the world, spawn both grippers at home and wire the pipeline.
    ///
    /// # Errors
    ///
    /// Configuration validation errors, or a gripper id that collides
    /// with a body already in the world.
    pub fn new(config: TeleopConfig) -> Result<Self> {
        config.validate()?;

        let driver = KinematicGripperDriver::new(config.driver.clone());
        let mut world = World::new(config.physics.clone());
        driver.spawn_grippers(&mut world)?;

        let capture =
            StateCapture::new(CaptureConfig::new().with_arm_ids(config.driver.arm_ids.clone()));
        let stepper = SimulationStepper::new(world, driver, capture);
        let episodes = EpisodeManager::new(stepper, TaskManager::new(config.tasks.clone()));

        Ok(Self {
            tracker: HandTracker::new().with_pinch_config(config.pinch),
            mapper: HandToActionMapper::new(config.mapper),
            previous: HashMap::new(),
            episodes,
            assist: config.grasp_assist,
            reference: config.reference_space,
        })
    }

    // =========================================================================
    // Episodes
    // =========================================================================

    /// Home the grippers and start an episode.
    pub fn start_episode(&mut self, config: EpisodeConfig) -> Result<SimulationState> {
        self.previous.clear();
        self.home_grippers()?;
        self.episodes.start_episode(config)
    }

    /// End the running episode. No-op when idle.
    pub fn end_episode(&mut self) {
        self.episodes.end_episode();
    }

    /// Home the grippers and put the running task back to its start state.
    pub fn reset_episode(&mut self) -> Result<SimulationState> {
        self.previous.clear();
        self.home_grippers()?;
        self.episodes.reset_episode()
    }

    /// Score of the running episode.
    #[must_use]
    pub fn score(&self) -> Option<EpisodeScore> {
        self.episodes.score()
    }

    fn home_grippers(&mut self) -> Result<()> {
        let (world, driver) = self.episodes.stepper_mut().world_and_driver_mut();
        driver.home_grippers(world)
    }

    // =========================================================================
    // Frames
    // =========================================================================

    /// Run one frame of hand input through the pipeline.
    ///
    /// A side without a tracked hand holds still with its gripper open.
    ///
    /// # Errors
    ///
    /// [`TeleopError::PoseQueryUnavailable`](teleop_types::TeleopError::PoseQueryUnavailable)
    /// when the frame cannot resolve joints; the world is not stepped and
    /// both previous poses are forgotten. Physics divergence is propagated.
    pub fn process_frame(&mut self, frame: &dyn XrFrame) -> Result<FrameOutput> {
        let poses = match self.tracker.update(frame, self.reference) {
            Ok(poses) => poses,
            Err(err) => {
                self.previous.clear();
                return Err(err);
            }
        };

        let mut action = DualArmAction::zero();
        for side in Side::BOTH {
            match poses.get(&side) {
                Some(pose) => {
                    *action.get_mut(side) =
                        self.mapper.map_hand_to_action(pose, self.previous.get(&side));
                    self.previous.insert(side, pose.clone());
                }
                None => {
                    self.previous.remove(&side);
                }
            }
        }

        let mut output = self.step_action(&action)?;
        output.hands_tracked = poses.len();
        Ok(output)
    }

    /// Advance one tick with an explicit action, bypassing hand input.
    /// Grasp assist still applies.
    pub fn step_action(&mut self, action: &DualArmAction) -> Result<FrameOutput> {
        if self.assist.enabled {
            self.assist_grasps(action);
        }
        let state = self.episodes.step(action)?;
        Ok(FrameOutput {
            action: *action,
            state,
            score: self.episodes.score(),
            hands_tracked: 0,
        })
    }

    /// Grasp on close, release on open.
    fn assist_grasps(&mut self, action: &DualArmAction) {
        for side in Side::BOTH {
            let closed = action.get(side).is_closed();
            let stepper = self.episodes.stepper_mut();
            match (closed, stepper.is_grasping(side)) {
                (true, false) => {
                    if let Some(object_id) = nearest_object(stepper, side, self.assist.radius) {
                        if stepper.try_grasp(side, &object_id).is_some() {
                            debug!(side = %side, object_id = %object_id, "Assisted grasp");
                        }
                    }
                }
                (false, true) => {
                    stepper.release(side);
                }
                _ => {}
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Hand tracker with the latest poses.
    #[must_use]
    pub const fn tracker(&self) -> &HandTracker {
        &self.tracker
    }

    /// Last mapped pose per side.
    #[must_use]
    pub fn previous_pose(&self, side: Side) -> Option<&HandPose> {
        self.previous.get(&side)
    }

    /// The episode manager.
    #[must_use]
    pub const fn episodes(&self) -> &Episodes {
        &self.episodes
    }

    /// Mutable episode manager.
    pub fn episodes_mut(&mut self) -> &mut Episodes {
        &mut self.episodes
    }

    /// Most recent snapshot.
    #[must_use]
    pub fn state(&self) -> &SimulationState {
        self.episodes.stepper().state()
    }

    /// The physics world.
    #[must_use]
    pub fn world(&self) -> &World {
        self.episodes.stepper().world()
    }
}

/// Closest tracked object within `radius` of `side`'s gripper. Objects
/// held by the other gripper are candidates too.
fn nearest_object<W, D>(stepper: &SimulationStepper<W, D>, side: Side, radius: f64) -> Option<String>
where
    W: PhysicsWorld,
    D: ArmDriver<W>,
{
    let capture = stepper.capture_config();
    let world = stepper.world();
    let gripper = world.body_pose(capture.arm_ids.get(side))?.position;

    capture
        .object_ids
        .iter()
        .filter_map(|id| {
            let position = world.body_pose(id)?.position;
            let distance = nalgebra::distance(&gripper, &position);
            (distance <= radius).then_some((id, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id.clone())
}
