//! Scripted manipulation tasks.
//!
//! Three tasks, each owning the bodies and joints it spawns:
//!
//! | Task | Tracked | Success |
//! |------|---------|---------|
//! | [`PickAndPlaceTask`] | cubes | every target zone holds a cube |
//! | [`ValveTurningTask`] | wheel | wheel turned at least the target angle |
//! | [`HandleRotationTask`] | lever | lever within tolerance of the target angle |
//!
//! [`TaskManager`] keeps at most one of them loaded and implements
//! [`teleop_core::TaskLifecycle`], so it plugs straight into an
//! [`teleop_core::EpisodeManager`].
//!
//! # Example
//!
//! ```
//! use teleop_physics::{PhysicsConfig, World};
//! use teleop_tasks::TaskManager;
//! use teleop_types::{EpisodeConfig, TaskKind};
//!
//! let mut world = World::new(PhysicsConfig::default());
//! let mut tasks = TaskManager::default();
//!
//! let objects = tasks
//!     .load_task(&mut world, &EpisodeConfig::new(TaskKind::ValveTurning))
//!     .unwrap();
//! assert_eq!(objects.len(), 1);
//! assert!(!tasks.check_success(&world));
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::cast_precision_loss,
)]

mod environment;
mod handle;
mod manager;
mod pick_place;
mod spawn;
mod valve;

pub use environment::{TaskConfigs, TaskEnvironment};
pub use handle::{HandleConfig, HandleRotationTask, HANDLE_LEVER_ID, HANDLE_MOUNT_ID, HANDLE_TYPE};
pub use manager::TaskManager;
pub use pick_place::{
    pick_object_id, PickAndPlaceTask, PickPlaceConfig, TargetZone, CUBE_TYPE, TABLE_HALF_EXTENTS,
    TABLE_ID,
};
pub use valve::{
    rotation_angle, ValveConfig, ValveTurningTask, VALVE_HANDLE_ID, VALVE_MOUNT_ID, VALVE_TYPE,
};

pub use teleop_types::{Result, TeleopError};
