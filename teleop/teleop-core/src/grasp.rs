//! Grasp constraint lifecycle.
//!
//! Each gripper is either free or holding exactly one object through a
//! fixed physics joint. The manager does not stop two grippers from
//! holding the same object.

use hashbrown::HashMap;
use teleop_physics::PhysicsWorld;
use teleop_types::{JointHandle, Pose};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An active grasp: the held object and the joint holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GraspConstraint {
    /// Id of the grasped body.
    pub object_id: String,
    /// Fixed joint between gripper and object.
    pub joint: JointHandle,
}

/// Tracks which gripper holds which object.
#[derive(Debug, Clone, Default)]
pub struct GraspManager {
    active: HashMap<String, GraspConstraint>,
}

impl GraspManager {
    /// A manager with no active grasps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `object_id` to `gripper_id` with a fixed joint.
    ///
    /// Returns `None` without touching the world when the gripper already
    /// holds something or either body is missing, and `None` when joint
    /// creation fails. The object snaps to the gripper origin.
    pub fn try_grasp<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        gripper_id: &str,
        object_id: &str,
    ) -> Option<GraspConstraint> {
        if self.active.contains_key(gripper_id) {
            debug!(gripper_id, object_id, "Grasp refused: gripper busy");
            return None;
        }
        if !world.has_body(gripper_id) || !world.has_body(object_id) {
            debug!(gripper_id, object_id, "Grasp refused: body missing");
            return None;
        }

        let joint =
            match world.create_fixed_joint(gripper_id, object_id, Pose::identity(), Pose::identity())
            {
                Ok(joint) => joint,
                Err(err) => {
                    debug!(gripper_id, object_id, %err, "Grasp refused: joint creation failed");
                    return None;
                }
            };

        let constraint = GraspConstraint {
            object_id: object_id.to_owned(),
            joint,
        };
        self.active.insert(gripper_id.to_owned(), constraint.clone());
        debug!(gripper_id, object_id, %joint, "Grasp attached");
        Some(constraint)
    }

    /// Drop the gripper's grasp, if any. Returns whether a grasp was held.
    pub fn release<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, gripper_id: &str) -> bool {
        let Some(constraint) = self.active.remove(gripper_id) else {
            return false;
        };
        // The joint may already be gone if one of its bodies was removed.
        let removed = world.remove_joint(constraint.joint);
        debug!(
            gripper_id,
            object_id = %constraint.object_id,
            joint_removed = removed,
            "Grasp released"
        );
        true
    }

    /// Release every active grasp. Returns how many were released.
    pub fn release_all<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> usize {
        let mut grippers: Vec<String> = self.active.keys().cloned().collect();
        grippers.sort_unstable();
        grippers
            .iter()
            .filter(|gripper| self.release(world, gripper.as_str()))
            .count()
    }

    /// Whether the gripper holds an object.
    #[must_use]
    pub fn is_grasping(&self, gripper_id: &str) -> bool {
        self.active.contains_key(gripper_id)
    }

    /// Id of the object held by the gripper.
    #[must_use]
    pub fn grasped_object_id(&self, gripper_id: &str) -> Option<&str> {
        self.active.get(gripper_id).map(|c| c.object_id.as_str())
    }

    /// The gripper's active constraint.
    #[must_use]
    pub fn constraint(&self, gripper_id: &str) -> Option<&GraspConstraint> {
        self.active.get(gripper_id)
    }

    /// Number of grippers currently holding something.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Whether any gripper holds `object_id`.
    #[must_use]
    pub fn is_object_held(&self, object_id: &str) -> bool {
        self.active.values().any(|c| c.object_id == object_id)
    }
}
