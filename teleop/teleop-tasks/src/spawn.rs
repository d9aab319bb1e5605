//! Bookkeeping for bodies and joints a task puts into the world.

use teleop_physics::PhysicsWorld;
use teleop_types::{BodyDescriptor, JointHandle, Pose, Result};
use tracing::debug;

/// Everything one task instance created, so teardown removes exactly that.
#[derive(Debug, Clone, Default)]
pub(crate) struct Spawned {
    bodies: Vec<String>,
    joints: Vec<JointHandle>,
}

impl Spawned {
    pub(crate) fn body<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        desc: BodyDescriptor,
    ) -> Result<()> {
        let id = desc.id.clone();
        world.add_body(desc)?;
        self.bodies.push(id);
        Ok(())
    }

    pub(crate) fn joint(&mut self, joint: JointHandle) {
        self.joints.push(joint);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bodies.is_empty() && self.joints.is_empty()
    }

    /// Remove joints first, then bodies in reverse creation order.
    pub(crate) fn clear<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        for joint in self.joints.drain(..) {
            world.remove_joint(joint);
        }
        for id in self.bodies.drain(..).rev() {
            if !world.remove_body(&id) {
                debug!(body_id = %id, "Task body already gone at teardown");
            }
        }
    }
}

/// Put a body back at `pose` at rest. Missing bodies are skipped.
pub(crate) fn restore_body<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    id: &str,
    pose: Pose,
) -> Result<()> {
    if !world.has_body(id) {
        return Ok(());
    }
    world.teleport_body(id, pose)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};
    use teleop_physics::{PhysicsConfig, World};

    #[test]
    fn test_clear_removes_only_spawned() {
        let mut world = World::new(PhysicsConfig::default());
        world.add_body(BodyDescriptor::fixed("existing")).unwrap();

        let mut spawned = Spawned::default();
        spawned.body(&mut world, BodyDescriptor::fixed("mount")).unwrap();
        spawned.body(&mut world, BodyDescriptor::dynamic("arm")).unwrap();
        let joint = world
            .create_revolute_joint("mount", "arm", Point3::origin(), Point3::origin(), Vector3::z())
            .unwrap();
        spawned.joint(joint);
        assert!(spawned.body(&mut world, BodyDescriptor::fixed("existing")).is_err());

        spawned.clear(&mut world);
        assert!(spawned.is_empty());
        assert_eq!(world.body_ids(), ["existing"]);
        assert_eq!(world.joint_count(), 0);
    }

    #[test]
    fn test_restore_body() {
        let mut world = World::new(PhysicsConfig::default());
        world.add_body(BodyDescriptor::dynamic("cube")).unwrap();
        world.set_linear_velocity("cube", Vector3::new(1.0, 0.0, 0.0)).unwrap();

        restore_body(&mut world, "cube", Pose::from_position(Point3::new(0.0, 1.0, 0.0))).unwrap();
        assert_eq!(world.body_pose("cube").unwrap().position, Point3::new(0.0, 1.0, 0.0));
        assert_eq!(world.body_velocity("cube").unwrap().linear, Vector3::zeros());

        assert!(restore_body(&mut world, "ghost", Pose::identity()).is_ok());
    }
}
