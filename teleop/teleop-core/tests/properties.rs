//! Grasp, stepping and capture behavior against the built-in world.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use nalgebra::{Point3, UnitQuaternion};
use teleop_core::{
    ArmIds, CaptureConfig, GraspManager, HandToActionMapper, KinematicGripperDriver,
    MapperConfig, NullDriver, SimulationStepper, StateCapture,
};
use teleop_physics::{PhysicsConfig, PhysicsWorld, World};
use teleop_types::{
    BodyDescriptor, ColliderShape, DualArmAction, HandJoint, HandPose, JointData, JointMap,
    PinchState, Side, GRIPPER_OPEN,
};

fn world_with(bodies: impl IntoIterator<Item = BodyDescriptor>) -> World {
    let mut world = World::new(PhysicsConfig::default());
    for body in bodies {
        world.add_body(body).unwrap();
    }
    world
}

fn gripper_and_cube() -> World {
    world_with([
        BodyDescriptor::kinematic("gripper").with_position(Point3::new(0.0, 1.0, 0.0)),
        BodyDescriptor::dynamic("cube")
            .with_position(Point3::new(0.0, 1.0, 0.0))
            .with_collider(ColliderShape::cuboid(0.025, 0.025, 0.025)),
    ])
}

fn pose(wrist: Point3<f64>, orientation: UnitQuaternion<f64>, extra: &[(HandJoint, Point3<f64>)]) -> HandPose {
    let mut joints = JointMap::new();
    joints.insert(HandJoint::Wrist, JointData::new(wrist, orientation, 0.01));
    for (joint, position) in extra {
        joints.insert(*joint, JointData::at(*position));
    }
    HandPose {
        handedness: Side::Left,
        timestamp: 0.0,
        joints,
        pinch_state: PinchState::untracked(),
        wrist_position: wrist,
        wrist_orientation: orientation,
    }
}

#[test]
fn grasp_at_shared_point_returns_constraint() {
    let mut world = gripper_and_cube();
    let mut grasps = GraspManager::new();

    let constraint = grasps.try_grasp(&mut world, "gripper", "cube").unwrap();
    assert_eq!(constraint.object_id, "cube");
    assert!(world.has_joint(constraint.joint));
    assert_eq!(grasps.grasped_object_id("gripper"), Some("cube"));
}

#[test]
fn second_grasp_is_refused_and_keeps_first() {
    let mut world = gripper_and_cube();
    world.add_body(BodyDescriptor::dynamic("ball")).unwrap();
    let mut grasps = GraspManager::new();

    let first = grasps.try_grasp(&mut world, "gripper", "cube").unwrap();
    assert!(grasps.try_grasp(&mut world, "gripper", "ball").is_none());
    assert!(grasps.try_grasp(&mut world, "gripper", "cube").is_none());
    assert_eq!(grasps.constraint("gripper"), Some(&first));
    assert_eq!(world.joint_count(), 1);
}

#[test]
fn grasp_lifecycle_is_reusable() {
    let mut world = gripper_and_cube();
    let mut grasps = GraspManager::new();

    for _ in 0..3 {
        assert!(grasps.try_grasp(&mut world, "gripper", "cube").is_some());
        assert!(grasps.release(&mut world, "gripper"));
        assert!(!grasps.is_grasping("gripper"));
        assert_eq!(world.joint_count(), 0);
    }
    assert!(!grasps.release(&mut world, "gripper"));
}

#[test]
fn release_all_frees_every_gripper() {
    let mut world = world_with([
        BodyDescriptor::kinematic("a"),
        BodyDescriptor::kinematic("b"),
        BodyDescriptor::kinematic("c"),
        BodyDescriptor::dynamic("x"),
        BodyDescriptor::dynamic("y"),
    ]);
    let mut grasps = GraspManager::new();
    grasps.try_grasp(&mut world, "a", "x").unwrap();
    grasps.try_grasp(&mut world, "b", "y").unwrap();
    // Same object from a second gripper is allowed.
    grasps.try_grasp(&mut world, "c", "x").unwrap();

    assert_eq!(grasps.release_all(&mut world), 3);
    for gripper in ["a", "b", "c"] {
        assert!(!grasps.is_grasping(gripper));
    }
    assert_eq!(world.joint_count(), 0);
    assert_eq!(grasps.release_all(&mut world), 0);
}

#[test]
fn grasp_on_missing_body_is_refused() {
    let mut world = gripper_and_cube();
    let mut grasps = GraspManager::new();
    assert!(grasps.try_grasp(&mut world, "gripper", "ghost").is_none());
    assert!(grasps.try_grasp(&mut world, "ghost", "cube").is_none());
    assert_eq!(grasps.active_count(), 0);
}

#[test]
fn free_fall_over_sixty_ticks() {
    let world = world_with([BodyDescriptor::dynamic("ball")
        .with_position(Point3::new(0.0, 2.0, 0.0))
        .with_collider(ColliderShape::ball(0.05))]);
    let capture = StateCapture::new(CaptureConfig::new().with_object("ball", "ball"));
    let mut stepper = SimulationStepper::new(world, NullDriver, capture);

    let mut state = stepper.reset();
    let start = state.object("ball").unwrap().position.y;
    for _ in 0..60 {
        state = stepper.step(&DualArmAction::zero()).unwrap();
    }
    assert!(state.object("ball").unwrap().position.y < start);
    assert_eq!(stepper.world().step_count(), 60);
    assert!((stepper.world().time() - 0.5).abs() < 1e-9);
}

#[test]
fn capture_with_missing_arms_is_neutral() {
    let world = World::new(PhysicsConfig::default());
    let capture = StateCapture::new(
        CaptureConfig::new()
            .with_arm_ids(ArmIds::new("nope-l", "nope-r"))
            .with_untyped_object("ghost"),
    );
    let state = capture.capture(&world, &GraspManager::new());

    for side in Side::BOTH {
        let arm = state.arm(side);
        assert_eq!(arm.end_effector_position, Point3::origin());
        assert_eq!(arm.gripper_open, GRIPPER_OPEN);
        assert!(!arm.is_grasping);
    }
    let ghost = state.object("ghost").unwrap();
    assert_eq!(ghost.position, Point3::origin());
    assert_eq!(ghost.object_type, "unknown");
}

#[test]
fn reset_clears_grasps_on_both_arms() {
    let driver = KinematicGripperDriver::default();
    let mut world = World::new(PhysicsConfig::default());
    driver.spawn_grippers(&mut world).unwrap();
    world.add_body(BodyDescriptor::dynamic("l-obj")).unwrap();
    world.add_body(BodyDescriptor::dynamic("r-obj")).unwrap();
    let mut stepper =
        SimulationStepper::new(world, driver, StateCapture::new(CaptureConfig::new()));

    stepper.try_grasp(Side::Left, "l-obj").unwrap();
    stepper.try_grasp(Side::Right, "r-obj").unwrap();
    let state = stepper.step(&DualArmAction::zero()).unwrap();
    assert!(state.left_arm.is_grasping && state.right_arm.is_grasping);

    let state = stepper.reset();
    assert!(!state.left_arm.is_grasping);
    assert!(!state.right_arm.is_grasping);
    assert_eq!(stepper.world().step_count(), 1);
}

#[test]
fn identical_wrists_give_zero_deltas() {
    let mapper = HandToActionMapper::new(MapperConfig::default().with_rotation_scale(3.0));
    let wrist = Point3::new(0.2, 1.3, -0.1);
    let q = UnitQuaternion::from_euler_angles(0.4, -0.2, 1.0);

    let before = pose(wrist, q, &[(HandJoint::ThumbTip, Point3::new(0.0, 1.4, 0.0))]);
    let after = pose(wrist, q, &[(HandJoint::MiddleFingerTip, Point3::new(5.0, 5.0, 5.0))]);

    let action = mapper.map_hand_to_action(&after, Some(&before));
    assert!(action.dx.abs() < 1e-12 && action.dy.abs() < 1e-12 && action.dz.abs() < 1e-12);
    assert!(action.droll.abs() < 1e-12 && action.dpitch.abs() < 1e-12 && action.dyaw.abs() < 1e-12);
}
