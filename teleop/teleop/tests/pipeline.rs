//! End-to-end teleoperation scenarios driven by recorded hand frames.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use approx::assert_relative_eq;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use teleop::prelude::*;
use teleop_hand::XrJointPose;
use teleop_tasks::{pick_object_id, VALVE_HANDLE_ID};
use teleop_types::{HandJoint, ALL_JOINTS, GRIPPER_CLOSED, GRIPPER_OPEN, PINCH_THRESHOLD};

const OPEN_GAP: f64 = 0.05;
const CLOSED_GAP: f64 = 0.005;

fn hand(wrist: Point3<f64>, gap: f64) -> RecordedHand {
    RecordedHand::synthetic(wrist, UnitQuaternion::identity(), gap)
}

fn left(wrist: Point3<f64>, gap: f64) -> RecordedFrame {
    RecordedFrame::new().with_hand(Handedness::Left, hand(wrist, gap))
}

fn right(wrist: Point3<f64>, gap: f64) -> RecordedFrame {
    RecordedFrame::new().with_hand(Handedness::Right, hand(wrist, gap))
}

fn session() -> TeleopSession {
    TeleopSession::new(TeleopConfig::default()).unwrap()
}

#[test]
fn first_observation_has_zero_deltas() {
    let mut session = session();
    let output = session
        .process_frame(&left(Point3::new(0.3, 1.4, -0.2), CLOSED_GAP))
        .unwrap();
    assert!(output.action.left.is_stationary());
    assert_eq!(output.action.left.gripper, GRIPPER_CLOSED);
    assert_eq!(output.action.right, ArmAction::zero());
    assert_eq!(output.hands_tracked, 1);
}

#[test]
fn wrist_motion_is_scaled_into_gripper_motion() {
    let mut config = TeleopConfig::default();
    config.mapper = MapperConfig::default().with_translation_scale(2.0);
    let mut session = TeleopSession::new(config).unwrap();

    session
        .process_frame(&left(Point3::new(0.0, 1.0, 0.0), OPEN_GAP))
        .unwrap();
    let output = session
        .process_frame(&left(Point3::new(0.01, 1.0, -0.02), OPEN_GAP))
        .unwrap();

    assert_relative_eq!(output.action.left.dx, 0.02, epsilon = 1e-12);
    assert_relative_eq!(output.action.left.dz, -0.04, epsilon = 1e-12);
    let gripper = output.state.left_arm.end_effector_position;
    assert_relative_eq!(gripper.x, -0.38, epsilon = 1e-9);
    assert_relative_eq!(gripper.y, 1.1, epsilon = 1e-9);
    assert_relative_eq!(gripper.z, -0.34, epsilon = 1e-9);
}

#[test]
fn finger_motion_alone_leaves_deltas_at_zero() {
    let mut session = session();
    let wrist = Point3::new(0.1, 1.2, -0.1);
    session.process_frame(&left(wrist, OPEN_GAP)).unwrap();
    let output = session.process_frame(&left(wrist, CLOSED_GAP)).unwrap();

    assert!(output.action.left.is_stationary());
    assert_eq!(output.action.left.gripper, GRIPPER_CLOSED);
}

#[test]
fn pinch_threshold_boundary() {
    let mut session = session();
    let wrist = Point3::new(0.0, 1.2, 0.0);

    let output = session
        .process_frame(&left(wrist, PINCH_THRESHOLD - 1e-4))
        .unwrap();
    assert_eq!(output.action.left.gripper, GRIPPER_CLOSED);
    let pose = session.tracker().latest(Side::Left).unwrap();
    assert!(pose.pinch_state.is_pinching);

    let output = session
        .process_frame(&left(wrist, PINCH_THRESHOLD + 1e-4))
        .unwrap();
    assert_eq!(output.action.left.gripper, GRIPPER_OPEN);
    let pose = session.tracker().latest(Side::Left).unwrap();
    assert!(!pose.pinch_state.is_pinching);
}

#[test]
fn hand_without_fingertips_never_pinches() {
    let mut session = session();
    let wrist_only = RecordedHand::new().with_joint(HandJoint::Wrist, Point3::new(0.0, 1.0, 0.0));
    let frame = RecordedFrame::new().with_hand(Handedness::Right, wrist_only);

    let output = session.process_frame(&frame).unwrap();
    assert_eq!(output.hands_tracked, 1);
    assert_eq!(output.action.right.gripper, GRIPPER_OPEN);
    let pose = session.tracker().latest(Side::Right).unwrap();
    assert!(!pose.pinch_state.is_pinching);
    assert_eq!(pose.pinch_state.distance, f64::INFINITY);
}

#[test]
fn hand_with_no_resolved_joints_is_absent() {
    let mut session = session();
    let blind = ALL_JOINTS
        .into_iter()
        .fold(RecordedHand::new(), RecordedHand::with_unresolved_joint);
    let frame = RecordedFrame::new()
        .with_hand(Handedness::Left, blind)
        .with_source(RecordedInputSource::hand(
            9,
            Handedness::None,
            hand(Point3::origin(), OPEN_GAP),
        ));

    let output = session.process_frame(&frame).unwrap();
    assert_eq!(output.hands_tracked, 0);
    assert!(session.tracker().latest(Side::Left).is_none());
    assert_eq!(output.action, DualArmAction::zero());
}

#[test]
fn missing_wrist_defaults_to_origin() {
    let mut session = session();
    let tips = RecordedHand::new()
        .with_joint(HandJoint::ThumbTip, Point3::new(0.0, 1.0, 0.0))
        .with_joint_pose(
            HandJoint::IndexFingerTip,
            XrJointPose::at(Point3::new(0.01, 1.0, 0.0)),
        );
    let frame = RecordedFrame::new().with_hand(Handedness::Left, tips);

    session.process_frame(&frame).unwrap();
    let pose = session.tracker().latest(Side::Left).unwrap();
    assert_eq!(pose.wrist_position, Point3::origin());
    assert_eq!(pose.wrist_orientation, UnitQuaternion::identity());
    assert!(pose.pinch_state.is_pinching);
}

#[test]
fn rotation_follows_euler_differences() {
    let mut session = session();
    let wrist = Point3::new(0.0, 1.2, 0.0);
    let yawed = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.2);

    session.process_frame(&left(wrist, OPEN_GAP)).unwrap();
    let frame = RecordedFrame::new().with_hand(
        Handedness::Left,
        RecordedHand::synthetic(wrist, yawed, OPEN_GAP),
    );
    let output = session.process_frame(&frame).unwrap();

    assert_relative_eq!(output.action.left.dyaw, 0.2, epsilon = 1e-9);
    assert_relative_eq!(output.action.left.droll, 0.0, epsilon = 1e-9);
    let orientation = output.state.left_arm.end_effector_orientation;
    assert_relative_eq!(orientation.angle(), 0.2, epsilon = 1e-9);
}

#[test]
fn pick_and_place_by_hand() {
    let mut session = session();
    let state = session
        .start_episode(EpisodeConfig::new(TaskKind::PickAndPlace))
        .unwrap();
    assert_eq!(state.objects.len(), 2);
    assert_eq!(session.score().unwrap().progress, 0.0);

    // Left hand: home (-0.4, 1.1, -0.3) -> cube 0 at (-0.1, 0.835, 0).
    let origin = Point3::new(0.0, 1.2, 0.0);
    let at_cube = origin + Vector3::new(0.3, -0.25, 0.3);
    let over_zone = at_cube + Vector3::new(-0.1, 0.05, 0.15);

    session.process_frame(&left(origin, OPEN_GAP)).unwrap();
    for _ in 0..30 {
        session.process_frame(&left(at_cube, OPEN_GAP)).unwrap();
    }
    let output = session.process_frame(&left(at_cube, CLOSED_GAP)).unwrap();
    assert_eq!(
        output.state.left_arm.grasped_object_id.as_deref(),
        Some(pick_object_id(0).as_str())
    );

    session.process_frame(&left(over_zone, CLOSED_GAP)).unwrap();
    for _ in 0..10 {
        session.process_frame(&left(over_zone, CLOSED_GAP)).unwrap();
    }
    let carried = session.state().object(&pick_object_id(0)).unwrap().position;
    assert_relative_eq!(carried.x, -0.2, epsilon = 1e-6);
    assert_relative_eq!(carried.z, 0.15, epsilon = 1e-6);

    let output = session.process_frame(&left(over_zone, OPEN_GAP)).unwrap();
    assert!(!output.state.left_arm.is_grasping);
    for _ in 0..120 {
        session.process_frame(&RecordedFrame::new()).unwrap();
    }
    let score = session.score().unwrap();
    assert_relative_eq!(score.progress, 0.5, epsilon = 1e-12);
    assert!(!score.success);

    // Right hand: home (0.4, 1.1, -0.3) -> cube 1 at (0.1, 0.835, 0).
    let at_cube = origin + Vector3::new(-0.3, -0.25, 0.3);
    let over_zone = at_cube + Vector3::new(0.1, 0.05, 0.15);

    session.process_frame(&right(origin, OPEN_GAP)).unwrap();
    session.process_frame(&right(at_cube, OPEN_GAP)).unwrap();
    let output = session.process_frame(&right(at_cube, CLOSED_GAP)).unwrap();
    assert!(output.state.right_arm.is_grasping);
    for _ in 0..10 {
        session.process_frame(&right(over_zone, CLOSED_GAP)).unwrap();
    }
    session.process_frame(&right(over_zone, OPEN_GAP)).unwrap();
    for _ in 0..120 {
        session.process_frame(&RecordedFrame::new()).unwrap();
    }

    let output = session.process_frame(&RecordedFrame::new()).unwrap();
    let score = output.score.unwrap();
    assert!(score.success);
    assert_eq!(score.progress, 1.0);
    let placed = output.state.object(&pick_object_id(1)).unwrap().position;
    assert_relative_eq!(placed.y, 0.835, epsilon = 1e-3);
}

#[test]
fn reset_episode_releases_and_restores() {
    let mut session = session();
    session
        .start_episode(EpisodeConfig::new(TaskKind::ValveTurning))
        .unwrap();
    session
        .episodes_mut()
        .stepper_mut()
        .world_mut()
        .set_translation("gripper-left", Point3::new(0.0, 1.0, -0.4))
        .unwrap();
    let mut action = DualArmAction::zero();
    action.left.gripper = GRIPPER_CLOSED;
    let output = session.step_action(&action).unwrap();
    assert!(output.state.left_arm.is_grasping);

    let state = session.reset_episode().unwrap();
    assert!(!state.left_arm.is_grasping);
    assert!(!state.right_arm.is_grasping);
    assert_eq!(state.left_arm.end_effector_position, Point3::new(-0.4, 1.1, -0.3));
    assert_eq!(session.score().unwrap().steps, 0);
    let wheel = state.object(VALVE_HANDLE_ID).unwrap();
    assert_eq!(wheel.orientation, UnitQuaternion::identity());
}

#[test]
fn handle_is_not_scored_without_operator_input() {
    let mut session = session();
    session
        .start_episode(EpisodeConfig::new(TaskKind::HandleRotation))
        .unwrap();

    // Ten seconds of idle hands.
    for _ in 0..1200 {
        let output = session.step_action(&DualArmAction::zero()).unwrap();
        assert!(!output.score.unwrap().success);
    }
    let score = session.score().unwrap();
    assert!(score.progress < 0.02);
    assert_eq!(score.steps, 1200);
}

#[test]
fn switching_tasks_replaces_tracked_objects() {
    let mut session = session();
    session
        .start_episode(EpisodeConfig::new(TaskKind::PickAndPlace))
        .unwrap();
    let state = session
        .start_episode(EpisodeConfig::new(TaskKind::HandleRotation))
        .unwrap();

    assert_eq!(state.objects.len(), 1);
    assert_eq!(state.objects[0].object_type, "handle");
    assert!(!session.world().has_body(&pick_object_id(0)));

    session.end_episode();
    assert!(session.score().is_none());
    assert_eq!(
        session.world().body_ids(),
        ["gripper-left", "gripper-right"]
    );
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("teleop.json");
    let mut config = TeleopConfig::default();
    config.grasp_assist.radius = 0.1;
    std::fs::write(&path, config.to_json_string().unwrap()).unwrap();

    let loaded = TeleopConfig::from_json_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(TeleopSession::new(loaded).is_ok());
}
