//! Rigid-body physics for teleoperation.
//!
//! This crate defines the physics capability the teleoperation core is
//! written against ([`PhysicsWorld`]) and ships a built-in implementation
//! ([`World`]) sufficient for tabletop manipulation tasks:
//!
//! - Dynamic, fixed and kinematic bodies addressed by string id
//! - Cuboid, ball and cylinder colliders with density-derived mass
//! - Fixed and revolute joints, created and removed at runtime
//! - Fixed-timestep stepping with semi-implicit Euler integration and
//!   position-level joint projection
//! - Resting contact of dynamic bodies on fixed cuboids (tables, shelves)
//!
//! Any other engine exposing the same capability set can stand in for
//! [`World`] by implementing [`PhysicsWorld`].
//!
//! # Example
//!
//! ```
//! use teleop_physics::{PhysicsWorld, World};
//! use teleop_types::{BodyDescriptor, ColliderShape, Pose};
//! use nalgebra::Point3;
//!
//! let mut world = World::default();
//! world.add_body(BodyDescriptor::kinematic("gripper-left")
//!     .with_position(Point3::new(0.0, 1.0, 0.0))).unwrap();
//! world.add_body(BodyDescriptor::dynamic("cube")
//!     .with_position(Point3::new(0.0, 1.0, 0.0))
//!     .with_collider(ColliderShape::cuboid(0.025, 0.025, 0.025))).unwrap();
//!
//! let joint = world
//!     .create_fixed_joint("gripper-left", "cube", Pose::identity(), Pose::identity())
//!     .unwrap();
//! world.step().unwrap();
//! assert!(world.has_joint(joint));
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::missing_errors_doc,
    clippy::float_cmp,                 // Exact zero checks on inverse masses
)]

mod body;
mod config;
pub mod integrators;
mod mass;
pub mod solver;
mod traits;
mod world;

pub use body::{Body, Joint, JointKind};
pub use config::PhysicsConfig;
pub use mass::MassProperties;
pub use traits::PhysicsWorld;
pub use world::World;

pub use teleop_types::{Result, TeleopError};
