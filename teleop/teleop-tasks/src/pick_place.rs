//! Pick-and-place: move cubes from the table into target zones.

use nalgebra::{Point3, UnitQuaternion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use teleop_core::TrackedObject;
use teleop_physics::PhysicsWorld;
use teleop_types::{BodyDescriptor, ColliderShape, EpisodeConfig, Pose, Result, TeleopError};
use tracing::debug;

use crate::spawn::{restore_body, Spawned};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Body id of the table.
pub const TABLE_ID: &str = "table";

/// Type tag of pick objects.
pub const CUBE_TYPE: &str = "cube";

/// Table collider half extents.
pub const TABLE_HALF_EXTENTS: [f64; 3] = [0.4, 0.01, 0.3];

/// Height of cubes without a configured start position.
const FALLBACK_HEIGHT: f64 = 0.85;

/// Body id of the `index`-th pick object.
#[must_use]
pub fn pick_object_id(index: usize) -> String {
    format!("pick-object-{index}")
}

/// A circular target area on the table.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TargetZone {
    /// Zone center. Only X and Z take part in the containment test.
    pub position: Point3<f64>,
    /// Zone radius (meters).
    pub radius: f64,
}

impl TargetZone {
    /// Create a zone.
    #[must_use]
    pub const fn new(position: Point3<f64>, radius: f64) -> Self {
        Self { position, radius }
    }

    /// Whether `point` lies inside the zone in the XZ plane, boundary
    /// included.
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        let dx = point.x - self.position.x;
        let dz = point.z - self.position.z;
        dx.hypot(dz) <= self.radius
    }
}

/// Pick-and-place configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PickPlaceConfig {
    /// Number of cubes.
    pub object_count: usize,
    /// Start position per cube. Cubes past the end start at (0, 0.85, 0).
    pub object_positions: Vec<Point3<f64>>,
    /// Zones that must each hold a cube.
    pub target_zones: Vec<TargetZone>,
    /// Cube edge length (meters).
    pub object_size: f64,
    /// Height of the table center.
    pub table_height: f64,
    /// Largest X/Z offset applied to start positions in randomized
    /// episodes.
    pub randomize_jitter: f64,
}

impl Default for PickPlaceConfig {
    fn default() -> Self {
        Self {
            object_count: 2,
            object_positions: vec![Point3::new(-0.1, 0.85, 0.0), Point3::new(0.1, 0.85, 0.0)],
            target_zones: vec![
                TargetZone::new(Point3::new(0.2, 0.81, 0.15), 0.06),
                TargetZone::new(Point3::new(-0.2, 0.81, 0.15), 0.06),
            ],
            object_size: 0.05,
            table_height: 0.8,
            randomize_jitter: 0.03,
        }
    }
}

impl PickPlaceConfig {
    /// Set the cube count.
    #[must_use]
    pub fn with_object_count(mut self, count: usize) -> Self {
        self.object_count = count;
        self
    }

    /// Replace the start positions.
    #[must_use]
    pub fn with_object_positions(mut self, positions: Vec<Point3<f64>>) -> Self {
        self.object_positions = positions;
        self
    }

    /// Replace the target zones.
    #[must_use]
    pub fn with_target_zones(mut self, zones: Vec<TargetZone>) -> Self {
        self.target_zones = zones;
        self
    }

    /// Set the randomization jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.randomize_jitter = jitter;
        self
    }

    /// Start position of cube `index` before randomization.
    #[must_use]
    pub fn object_position(&self, index: usize) -> Point3<f64> {
        self.object_positions
            .get(index)
            .copied()
            .unwrap_or_else(|| Point3::new(0.0, FALLBACK_HEIGHT, 0.0))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.object_size.is_finite() || self.object_size <= 0.0 {
            return Err(TeleopError::invalid_config(format!(
                "object_size must be positive, got {}",
                self.object_size
            )));
        }
        if !self.table_height.is_finite() {
            return Err(TeleopError::invalid_config("table_height must be finite"));
        }
        if !self.randomize_jitter.is_finite() || self.randomize_jitter < 0.0 {
            return Err(TeleopError::invalid_config(format!(
                "randomize_jitter must be non-negative, got {}",
                self.randomize_jitter
            )));
        }
        for (i, zone) in self.target_zones.iter().enumerate() {
            if !zone.radius.is_finite() || zone.radius < 0.0 {
                return Err(TeleopError::invalid_config(format!(
                    "target zone {i} has invalid radius {}",
                    zone.radius
                )));
            }
        }
        Ok(())
    }
}

/// Pick-and-place task instance.
#[derive(Debug, Clone, Default)]
pub struct PickAndPlaceTask {
    config: PickPlaceConfig,
    object_ids: Vec<String>,
    start_positions: Vec<Point3<f64>>,
    spawned: Spawned,
}

impl PickAndPlaceTask {
    /// Create an unloaded task.
    #[must_use]
    pub fn new(config: PickPlaceConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Task configuration.
    #[must_use]
    pub const fn config(&self) -> &PickPlaceConfig {
        &self.config
    }

    /// Ids of the spawned cubes.
    #[must_use]
    pub fn object_ids(&self) -> &[String] {
        &self.object_ids
    }

    /// Start positions of the spawned cubes, after randomization.
    #[must_use]
    pub fn start_positions(&self) -> &[Point3<f64>] {
        &self.start_positions
    }

    /// Spawn the table and cubes. Any previous instance is torn down first.
    pub fn setup<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        episode: &EpisodeConfig,
    ) -> Result<()> {
        self.teardown(world);
        self.config.validate()?;

        let [hx, hy, hz] = TABLE_HALF_EXTENTS;
        self.spawned.body(
            world,
            BodyDescriptor::fixed(TABLE_ID)
                .with_position(Point3::new(0.0, self.config.table_height, 0.0))
                .with_collider(ColliderShape::cuboid(hx, hy, hz)),
        )?;

        let mut rng = episode.randomize.then(|| {
            episode
                .seed
                .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64)
        });
        let jitter = self.config.randomize_jitter;
        let half = self.config.object_size / 2.0;

        for i in 0..self.config.object_count {
            let mut position = self.config.object_position(i);
            if let Some(rng) = rng.as_mut() {
                position.x += rng.gen_range(-jitter..=jitter);
                position.z += rng.gen_range(-jitter..=jitter);
            }

            let id = pick_object_id(i);
            self.spawned.body(
                world,
                BodyDescriptor::dynamic(id.as_str())
                    .with_position(position)
                    .with_collider(ColliderShape::cuboid(half, half, half)),
            )?;
            self.object_ids.push(id);
            self.start_positions.push(position);
        }

        debug!(
            objects = self.object_ids.len(),
            zones = self.config.target_zones.len(),
            randomized = episode.randomize,
            "Pick-and-place ready"
        );
        Ok(())
    }

    /// Remove everything `setup` created.
    pub fn teardown<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) {
        self.spawned.clear(world);
        self.object_ids.clear();
        self.start_positions.clear();
    }

    /// Return every cube to its start position at rest.
    pub fn reset<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W) -> Result<()> {
        for (id, start) in self.object_ids.iter().zip(&self.start_positions) {
            restore_body(
                world,
                id,
                Pose::from_position_rotation(*start, UnitQuaternion::identity()),
            )?;
        }
        Ok(())
    }

    /// Number of zones holding at least one cube.
    #[must_use]
    pub fn matched_zones<W: PhysicsWorld + ?Sized>(&self, world: &W) -> usize {
        let positions: Vec<Point3<f64>> = self
            .object_ids
            .iter()
            .filter_map(|id| world.body_pose(id))
            .map(|pose| pose.position)
            .collect();

        self.config
            .target_zones
            .iter()
            .filter(|zone| positions.iter().any(|p| zone.contains(p)))
            .count()
    }

    /// Every zone holds a cube. False without zones or cubes.
    #[must_use]
    pub fn check_success<W: PhysicsWorld + ?Sized>(&self, world: &W) -> bool {
        let zones = self.config.target_zones.len();
        if zones == 0 || self.object_ids.is_empty() {
            return false;
        }
        self.matched_zones(world) >= zones
    }

    /// Fraction of zones holding a cube. Zero without zones.
    #[must_use]
    pub fn progress<W: PhysicsWorld + ?Sized>(&self, world: &W) -> f64 {
        let zones = self.config.target_zones.len();
        if zones == 0 {
            return 0.0;
        }
        self.matched_zones(world) as f64 / zones as f64
    }

    /// Cubes to include in snapshots.
    #[must_use]
    pub fn tracked_objects(&self) -> Vec<TrackedObject> {
        self.object_ids
            .iter()
            .map(|id| TrackedObject::new(id.as_str(), CUBE_TYPE))
            .collect()
    }
}
