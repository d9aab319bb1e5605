//! Task and episode identifiers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The fixed set of scripted manipulation tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TaskKind {
    /// Move cubes onto target zones on a table.
    PickAndPlace,
    /// Turn a valve wheel through a target angle.
    ValveTurning,
    /// Rotate a lever to a target angle.
    HandleRotation,
}

impl TaskKind {
    /// All task kinds.
    pub const ALL: [Self; 3] = [Self::PickAndPlace, Self::ValveTurning, Self::HandleRotation];

    /// Kebab-case name (`"pick-and-place"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PickAndPlace => "pick-and-place",
            Self::ValveTurning => "valve-turning",
            Self::HandleRotation => "handle-rotation",
        }
    }

    /// Parse a kebab-case name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for starting one episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EpisodeConfig {
    /// Task to run.
    pub task: TaskKind,
    /// Jitter initial object placement.
    #[cfg_attr(feature = "serde", serde(default))]
    pub randomize: bool,
    /// Seed for randomization. `None` draws from entropy.
    #[cfg_attr(feature = "serde", serde(default))]
    pub seed: Option<u64>,
}

impl EpisodeConfig {
    /// Episode for `task` without randomization.
    #[must_use]
    pub const fn new(task: TaskKind) -> Self {
        Self {
            task,
            randomize: false,
            seed: None,
        }
    }

    /// Enable randomization.
    #[must_use]
    pub const fn randomized(mut self, seed: Option<u64>) -> Self {
        self.randomize = true;
        self.seed = seed;
        self
    }
}
