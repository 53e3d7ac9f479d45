//! Container configuration, validation, and error types.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use stash_core::{ContainerId, Eligibility, Vec2i};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`ContainerConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A grid dimension is negative.
    NegativeGrid {
        /// Configured width.
        width: i32,
        /// Configured height.
        height: i32,
    },
    /// The grid has more cells than the brute-force search is meant for.
    GridTooLarge {
        /// Configured cell count.
        cells: u64,
        /// Maximum accepted cell count.
        max: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeGrid { width, height } => {
                write!(f, "grid {width}x{height} has a negative dimension")
            }
            Self::GridTooLarge { cells, max } => {
                write!(f, "grid has {cells} cells, maximum is {max}")
            }
        }
    }
}

impl Error for ConfigError {}

// ── ContainerConfig ────────────────────────────────────────────────

/// Everything needed to construct a [`Container`](crate::Container).
///
/// The item lifecycle collaborator is passed separately to
/// [`Container::new`](crate::Container::new) because it is usually shared by
/// every container in a world.
#[derive(Clone)]
pub struct ContainerConfig {
    /// Grid width and height in cells. A zero dimension is legal and
    /// yields a container that holds nothing.
    pub grid: Vec2i,
    /// Eligibility filter. `None` means every item is eligible.
    pub eligibility: Option<Arc<dyn Eligibility>>,
    /// Fixed id for the container. Set this when the container belongs to
    /// an item (see [`Item::inner_container`](stash_core::Item)), so the
    /// item can be refused storage inside itself. `None` allocates a
    /// fresh id.
    pub id: Option<ContainerId>,
}

impl fmt::Debug for ContainerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerConfig")
            .field("grid", &self.grid)
            .field("eligibility", &self.eligibility.as_ref().map(|_| ".."))
            .field("id", &self.id)
            .finish()
    }
}

impl ContainerConfig {
    /// Upper bound on `grid.x * grid.y`.
    pub const MAX_CELLS: u64 = 1 << 20;

    /// A config with the given grid, no filter, and a fresh id.
    pub fn new(grid: Vec2i) -> Self {
        Self {
            grid,
            eligibility: None,
            id: None,
        }
    }

    /// Attach an eligibility filter.
    pub fn with_eligibility(mut self, filter: impl Eligibility + 'static) -> Self {
        self.eligibility = Some(Arc::new(filter));
        self
    }

    /// Use a pre-allocated container id.
    pub fn with_id(mut self, id: ContainerId) -> Self {
        self.id = Some(id);
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.x < 0 || self.grid.y < 0 {
            return Err(ConfigError::NegativeGrid {
                width: self.grid.x,
                height: self.grid.y,
            });
        }
        let cells = self.grid.area();
        if cells > Self::MAX_CELLS {
            return Err(ConfigError::GridTooLarge {
                cells,
                max: Self::MAX_CELLS,
            });
        }
        Ok(())
    }
}
