//! Reusable container fixtures.
//!
//! [`TestStash`] bundles an [`ItemRegistry`] with containers that report to
//! it, so tests can spawn items and inspect holders without wiring.

use std::sync::Arc;

use stash_container::{Container, ContainerConfig, ItemRegistry};
use stash_core::{CategoryId, Eligibility, Item, ItemId, Vec2i};

/// An untracked item with the given id and size, category 0.
pub fn item(id: u64, width: i32, height: i32) -> Item {
    Item::new(ItemId(id), Vec2i::new(width, height), CategoryId(0))
}

/// A registry plus helpers for building containers bound to it.
pub struct TestStash {
    pub registry: Arc<ItemRegistry>,
}

impl TestStash {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ItemRegistry::new()),
        }
    }

    /// A container of `width` x `height` bound to the registry.
    pub fn container(&self, width: i32, height: i32) -> Container {
        self.container_with(ContainerConfig::new(Vec2i::new(width, height)))
    }

    /// A container restricted by `filter`.
    pub fn filtered(
        &self,
        width: i32,
        height: i32,
        filter: impl Eligibility + 'static,
    ) -> Container {
        let config = ContainerConfig::new(Vec2i::new(width, height)).with_eligibility(filter);
        self.container_with(config)
    }

    /// A container from an explicit config.
    ///
    /// # Panics
    ///
    /// Panics if the config is invalid.
    pub fn container_with(&self, config: ContainerConfig) -> Container {
        match Container::new(config, self.registry.clone()) {
            Ok(c) => c,
            Err(e) => panic!("invalid test container config: {e}"),
        }
    }

    /// Spawn a tracked item of category 0.
    ///
    /// # Panics
    ///
    /// Panics if the size is empty.
    pub fn spawn(&self, width: i32, height: i32) -> Item {
        self.spawn_in(width, height, CategoryId(0))
    }

    /// Spawn a tracked item of `category`.
    pub fn spawn_in(&self, width: i32, height: i32, category: CategoryId) -> Item {
        match self.registry.spawn(Vec2i::new(width, height), category) {
            Ok(item) => item,
            Err(e) => panic!("cannot spawn test item: {e}"),
        }
    }
}

impl Default for TestStash {
    fn default() -> Self {
        Self::new()
    }
}
