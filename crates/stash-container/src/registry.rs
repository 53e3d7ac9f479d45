//! A thread-safe [`ItemLifecycle`] implementation that owns item lifetimes.

use std::sync::Mutex;

use stash_core::{CategoryId, ContainerId, Item, ItemError, ItemId, ItemLifecycle, Vec2i};

use crate::event::lock;
use crate::handle::HandleTable;

struct ItemRecord {
    item: Item,
    holder: Option<ContainerId>,
}

/// Owns items and mirrors which container currently holds each one.
///
/// Containers write the holder through [`ItemLifecycle`]; everything else
/// only reads it. Destroyed ids go stale and resolve to `None`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stash_container::{Container, ContainerConfig, ItemRegistry};
/// use stash_core::{CategoryId, Vec2i};
///
/// let registry = Arc::new(ItemRegistry::new());
/// let bag = Container::new(ContainerConfig::new(Vec2i::new(4, 4)), registry.clone()).unwrap();
///
/// let apple = registry.spawn(Vec2i::new(1, 1), CategoryId(0)).unwrap();
/// assert!(bag.add_item(&apple));
/// assert_eq!(registry.holder(apple.id), Some(bag.id()));
/// ```
pub struct ItemRegistry {
    table: Mutex<HandleTable<ItemRecord>>,
}

// Compile-time assertion: ItemRegistry must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<ItemRegistry>();
};

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            table: Mutex::new(HandleTable::new()),
        }
    }

    /// Create a plain item of the given size and category.
    ///
    /// Returns `Err(ItemError::InvalidSize)` unless both dimensions are at
    /// least 1.
    pub fn spawn(&self, size: Vec2i, category: CategoryId) -> Result<Item, ItemError> {
        self.spawn_inner(size, category, None)
    }

    /// Create an item that is itself the container `inner`.
    pub fn spawn_container(
        &self,
        size: Vec2i,
        category: CategoryId,
        inner: ContainerId,
    ) -> Result<Item, ItemError> {
        self.spawn_inner(size, category, Some(inner))
    }

    fn spawn_inner(
        &self,
        size: Vec2i,
        category: CategoryId,
        inner: Option<ContainerId>,
    ) -> Result<Item, ItemError> {
        if !size.is_positive() {
            return Err(ItemError::InvalidSize {
                width: size.x,
                height: size.y,
            });
        }
        let mut table = lock(&self.table);
        let id = table.insert_with(|id| ItemRecord {
            item: Item {
                id,
                size,
                category,
                inner_container: inner,
            },
            holder: None,
        });
        table
            .get(id)
            .map(|r| r.item)
            .ok_or(ItemError::UnknownItem { item: id })
    }

    /// The descriptor of a live item.
    pub fn get(&self, id: ItemId) -> Option<Item> {
        lock(&self.table).get(id).map(|r| r.item)
    }

    /// Like [`get`](Self::get), as a `Result`.
    pub fn require(&self, id: ItemId) -> Result<Item, ItemError> {
        self.get(id).ok_or(ItemError::UnknownItem { item: id })
    }

    /// The container currently holding `id`, if any.
    pub fn holder(&self, id: ItemId) -> Option<ContainerId> {
        lock(&self.table).get(id).and_then(|r| r.holder)
    }

    /// `true` if `id` names an item that has not been destroyed.
    pub fn is_alive(&self, id: ItemId) -> bool {
        lock(&self.table).get(id).is_some()
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        lock(&self.table).len()
    }

    /// `true` if no items are alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemLifecycle for ItemRegistry {
    fn claim(&self, item: ItemId, container: ContainerId) -> Result<(), ContainerId> {
        let mut table = lock(&self.table);
        let Some(record) = table.get_mut(item) else {
            return Ok(());
        };
        match record.holder {
            Some(holder) if holder != container => Err(holder),
            _ => {
                record.holder = Some(container);
                Ok(())
            }
        }
    }

    fn release(&self, item: ItemId, container: ContainerId) {
        let mut table = lock(&self.table);
        if let Some(record) = table.get_mut(item) {
            if record.holder == Some(container) {
                record.holder = None;
            }
        }
    }

    fn destroy(&self, item: ItemId) {
        lock(&self.table).remove(item);
    }
}
