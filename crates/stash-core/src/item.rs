//! The [`Item`] descriptor a container stores.

use crate::geometry::{Rect, Vec2i};
use crate::id::{CategoryId, ContainerId, ItemId};

/// Everything a container needs to know about an item.
///
/// Items are owned by an external lifecycle system; containers hold this
/// descriptor as a non-owning reference, keyed by [`Item::id`]. The
/// descriptor is `Copy` and immutable: a resized or re-categorised item is
/// a different descriptor and must be re-stored.
///
/// # Examples
///
/// ```
/// use stash_core::{CategoryId, Item, ItemId, Vec2i};
///
/// let rifle = Item::new(ItemId(1), Vec2i::new(4, 1), CategoryId(2));
/// assert_eq!(rifle.footprint_at(Vec2i::new(1, 3)).max(), Vec2i::new(5, 4));
/// assert!(rifle.inner_container.is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Item {
    /// Unique identity.
    pub id: ItemId,
    /// Width and height in grid cells.
    pub size: Vec2i,
    /// Category consulted by eligibility filters.
    pub category: CategoryId,
    /// If this item is itself a container (a backpack, a crate), the id of
    /// that container. Used to refuse storing a container inside itself.
    pub inner_container: Option<ContainerId>,
}

impl Item {
    /// A plain (non-container) item.
    pub fn new(id: ItemId, size: Vec2i, category: CategoryId) -> Self {
        Self {
            id,
            size,
            category,
            inner_container: None,
        }
    }

    /// An item that is itself the container `inner`.
    pub fn with_inner_container(mut self, inner: ContainerId) -> Self {
        self.inner_container = Some(inner);
        self
    }

    /// The rectangle this item covers when placed at `origin`.
    pub fn footprint_at(&self, origin: Vec2i) -> Rect {
        Rect::new(origin, self.size)
    }
}
