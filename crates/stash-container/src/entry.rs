//! Stored entries: the binding of one item to one grid position.

use indexmap::IndexMap;
use stash_core::{Item, ItemId, Rect, Vec2i};

/// The ordered entry sequence, keyed by item id.
///
/// Insertion order is the replication order; removals use `shift_remove`
/// so surviving entries keep their relative order.
pub(crate) type Entries = IndexMap<ItemId, StoredEntry>;

/// One item placed at one position in a container's grid.
///
/// Entries are immutable by replacement: a move installs a new entry at the
/// same sequence index rather than editing the old one. The only mutable
/// state is the exclusion flag, which is set only by a scoped guard for
/// the duration of a single free-area query and is never observable
/// outside the container lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoredEntry {
    item: Item,
    position: Vec2i,
    excluded: bool,
}

impl StoredEntry {
    /// Bind `item` to `position`.
    pub fn new(item: Item, position: Vec2i) -> Self {
        Self {
            item,
            position,
            excluded: false,
        }
    }

    /// The stored item descriptor.
    pub fn item(&self) -> &Item {
        &self.item
    }

    /// Shorthand for `self.item().id`.
    pub fn id(&self) -> ItemId {
        self.item.id
    }

    /// Top-left cell.
    pub fn position(&self) -> Vec2i {
        self.position
    }

    /// Cells covered by the item.
    pub fn rect(&self) -> Rect {
        self.item.footprint_at(self.position)
    }

    /// A copy of this entry at a new position.
    pub fn moved_to(&self, position: Vec2i) -> Self {
        Self::new(self.item, position)
    }

    pub(crate) fn is_excluded(&self) -> bool {
        self.excluded
    }

    pub(crate) fn set_excluded(&mut self, excluded: bool) {
        self.excluded = excluded;
    }
}
