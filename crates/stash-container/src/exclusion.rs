//! Scoped exclusion of one entry from free-area computation.
//!
//! Moving an item to a rectangle that overlaps its own current footprint is
//! legal, so the free-area check must ignore that item. [`ExclusionGuard`]
//! flags the entry on construction and restores the previous flag on drop,
//! which covers early returns and unwinding alike.

use stash_core::ItemId;

use crate::entry::Entries;

/// Marks one entry as excluded for the lifetime of the guard.
///
/// If the item is not stored the guard is inert. The guard borrows the
/// entry map mutably, so nothing else can observe the flag while it is set.
pub(crate) struct ExclusionGuard<'a> {
    entries: &'a mut Entries,
    index: Option<usize>,
    previous: bool,
}

impl<'a> ExclusionGuard<'a> {
    pub(crate) fn new(entries: &'a mut Entries, item: ItemId) -> Self {
        let index = entries.get_index_of(&item);
        let mut previous = false;
        if let Some((_, entry)) = index.and_then(|i| entries.get_index_mut(i)) {
            previous = entry.is_excluded();
            entry.set_excluded(true);
        }
        Self {
            entries,
            index,
            previous,
        }
    }

    /// The entry map with the guarded entry flagged.
    pub(crate) fn entries(&self) -> &Entries {
        self.entries
    }
}

impl Drop for ExclusionGuard<'_> {
    fn drop(&mut self) {
        if let Some((_, entry)) = self.index.and_then(|i| self.entries.get_index_mut(i)) {
            entry.set_excluded(self.previous);
        }
    }
}

/// Run `f` with `item`'s entry excluded, restoring the flag afterwards.
pub(crate) fn with_excluded<R>(
    entries: &mut Entries,
    item: ItemId,
    f: impl FnOnce(&Entries) -> R,
) -> R {
    let guard = ExclusionGuard::new(entries, item);
    f(guard.entries())
}
