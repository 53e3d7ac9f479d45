//! Collaborator traits a container is configured with.

use crate::id::{ContainerId, ItemId};
use crate::item::Item;

/// Decides whether an item may ever be stored in a container, independent
/// of spatial fit.
///
/// Implementations must be pure and non-blocking: the predicate runs on
/// every add and there is no timeout. Any `Fn(&Item) -> bool` closure that
/// is `Send + Sync` implements this trait.
pub trait Eligibility: Send + Sync {
    /// `true` if `item` may be stored.
    fn allows(&self, item: &Item) -> bool;
}

impl<F> Eligibility for F
where
    F: Fn(&Item) -> bool + Send + Sync,
{
    fn allows(&self, item: &Item) -> bool {
        self(item)
    }
}

/// The owner of item lifetimes, told about container membership changes.
///
/// The container is the sole writer of an item's "current container"
/// back-reference; the lifecycle system only mirrors it. Calls arrive while
/// the container holds its state lock, so implementations must never call
/// back into a container.
pub trait ItemLifecycle: Send + Sync {
    /// Record that `container` now holds `item`.
    ///
    /// Succeeds if the item has no holder or is already held by
    /// `container`. Otherwise returns `Err(current_holder)` and changes
    /// nothing. Unknown items are accepted; the container does not own
    /// item existence.
    fn claim(&self, item: ItemId, container: ContainerId) -> Result<(), ContainerId>;

    /// Clear the back-reference, if (and only if) it points at `container`.
    fn release(&self, item: ItemId, container: ContainerId);

    /// Destroy the item. Irreversible; destroying an unknown or already
    /// destroyed item is a no-op.
    fn destroy(&self, item: ItemId);
}

/// A lifecycle that tracks nothing: every claim succeeds and destruction
/// is a no-op. Suitable for containers whose items are plain values.
#[derive(Clone, Copy, Debug, Default)]
pub struct UntrackedItems;

impl ItemLifecycle for UntrackedItems {
    fn claim(&self, _item: ItemId, _container: ContainerId) -> Result<(), ContainerId> {
        Ok(())
    }

    fn release(&self, _item: ItemId, _container: ContainerId) {}

    fn destroy(&self, _item: ItemId) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CategoryId, Vec2i};

    #[test]
    fn closures_are_eligibility_filters() {
        let only_ammo = |item: &Item| item.category == CategoryId(7);
        let ammo = Item::new(ItemId(1), Vec2i::ONE, CategoryId(7));
        let gun = Item::new(ItemId(2), Vec2i::ONE, CategoryId(1));
        let filter: &dyn Eligibility = &only_ammo;
        assert!(filter.allows(&ammo));
        assert!(!filter.allows(&gun));
    }

    #[test]
    fn untracked_lifecycle_accepts_everything() {
        let life = UntrackedItems;
        let a = ContainerId::next();
        let b = ContainerId::next();
        assert_eq!(life.claim(ItemId(1), a), Ok(()));
        assert_eq!(life.claim(ItemId(1), b), Ok(()));
        life.release(ItemId(1), a);
        life.destroy(ItemId(1));
    }
}
