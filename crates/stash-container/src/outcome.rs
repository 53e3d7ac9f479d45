//! Tagged results for placement requests.

use stash_core::{ContainerId, Vec2i};

/// Why an add or move succeeded or failed.
///
/// [`Container::try_add_item`](crate::Container::try_add_item) and
/// [`Container::try_add_item_at`](crate::Container::try_add_item_at) return
/// this; the boolean `add_item` / `add_item_at` collapse it with
/// [`is_success`](AddOutcome::is_success).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum AddOutcome {
    /// The item was inserted.
    Added {
        /// Where it was placed.
        position: Vec2i,
    },
    /// `add_item` on an item that is already stored. Nothing changed.
    AlreadyPresent {
        /// Its current position.
        position: Vec2i,
    },
    /// `add_item_at` to the position the item already occupies.
    AlreadyAtPosition,
    /// A stored item was moved.
    Moved {
        /// Previous position.
        from: Vec2i,
        /// New position.
        to: Vec2i,
    },
    /// The eligibility filter refused the item, or the item is this
    /// container.
    EligibilityRejected,
    /// No free area of the item's size exists (or the requested one is
    /// occupied / out of bounds).
    NoSpace,
    /// Another container holds the item.
    HeldElsewhere {
        /// The current holder.
        holder: ContainerId,
    },
}

impl AddOutcome {
    /// `true` if the item is stored (at the requested place, for
    /// positioned adds) after the call.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Added { .. }
                | Self::AlreadyPresent { .. }
                | Self::AlreadyAtPosition
                | Self::Moved { .. }
        )
    }

    /// `true` if the call changed the container.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Added { .. } | Self::Moved { .. })
    }
}
