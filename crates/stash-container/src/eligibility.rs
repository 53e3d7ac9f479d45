//! Category-based eligibility filters.

use indexmap::IndexSet;
use stash_core::{CategoryId, Eligibility, Item};

/// Allow- or deny-list over item categories.
///
/// # Examples
///
/// ```
/// use stash_container::CategoryFilter;
/// use stash_core::{CategoryId, Eligibility, Item, ItemId, Vec2i};
///
/// let ammo_only = CategoryFilter::allow([CategoryId(3)]);
/// let round = Item::new(ItemId(1), Vec2i::ONE, CategoryId(3));
/// let knife = Item::new(ItemId(2), Vec2i::ONE, CategoryId(5));
/// assert!(ammo_only.allows(&round));
/// assert!(!ammo_only.allows(&knife));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Only the listed categories are eligible.
    Allow(IndexSet<CategoryId>),
    /// Every category except the listed ones is eligible.
    Deny(IndexSet<CategoryId>),
}

impl CategoryFilter {
    /// Allow exactly `categories`.
    pub fn allow(categories: impl IntoIterator<Item = CategoryId>) -> Self {
        Self::Allow(categories.into_iter().collect())
    }

    /// Allow everything except `categories`.
    pub fn deny(categories: impl IntoIterator<Item = CategoryId>) -> Self {
        Self::Deny(categories.into_iter().collect())
    }
}

impl Eligibility for CategoryFilter {
    fn allows(&self, item: &Item) -> bool {
        match self {
            Self::Allow(set) => set.contains(&item.category),
            Self::Deny(set) => !set.contains(&item.category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_core::{ItemId, Vec2i};

    fn item(category: u32) -> Item {
        Item::new(ItemId(1), Vec2i::ONE, CategoryId(category))
    }

    #[test]
    fn empty_allow_list_rejects_everything() {
        let f = CategoryFilter::allow([]);
        assert!(!f.allows(&item(0)));
    }

    #[test]
    fn deny_list_rejects_only_listed() {
        let f = CategoryFilter::deny([CategoryId(1), CategoryId(2)]);
        assert!(f.allows(&item(0)));
        assert!(!f.allows(&item(2)));
    }
}
