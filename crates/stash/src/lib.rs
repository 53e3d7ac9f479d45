//! Stash: grid inventory containers for games and simulations.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Stash sub-crates. For most users, adding `stash` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use stash::prelude::*;
//!
//! let registry = Arc::new(ItemRegistry::new());
//! let config = ContainerConfig::new(Vec2i::new(4, 3))
//!     .with_eligibility(CategoryFilter::deny([CategoryId(9)]));
//! let backpack = Container::new(config, registry.clone()).unwrap();
//!
//! let rifle = registry.spawn(Vec2i::new(4, 1), CategoryId(1)).unwrap();
//! let medkit = registry.spawn(Vec2i::new(2, 2), CategoryId(2)).unwrap();
//!
//! assert!(backpack.add_item(&rifle));
//! assert!(backpack.add_item(&medkit));
//! assert_eq!(backpack.position_of(medkit.id), Some(Vec2i::new(0, 1)));
//! assert_eq!(registry.holder(rifle.id), Some(backpack.id()));
//!
//! // Move the medkit right; its old footprint does not block it.
//! assert!(backpack.add_item_at(&medkit, Vec2i::new(1, 1)));
//!
//! backpack.dump();
//! assert!(registry.is_alive(rifle.id));
//! assert_eq!(registry.holder(rifle.id), None);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `stash-core` | IDs, geometry, items, collaborator traits |
//! | [`container`] | `stash-container` | Containers, filters, events, replication |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`stash-core`).
///
/// Contains [`types::Vec2i`] and [`types::Rect`] geometry, [`types::Item`],
/// and the collaborator traits [`types::Eligibility`] and
/// [`types::ItemLifecycle`].
pub use stash_core as types;

/// Grid containers (`stash-container`).
///
/// [`container::Container`] is the main type. Observe it with callbacks or
/// channels, and mirror it elsewhere with [`container::EntryMirror`] or
/// [`container::Container::apply_remote`].
pub use stash_container as container;

/// Common imports for typical Stash usage.
///
/// ```rust
/// use stash::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use stash_core::{
        CategoryId, ContainerId, Eligibility, Item, ItemId, ItemLifecycle, Rect, UntrackedItems,
        Vec2i,
    };

    // Errors
    pub use stash_container::{ConfigError, ReplicationError};
    pub use stash_core::ItemError;

    // Containers
    pub use stash_container::{
        AddOutcome, CategoryFilter, ChangeEvent, ChangeKind, Container, ContainerConfig,
        ContainerMetrics, EntryMirror, ItemRegistry, StoredEntry,
    };
}
