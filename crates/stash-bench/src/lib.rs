//! Benchmark profiles and utilities for the Stash container engine.
//!
//! - [`reference_profile`]: 10x6 backpack-sized grid
//! - [`stress_profile`]: 64x64 grid at the scale of a warehouse
//! - [`item_mix`]: deterministic item sizes via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use stash_container::{Container, ContainerConfig};
use stash_core::{CategoryId, Item, ItemId, UntrackedItems, Vec2i};

/// Build an empty 10x6 container with no filter.
pub fn reference_profile() -> Container {
    profile(Vec2i::new(10, 6))
}

/// Build an empty 64x64 container (4096 cells).
pub fn stress_profile() -> Container {
    profile(Vec2i::new(64, 64))
}

fn profile(grid: Vec2i) -> Container {
    match Container::new(ContainerConfig::new(grid), Arc::new(UntrackedItems)) {
        Ok(c) => c,
        Err(e) => panic!("benchmark profile is invalid: {e}"),
    }
}

/// Generate `n` items with sizes between 1x1 and 3x2.
///
/// Sizes come from a simple multiplicative hash of the seed, so a given
/// seed always yields the same mix.
pub fn item_mix(n: usize, seed: u64) -> Vec<Item> {
    (0..n as u64)
        .map(|i| {
            let h = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(i.wrapping_mul(1442695040888963407));
            let w = 1 + (h >> 33) % 3;
            let d = 1 + (h >> 17) % 2;
            Item::new(ItemId(i), Vec2i::new(w as i32, d as i32), CategoryId((h % 4) as u32))
        })
        .collect()
}

/// Fill `container` with `items` until the first rejection.
///
/// Returns how many were stored.
pub fn fill(container: &Container, items: &[Item]) -> usize {
    items.iter().take_while(|i| container.add_item(i)).count()
}
