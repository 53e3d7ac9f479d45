//! Test utilities and mock types for Stash development.
//!
//! Provides a recording [`ItemLifecycle`] mock ([`MockLifecycle`]), an
//! event recorder ([`RecordingObserver`]), structural invariant checks
//! ([`check_invariants`]) and a [`TestStash`] scaffold for building
//! containers with tracked items.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::Receiver;
use stash_container::{ChangeEvent, Container, StoredEntry};
use stash_core::{ContainerId, ItemId, ItemLifecycle, Rect, Vec2i};

pub use fixtures::{item, TestStash};

/// One call observed by [`MockLifecycle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleCall {
    Claim(ItemId, ContainerId),
    Release(ItemId, ContainerId),
    Destroy(ItemId),
}

/// Mock implementation of [`ItemLifecycle`].
///
/// Records every call in order. Claims succeed unless the item was
/// registered with [`hold_elsewhere`](MockLifecycle::hold_elsewhere).
#[derive(Default)]
pub struct MockLifecycle {
    calls: Mutex<Vec<LifecycleCall>>,
    foreign: Mutex<Vec<(ItemId, ContainerId)>>,
}

impl MockLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every claim of `item` fail as if `holder` had it.
    pub fn hold_elsewhere(&self, item: ItemId, holder: ContainerId) {
        self.foreign
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((item, holder));
    }

    /// Calls observed so far.
    pub fn calls(&self) -> Vec<LifecycleCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, call: LifecycleCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl ItemLifecycle for MockLifecycle {
    fn claim(&self, item: ItemId, container: ContainerId) -> Result<(), ContainerId> {
        self.push(LifecycleCall::Claim(item, container));
        let foreign = self.foreign.lock().unwrap_or_else(PoisonError::into_inner);
        match foreign.iter().find(|(id, _)| *id == item) {
            Some((_, holder)) => Err(*holder),
            None => Ok(()),
        }
    }

    fn release(&self, item: ItemId, container: ContainerId) {
        self.push(LifecycleCall::Release(item, container));
    }

    fn destroy(&self, item: ItemId) {
        self.push(LifecycleCall::Destroy(item));
    }
}

/// Collects every event a container raises through a channel.
pub struct RecordingObserver {
    rx: Receiver<ChangeEvent>,
}

impl RecordingObserver {
    /// Subscribe to `container`.
    pub fn attach(container: &Container) -> Self {
        Self {
            rx: container.subscribe(),
        }
    }

    /// Everything received since the last drain.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.rx.try_iter().collect()
    }
}

/// A broken structural invariant found by [`check_invariants`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    OutOfBounds { item: ItemId, rect: Rect },
    Overlap { a: ItemId, b: ItemId },
    Duplicate { item: ItemId },
    EmptySize { item: ItemId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { item, rect } => write!(f, "item {item} at {rect} leaves the grid"),
            Self::Overlap { a, b } => write!(f, "items {a} and {b} overlap"),
            Self::Duplicate { item } => write!(f, "item {item} stored twice"),
            Self::EmptySize { item } => write!(f, "item {item} has an empty size"),
        }
    }
}

/// Check bounds, size, uniqueness and pairwise non-overlap of `entries`
/// against a grid of size `grid`.
pub fn check_entries(entries: &[StoredEntry], grid: Vec2i) -> Result<(), Violation> {
    let bounds = Rect::new(Vec2i::ZERO, grid);
    for (i, a) in entries.iter().enumerate() {
        if !a.item().size.is_positive() {
            return Err(Violation::EmptySize { item: a.id() });
        }
        if !bounds.contains_rect(&a.rect()) {
            return Err(Violation::OutOfBounds {
                item: a.id(),
                rect: a.rect(),
            });
        }
        for b in &entries[i + 1..] {
            if a.id() == b.id() {
                return Err(Violation::Duplicate { item: a.id() });
            }
            if a.rect().overlaps(&b.rect()) {
                return Err(Violation::Overlap {
                    a: a.id(),
                    b: b.id(),
                });
            }
        }
    }
    Ok(())
}

/// [`check_entries`] on a live container, plus agreement between the
/// entry list and the point queries.
pub fn check_invariants(container: &Container) -> Result<(), Violation> {
    let entries = container.entries();
    check_entries(&entries, container.grid())?;
    for e in &entries {
        if container.position_of(e.id()) != Some(e.position()) {
            return Err(Violation::Duplicate { item: e.id() });
        }
    }
    Ok(())
}

/// Shared handle to a [`MockLifecycle`], for passing to a container while
/// keeping access to the recorded calls.
pub fn mock_lifecycle() -> Arc<MockLifecycle> {
    Arc::new(MockLifecycle::new())
}
