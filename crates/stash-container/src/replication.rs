//! Replication support: list operations, snapshots, and an event mirror.
//!
//! The transport is someone else's job. This module gives it the three
//! things it needs: the ordered-list operations to ship ([`EntryOp`]),
//! a way to rebuild or apply them on the receiving side
//! ([`Container::restore`], [`Container::apply_remote`]), and an
//! observer-side replica that folds [`ChangeEvent`]s back into the ordered
//! sequence ([`EntryMirror`]).

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use stash_core::{ContainerId, ItemId};
use tracing::debug;

use crate::container::Container;
use crate::entry::StoredEntry;
use crate::event::{ChangeEvent, ChangeKind};
use crate::metrics::MetricCounters;

// ── ReplicationError ───────────────────────────────────────────────

/// Errors from applying replicated operations or events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicationError {
    /// An index does not address the sequence.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Current sequence length.
        len: usize,
    },
    /// An event at or below the last applied revision (or already queued).
    StaleRevision {
        /// The event's revision.
        revision: u64,
        /// Last revision applied.
        applied: u64,
    },
    /// The event came from a different container.
    ForeignContainer {
        /// The mirrored container.
        expected: ContainerId,
        /// The event's container.
        got: ContainerId,
    },
    /// The entry at `index` is not the item the event refers to.
    ItemMismatch {
        /// The offending index.
        index: usize,
    },
    /// The item is already in the sequence at another index.
    DuplicateItem {
        /// The duplicated item.
        item: ItemId,
    },
    /// The item is held by another container on this side.
    HeldElsewhere {
        /// The item.
        item: ItemId,
        /// Its current holder.
        holder: ContainerId,
    },
    /// An event is missing the entry its kind requires.
    MalformedEvent {
        /// The event's revision.
        revision: u64,
    },
}

impl fmt::Display for ReplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for {len} entries")
            }
            Self::StaleRevision { revision, applied } => {
                write!(f, "revision {revision} already applied (at {applied})")
            }
            Self::ForeignContainer { expected, got } => {
                write!(f, "event from container {got}, mirroring {expected}")
            }
            Self::ItemMismatch { index } => write!(f, "entry at index {index} is a different item"),
            Self::DuplicateItem { item } => write!(f, "item {item} already present"),
            Self::HeldElsewhere { item, holder } => {
                write!(f, "item {item} is held by container {holder}")
            }
            Self::MalformedEvent { revision } => {
                write!(f, "event {revision} is missing its entry")
            }
        }
    }
}

impl Error for ReplicationError {}

// ── EntryOp ────────────────────────────────────────────────────────

/// An ordered-list operation, as replayed by a replication layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryOp {
    /// Insert `entry` at `index`, shifting later entries.
    Insert {
        /// Target index (`<= len`).
        index: usize,
        /// The entry.
        entry: StoredEntry,
    },
    /// Replace the entry at `index`.
    Set {
        /// Target index (`< len`).
        index: usize,
        /// The replacement.
        entry: StoredEntry,
    },
    /// Remove the entry at `index`, shifting later entries.
    Remove {
        /// Target index (`< len`).
        index: usize,
    },
    /// Remove everything.
    Clear,
}

impl ChangeEvent {
    /// The list operation that reproduces this change on a replica.
    ///
    /// Returns `None` for an add or move event without a current entry,
    /// which [`Container`] never emits.
    pub fn to_entry_op(&self) -> Option<EntryOp> {
        match self.kind {
            ChangeKind::Add => self.current.map(|entry| EntryOp::Insert {
                index: self.index,
                entry,
            }),
            ChangeKind::Move => self.current.map(|entry| EntryOp::Set {
                index: self.index,
                entry,
            }),
            ChangeKind::Remove if self.is_reset() => Some(EntryOp::Clear),
            ChangeKind::Remove => Some(EntryOp::Remove { index: self.index }),
        }
    }
}

// ── ContainerSnapshot ──────────────────────────────────────────────

/// A consistent copy of a container's entry sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerSnapshot {
    /// Source container.
    pub container: ContainerId,
    /// Revision the copy was taken at.
    pub revision: u64,
    /// Entries in insertion order.
    pub entries: Vec<StoredEntry>,
}

impl Container {
    /// Copy the entry sequence together with its revision.
    pub fn snapshot(&self) -> ContainerSnapshot {
        self.mutate(|m| ContainerSnapshot {
            container: m.container,
            revision: m.state.revision,
            entries: m.state.entries.values().copied().collect(),
        })
    }

    /// Rebuild from a trusted snapshot via
    /// [`add_items_unchecked`](Container::add_items_unchecked).
    ///
    /// Existing entries are kept; restore into an empty container to get
    /// an exact copy. Returns how many placements changed the container.
    pub fn restore(&self, snapshot: &ContainerSnapshot) -> usize {
        self.add_items_unchecked(snapshot.entries.iter().map(|e| (*e.item(), e.position())))
    }

    /// Apply an operation replicated from a remote authority.
    ///
    /// The remote side already validated placement, so only structural
    /// consistency is checked. Each operation raises the matching change
    /// event (`Set` raises a move).
    pub fn apply_remote(&self, op: EntryOp) -> Result<(), ReplicationError> {
        let id = self.id();
        let result = self.mutate(|m| {
            let len = m.state.entries.len();
            match op {
                EntryOp::Insert { index, entry } => {
                    if index > len {
                        return Err(ReplicationError::IndexOutOfRange { index, len });
                    }
                    if m.state.entries.contains_key(&entry.id()) {
                        return Err(ReplicationError::DuplicateItem { item: entry.id() });
                    }
                    self.lifecycle()
                        .claim(entry.id(), id)
                        .map_err(|holder| ReplicationError::HeldElsewhere {
                            item: entry.id(),
                            holder,
                        })?;
                    m.state.entries.shift_insert(index, entry.id(), entry);
                    m.record(ChangeKind::Add, index, None, Some(entry));
                    MetricCounters::bump(&self.counters().adds, 1);
                }
                EntryOp::Set { index, entry } => {
                    let Some(previous) = m.state.entries.get_index(index).map(|(_, e)| *e) else {
                        return Err(ReplicationError::IndexOutOfRange { index, len });
                    };
                    if previous.id() == entry.id() {
                        m.state.entries[index] = entry;
                    } else {
                        if m.state.entries.contains_key(&entry.id()) {
                            return Err(ReplicationError::DuplicateItem { item: entry.id() });
                        }
                        self.lifecycle()
                            .claim(entry.id(), id)
                            .map_err(|holder| ReplicationError::HeldElsewhere {
                                item: entry.id(),
                                holder,
                            })?;
                        self.lifecycle().release(previous.id(), id);
                        m.state.entries.shift_remove_index(index);
                        m.state.entries.shift_insert(index, entry.id(), entry);
                    }
                    m.record(ChangeKind::Move, index, Some(previous), Some(entry));
                    MetricCounters::bump(&self.counters().moves, 1);
                }
                EntryOp::Remove { index } => {
                    let Some((item, previous)) = m.state.entries.shift_remove_index(index) else {
                        return Err(ReplicationError::IndexOutOfRange { index, len });
                    };
                    self.lifecycle().release(item, id);
                    m.record(ChangeKind::Remove, index, Some(previous), None);
                    MetricCounters::bump(&self.counters().removes, 1);
                }
                EntryOp::Clear => {
                    if len > 0 {
                        for item in m.state.entries.keys() {
                            self.lifecycle().release(*item, id);
                        }
                        m.state.entries.clear();
                        m.record(ChangeKind::Remove, 0, None, None);
                    }
                }
            }
            Ok(())
        });
        if let Err(e) = &result {
            debug!(container = %id, error = %e, "remote operation rejected");
        }
        result
    }
}

// ── EntryMirror ────────────────────────────────────────────────────

/// Observer-side replica of a container's ordered entry sequence.
///
/// Feed it every [`ChangeEvent`] of one container, in any order; it
/// applies them in revision order, holding back events that arrive early.
/// Events already covered by the snapshot it was built from are ignored.
/// After an error the mirror may be inconsistent and should be rebuilt
/// from a fresh [`ContainerSnapshot`].
///
/// Attach with [`Container::subscribe_with_snapshot`] while other threads
/// may be mutating: it registers the channel and copies the entries in one
/// critical section, so no event is missed.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stash_container::{Container, ContainerConfig, EntryMirror};
/// use stash_core::{CategoryId, Item, ItemId, UntrackedItems, Vec2i};
///
/// let config = ContainerConfig::new(Vec2i::new(3, 3));
/// let chest = Container::new(config, Arc::new(UntrackedItems)).unwrap();
/// let (events, snapshot) = chest.subscribe_with_snapshot();
/// let mut mirror = EntryMirror::from_snapshot(&snapshot);
///
/// chest.add_item(&Item::new(ItemId(1), Vec2i::new(2, 2), CategoryId(0)));
/// chest.add_item(&Item::new(ItemId(2), Vec2i::ONE, CategoryId(0)));
/// for event in events.try_iter() {
///     mirror.apply(event).unwrap();
/// }
/// assert_eq!(mirror.entries(), chest.entries().as_slice());
/// ```
#[derive(Clone, Debug)]
pub struct EntryMirror {
    container: ContainerId,
    baseline: u64,
    applied: u64,
    entries: Vec<StoredEntry>,
    pending: BTreeMap<u64, ChangeEvent>,
}

impl EntryMirror {
    /// Start from a snapshot; events after its revision apply on top.
    pub fn from_snapshot(snapshot: &ContainerSnapshot) -> Self {
        Self {
            container: snapshot.container,
            baseline: snapshot.revision,
            applied: snapshot.revision,
            entries: snapshot.entries.clone(),
            pending: BTreeMap::new(),
        }
    }

    /// The mirrored sequence.
    pub fn entries(&self) -> &[StoredEntry] {
        &self.entries
    }

    /// Last revision applied.
    pub fn revision(&self) -> u64 {
        self.applied
    }

    /// Events received ahead of a missing revision.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Accept one event. Returns how many events were applied as a result
    /// (`0` if it was queued behind a gap or predates the snapshot).
    ///
    /// An event the mirror already applied, or already holds, is a
    /// duplicate and fails with `StaleRevision`.
    pub fn apply(&mut self, event: ChangeEvent) -> Result<usize, ReplicationError> {
        if event.container != self.container {
            return Err(ReplicationError::ForeignContainer {
                expected: self.container,
                got: event.container,
            });
        }
        if event.revision <= self.baseline {
            return Ok(0);
        }
        if event.revision <= self.applied || self.pending.contains_key(&event.revision) {
            return Err(ReplicationError::StaleRevision {
                revision: event.revision,
                applied: self.applied,
            });
        }
        self.pending.insert(event.revision, event);
        let mut applied = 0;
        while let Some(next) = self.pending.remove(&(self.applied + 1)) {
            self.apply_in_order(&next)?;
            self.applied = next.revision;
            applied += 1;
        }
        Ok(applied)
    }

    fn apply_in_order(&mut self, event: &ChangeEvent) -> Result<(), ReplicationError> {
        let len = self.entries.len();
        let index = event.index;
        let malformed = ReplicationError::MalformedEvent {
            revision: event.revision,
        };
        match event.kind {
            ChangeKind::Add => {
                let entry = event.current.ok_or(malformed)?;
                if index > len {
                    return Err(ReplicationError::IndexOutOfRange { index, len });
                }
                self.entries.insert(index, entry);
            }
            ChangeKind::Move => {
                let entry = event.current.ok_or(malformed)?;
                self.check_slot(index, event.previous)?;
                self.entries[index] = entry;
            }
            ChangeKind::Remove if event.is_reset() => self.entries.clear(),
            ChangeKind::Remove => {
                self.check_slot(index, event.previous)?;
                self.entries.remove(index);
            }
        }
        Ok(())
    }

    fn check_slot(
        &self,
        index: usize,
        previous: Option<StoredEntry>,
    ) -> Result<(), ReplicationError> {
        let Some(current) = self.entries.get(index) else {
            return Err(ReplicationError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        };
        match previous {
            Some(prev) if prev.id() != current.id() => {
                Err(ReplicationError::ItemMismatch { index })
            }
            _ => Ok(()),
        }
    }
}
