//! The [`Container`]: an ordered set of items placed on a fixed grid.
//!
//! # Locking
//!
//! One mutex per container guards the entry sequence. Every mutation runs
//! "find or validate free area, then insert / move / remove" inside a
//! single critical section, so two concurrent adds can never both claim
//! the same cells. Read-only queries take the same lock briefly and always
//! see a state between operations.
//!
//! The eligibility filter runs *before* the lock is taken and observers
//! run *after* it is released. The item lifecycle collaborator and the
//! observer list are touched under the lock (lock order: container, then
//! lifecycle or observer list).

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crossbeam_channel::Receiver;
use smallvec::SmallVec;
use stash_core::{ContainerId, Eligibility, Item, ItemId, ItemLifecycle, Rect, Vec2i};
use tracing::{debug, trace, warn};

use crate::config::{ConfigError, ContainerConfig};
use crate::entry::{Entries, StoredEntry};
use crate::event::{lock, ChangeEvent, ChangeKind, Dispatcher, ObserverId};
use crate::exclusion::with_excluded;
use crate::metrics::{ContainerMetrics, MetricCounters};
use crate::outcome::AddOutcome;
use crate::placement;
use crate::replication::ContainerSnapshot;

/// State guarded by the container lock.
pub(crate) struct State {
    pub(crate) entries: Entries,
    pub(crate) revision: u64,
    pub(crate) last_modified: Instant,
}

/// Pending notifications for one mutation; almost always exactly one.
pub(crate) type Pending = SmallVec<[ChangeEvent; 1]>;

/// An in-progress mutation: the locked state plus the events it raised.
pub(crate) struct Mutation<'a> {
    pub(crate) container: ContainerId,
    pub(crate) state: &'a mut State,
    pub(crate) events: Pending,
}

impl Mutation<'_> {
    /// Record one structural change, bumping the revision.
    pub(crate) fn record(
        &mut self,
        kind: ChangeKind,
        index: usize,
        previous: Option<StoredEntry>,
        current: Option<StoredEntry>,
    ) {
        self.state.revision += 1;
        self.state.last_modified = Instant::now();
        self.events.push(ChangeEvent {
            container: self.container,
            revision: self.state.revision,
            kind,
            index,
            previous,
            current,
        });
    }
}

/// A grid container holding a bounded set of rectangular items.
///
/// Entries keep insertion order, which is the order replication replays
/// and the order [`entries`](Container::entries) reports. No two entries
/// overlap, every entry lies inside the grid, and each item appears at
/// most once.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stash_container::{Container, ContainerConfig};
/// use stash_core::{CategoryId, Item, ItemId, UntrackedItems, Vec2i};
///
/// let config = ContainerConfig::new(Vec2i::new(4, 4));
/// let pack = Container::new(config, Arc::new(UntrackedItems)).unwrap();
/// let a = Item::new(ItemId(1), Vec2i::ONE, CategoryId(0));
/// let b = Item::new(ItemId(2), Vec2i::ONE, CategoryId(0));
///
/// assert!(pack.add_item(&a));
/// assert!(pack.add_item(&b));
/// assert_eq!(pack.position_of(a.id), Some(Vec2i::new(0, 0)));
/// assert_eq!(pack.position_of(b.id), Some(Vec2i::new(1, 0)));
/// ```
pub struct Container {
    id: ContainerId,
    grid: Vec2i,
    eligibility: Option<Arc<dyn Eligibility>>,
    lifecycle: Arc<dyn ItemLifecycle>,
    state: Mutex<State>,
    dispatcher: Dispatcher,
    metrics: MetricCounters,
}

// Compile-time assertion: Container must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Container>();
};

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("grid", &self.grid)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl Container {
    /// Create an empty container.
    ///
    /// `lifecycle` is told whenever an item enters or leaves, and destroys
    /// items on [`purge`](Container::purge).
    pub fn new(
        config: ContainerConfig,
        lifecycle: Arc<dyn ItemLifecycle>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id: config.id.unwrap_or_else(ContainerId::next),
            grid: config.grid,
            eligibility: config.eligibility,
            lifecycle,
            state: Mutex::new(State {
                entries: Entries::new(),
                revision: 0,
                last_modified: Instant::now(),
            }),
            dispatcher: Dispatcher::new(),
            metrics: MetricCounters::default(),
        })
    }

    // ── Accessors ───────────────────────────────────────────────

    /// This container's id.
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// Grid width and height.
    pub fn grid(&self) -> Vec2i {
        self.grid
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    /// `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` if `item` is stored here.
    pub fn contains(&self, item: ItemId) -> bool {
        lock(&self.state).entries.contains_key(&item)
    }

    /// Copy of the entry sequence in insertion order.
    pub fn entries(&self) -> Vec<StoredEntry> {
        lock(&self.state).entries.values().copied().collect()
    }

    /// Copy of the stored items in insertion order.
    pub fn items(&self) -> Vec<Item> {
        lock(&self.state)
            .entries
            .values()
            .map(|e| *e.item())
            .collect()
    }

    /// Number of structural changes so far.
    pub fn revision(&self) -> u64 {
        lock(&self.state).revision
    }

    /// When the entry sequence last changed (construction time if never).
    pub fn last_modified(&self) -> Instant {
        lock(&self.state).last_modified
    }

    /// Grid cells not covered by any item.
    pub fn free_cells(&self) -> u64 {
        placement::free_cells(&lock(&self.state).entries, self.grid)
    }

    /// Cumulative counters.
    pub fn metrics(&self) -> ContainerMetrics {
        self.metrics.snapshot()
    }

    // ── Observers ───────────────────────────────────────────────

    /// Register a callback invoked synchronously for every change event.
    pub fn observe(
        &self,
        callback: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) -> ObserverId {
        self.dispatcher.observe(Arc::new(callback))
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.dispatcher.unobserve(id)
    }

    /// Receive every change event on a channel. Dropping the receiver
    /// unsubscribes.
    ///
    /// A subscriber registered while other threads mutate may also receive
    /// events that committed just before it subscribed. Use
    /// [`subscribe_with_snapshot`](Self::subscribe_with_snapshot) to know
    /// where the stream starts.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.dispatcher.subscribe()
    }

    /// Subscribe and copy the entry sequence in one critical section.
    ///
    /// Every event with a revision above `snapshot.revision` reaches the
    /// receiver. Events at or below it may also arrive and are already
    /// reflected in the snapshot.
    pub fn subscribe_with_snapshot(&self) -> (Receiver<ChangeEvent>, ContainerSnapshot) {
        let state = lock(&self.state);
        let rx = self.dispatcher.subscribe();
        let snapshot = ContainerSnapshot {
            container: self.id,
            revision: state.revision,
            entries: state.entries.values().copied().collect(),
        };
        (rx, snapshot)
    }

    /// Registered callbacks and channel subscribers. Dropped channels are
    /// counted until the next delivery prunes them.
    pub fn observer_count(&self) -> usize {
        self.dispatcher.observer_count()
    }

    // ── Queries ─────────────────────────────────────────────────

    /// `true` iff `rect` is inside the grid and overlaps no stored item.
    ///
    /// Empty rectangles are never free.
    pub fn is_area_free(&self, rect: Rect) -> bool {
        MetricCounters::bump(&self.metrics.area_queries, 1);
        placement::area_free(&lock(&self.state).entries, self.grid, &rect)
    }

    /// Like [`is_area_free`](Self::is_area_free), ignoring `item`'s own
    /// footprint, i.e. "could `item` be moved to `rect`".
    pub fn is_area_free_excluding(&self, rect: Rect, item: ItemId) -> bool {
        MetricCounters::bump(&self.metrics.area_queries, 1);
        let mut state = lock(&self.state);
        with_excluded(&mut state.entries, item, |entries| {
            placement::area_free(entries, self.grid, &rect)
        })
    }

    /// Whether `item` may ever be stored here, ignoring space.
    ///
    /// Refuses the item that *is* this container; otherwise defers to the
    /// configured filter (no filter: everything is eligible).
    pub fn can_store(&self, item: &Item) -> bool {
        if item.inner_container == Some(self.id) {
            return false;
        }
        self.eligibility
            .as_ref()
            .map_or(true, |filter| filter.allows(item))
    }

    /// Whether some position fits `item`, ignoring eligibility. A stored
    /// item's own footprint counts as free.
    pub fn can_hold(&self, item: &Item) -> bool {
        MetricCounters::bump(&self.metrics.area_queries, 1);
        let mut state = lock(&self.state);
        let grid = self.grid;
        with_excluded(&mut state.entries, item.id, |entries| {
            placement::candidate_origins(grid, item.size)
                .any(|origin| placement::area_free(entries, grid, &item.footprint_at(origin)))
        })
    }

    /// `can_store(item) && can_hold(item)`.
    pub fn can_contain(&self, item: &Item) -> bool {
        self.can_store(item) && self.can_hold(item)
    }

    /// The first stored item (in insertion order) covering `position`.
    pub fn item_at(&self, position: Vec2i) -> Option<Item> {
        self.entry_at(position).map(|e| *e.item())
    }

    /// The first stored entry (in insertion order) covering `position`.
    pub fn entry_at(&self, position: Vec2i) -> Option<StoredEntry> {
        lock(&self.state)
            .entries
            .values()
            .find(|e| e.rect().contains_point(position))
            .copied()
    }

    /// Where `item` is stored, or `None` if it is not here.
    pub fn position_of(&self, item: ItemId) -> Option<Vec2i> {
        lock(&self.state).entries.get(&item).map(|e| e.position())
    }

    // ── Placement ───────────────────────────────────────────────

    /// Store `item` at the first free position in row-major order.
    ///
    /// Returns `true` if the item is stored afterwards (including when it
    /// already was). See [`try_add_item`](Self::try_add_item) for the reason
    /// behind a `false`.
    pub fn add_item(&self, item: &Item) -> bool {
        self.try_add_item(item).is_success()
    }

    /// Store `item` at the first free position, reporting why on failure.
    pub fn try_add_item(&self, item: &Item) -> AddOutcome {
        let eligible = self.can_store(item);
        let grid = self.grid;
        let outcome = self.mutate(|m| {
            if let Some(existing) = m.state.entries.get(&item.id) {
                return AddOutcome::AlreadyPresent {
                    position: existing.position(),
                };
            }
            if !eligible {
                return AddOutcome::EligibilityRejected;
            }
            MetricCounters::bump(&self.metrics.area_queries, 1);
            let Some(position) = placement::first_free(&m.state.entries, grid, item.size) else {
                return AddOutcome::NoSpace;
            };
            self.insert(m, *item, position)
        });
        self.account(item.id, outcome);
        outcome
    }

    /// Store `item` at `position`, or move it there if already stored.
    ///
    /// Returns `false`, leaving the container untouched, if the item is
    /// ineligible (new items only), the target area is out of bounds or
    /// occupied by another item, or another container holds the item.
    pub fn add_item_at(&self, item: &Item, position: Vec2i) -> bool {
        self.try_add_item_at(item, position).is_success()
    }

    /// Positioned add / move, reporting why on failure.
    pub fn try_add_item_at(&self, item: &Item, position: Vec2i) -> AddOutcome {
        let eligible = self.can_store(item);
        let grid = self.grid;
        let outcome = self.mutate(|m| {
            MetricCounters::bump(&self.metrics.area_queries, 1);
            if let Some(index) = m.state.entries.get_index_of(&item.id) {
                let existing = m.state.entries[index];
                if existing.position() == position {
                    return AddOutcome::AlreadyAtPosition;
                }
                let target = existing.rect().at(position);
                let free = with_excluded(&mut m.state.entries, item.id, |entries| {
                    placement::area_free(entries, grid, &target)
                });
                if !free {
                    return AddOutcome::NoSpace;
                }
                let moved = existing.moved_to(position);
                m.state.entries[index] = moved;
                m.record(ChangeKind::Move, index, Some(existing), Some(moved));
                return AddOutcome::Moved {
                    from: existing.position(),
                    to: position,
                };
            }
            if !eligible {
                return AddOutcome::EligibilityRejected;
            }
            if !placement::area_free(&m.state.entries, grid, &item.footprint_at(position)) {
                return AddOutcome::NoSpace;
            }
            self.insert(m, *item, position)
        });
        self.account(item.id, outcome);
        outcome
    }

    /// Remove `item`, clearing its back-reference. No-op if absent.
    pub fn remove_item(&self, item: ItemId) -> Option<StoredEntry> {
        let removed = self.mutate(|m| {
            let (index, _, entry) = m.state.entries.shift_remove_full(&item)?;
            self.lifecycle.release(item, self.id);
            m.record(ChangeKind::Remove, index, Some(entry), None);
            Some(entry)
        });
        if removed.is_some() {
            MetricCounters::bump(&self.metrics.removes, 1);
            trace!(container = %self.id, %item, "item removed");
        }
        removed
    }

    // ── Trusted bulk operations ─────────────────────────────────

    /// Insert (or reposition) a batch of placements without checking
    /// eligibility or free space.
    ///
    /// For rebuilding known-valid state, e.g. from a snapshot: the caller
    /// guarantees the batch is non-overlapping and in bounds. An item that
    /// another container holds is skipped, since storing it twice would
    /// break item ownership. Returns how many placements changed the
    /// container.
    pub fn add_items_unchecked(&self, batch: impl IntoIterator<Item = (Item, Vec2i)>) -> usize {
        let (adds, moves) = self.mutate(|m| {
            let (mut adds, mut moves) = (0u64, 0u64);
            for (item, position) in batch {
                if let Some(index) = m.state.entries.get_index_of(&item.id) {
                    if Self::reposition(m, index, position) {
                        moves += 1;
                    }
                    continue;
                }
                if let Err(holder) = self.lifecycle.claim(item.id, self.id) {
                    warn!(
                        container = %self.id,
                        item = %item.id,
                        %holder,
                        "unchecked add skipped: item held by another container"
                    );
                    continue;
                }
                m.state.entries.insert(item.id, StoredEntry::new(item, position));
                let index = m.state.entries.len() - 1;
                let entry = m.state.entries[index];
                m.record(ChangeKind::Add, index, None, Some(entry));
                adds += 1;
            }
            (adds, moves)
        });
        MetricCounters::bump(&self.metrics.adds, adds);
        MetricCounters::bump(&self.metrics.moves, moves);
        (adds + moves) as usize
    }

    /// Reposition a batch of stored items without checking free space.
    ///
    /// Items that are not stored are skipped. Returns how many entries
    /// moved.
    pub fn move_items_unchecked(&self, batch: impl IntoIterator<Item = (ItemId, Vec2i)>) -> usize {
        let moves = self.mutate(|m| {
            let mut moves = 0u64;
            for (item, position) in batch {
                if let Some(index) = m.state.entries.get_index_of(&item) {
                    if Self::reposition(m, index, position) {
                        moves += 1;
                    }
                }
            }
            moves
        });
        MetricCounters::bump(&self.metrics.moves, moves);
        moves as usize
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Detach every item without destroying it, then clear the container.
    ///
    /// Raises a single reset event rather than one per item. Returns the
    /// number of items detached.
    pub fn dump(&self) -> usize {
        let n = self.clear_with(|lifecycle, id, container| lifecycle.release(id, container));
        MetricCounters::bump(&self.metrics.dumps, 1);
        debug!(container = %self.id, items = n, "container dumped");
        n
    }

    /// Destroy every item, then clear the container.
    ///
    /// Irreversible. Raises a single reset event. Returns the number of
    /// items destroyed.
    pub fn purge(&self) -> usize {
        let n = self.clear_with(|lifecycle, id, _| lifecycle.destroy(id));
        MetricCounters::bump(&self.metrics.purges, 1);
        debug!(container = %self.id, items = n, "container purged");
        n
    }

    // ── Internals ───────────────────────────────────────────────

    /// Run `f` under the state lock, then deliver the events it recorded
    /// once the lock is released.
    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut Mutation<'_>) -> R) -> R {
        let (result, events) = {
            let mut state = lock(&self.state);
            let mut m = Mutation {
                container: self.id,
                state: &mut state,
                events: Pending::new(),
            };
            let result = f(&mut m);
            (result, m.events)
        };
        self.dispatcher.deliver(&events);
        result
    }

    pub(crate) fn lifecycle(&self) -> &dyn ItemLifecycle {
        &*self.lifecycle
    }

    pub(crate) fn counters(&self) -> &MetricCounters {
        &self.metrics
    }

    /// Claim and append a validated placement.
    fn insert(&self, m: &mut Mutation<'_>, item: Item, position: Vec2i) -> AddOutcome {
        if let Err(holder) = self.lifecycle.claim(item.id, self.id) {
            return AddOutcome::HeldElsewhere { holder };
        }
        let entry = StoredEntry::new(item, position);
        m.state.entries.insert(item.id, entry);
        let index = m.state.entries.len() - 1;
        m.record(ChangeKind::Add, index, None, Some(entry));
        AddOutcome::Added { position }
    }

    /// Replace the entry at `index` with one at `position`. `false` if it
    /// was already there.
    fn reposition(m: &mut Mutation<'_>, index: usize, position: Vec2i) -> bool {
        let existing = m.state.entries[index];
        if existing.position() == position {
            return false;
        }
        let moved = existing.moved_to(position);
        m.state.entries[index] = moved;
        m.record(ChangeKind::Move, index, Some(existing), Some(moved));
        true
    }

    /// Apply `each` to every stored item, clear, and raise one reset event.
    pub(crate) fn clear_with(
        &self,
        each: impl Fn(&dyn ItemLifecycle, ItemId, ContainerId),
    ) -> usize {
        self.mutate(|m| {
            let n = m.state.entries.len();
            if n == 0 {
                m.state.last_modified = Instant::now();
                return 0;
            }
            for id in m.state.entries.keys() {
                each(&*self.lifecycle, *id, self.id);
            }
            m.state.entries.clear();
            m.record(ChangeKind::Remove, 0, None, None);
            n
        })
    }

    fn account(&self, item: ItemId, outcome: AddOutcome) {
        let c = &self.metrics;
        match outcome {
            AddOutcome::Added { position } => {
                MetricCounters::bump(&c.adds, 1);
                trace!(container = %self.id, %item, %position, "item added");
            }
            AddOutcome::Moved { from, to } => {
                MetricCounters::bump(&c.moves, 1);
                trace!(container = %self.id, %item, %from, %to, "item moved");
            }
            AddOutcome::AlreadyPresent { .. } | AddOutcome::AlreadyAtPosition => {}
            AddOutcome::EligibilityRejected => {
                MetricCounters::bump(&c.eligibility_rejections, 1);
                debug!(container = %self.id, %item, "add rejected: not eligible");
            }
            AddOutcome::NoSpace => {
                MetricCounters::bump(&c.space_rejections, 1);
                debug!(container = %self.id, %item, "add rejected: no space");
            }
            AddOutcome::HeldElsewhere { holder } => {
                MetricCounters::bump(&c.held_elsewhere_rejections, 1);
                debug!(container = %self.id, %item, %holder, "add rejected: held elsewhere");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ItemRegistry;
    use crate::CategoryFilter;
    use stash_core::{CategoryId, UntrackedItems};
    use std::time::Duration;

    fn container(w: i32, h: i32) -> Container {
        let config = ContainerConfig::new(Vec2i::new(w, h));
        Container::new(config, Arc::new(UntrackedItems)).unwrap()
    }

    fn item(id: u64, w: i32, h: i32) -> Item {
        Item::new(ItemId(id), Vec2i::new(w, h), CategoryId(0))
    }

    fn tracked(w: i32, h: i32) -> (Arc<ItemRegistry>, Container) {
        let reg = Arc::new(ItemRegistry::new());
        let c = Container::new(ContainerConfig::new(Vec2i::new(w, h)), reg.clone()).unwrap();
        (reg, c)
    }

    // ── Construction ────────────────────────────────────────────

    #[test]
    fn invalid_config_is_rejected() {
        let err = Container::new(
            ContainerConfig::new(Vec2i::new(3, -3)),
            Arc::new(UntrackedItems),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NegativeGrid { .. }));
    }

    #[test]
    fn configured_id_is_used() {
        let id = ContainerId::next();
        let c = Container::new(
            ContainerConfig::new(Vec2i::ONE).with_id(id),
            Arc::new(UntrackedItems),
        )
        .unwrap();
        assert_eq!(c.id(), id);
    }

    #[test]
    fn zero_grid_holds_nothing() {
        let c = container(0, 5);
        assert_eq!(c.try_add_item(&item(1, 1, 1)), AddOutcome::NoSpace);
        assert!(c.is_empty());
    }

    // ── add_item ────────────────────────────────────────────────

    #[test]
    fn placement_is_row_major() {
        let c = container(4, 4);
        assert!(c.add_item(&item(1, 1, 1)));
        assert!(c.add_item(&item(2, 1, 1)));
        assert_eq!(c.position_of(ItemId(1)), Some(Vec2i::new(0, 0)));
        assert_eq!(c.position_of(ItemId(2)), Some(Vec2i::new(1, 0)));
    }

    #[test]
    fn wide_item_wraps_to_next_row() {
        let c = container(3, 3);
        c.add_item(&item(1, 2, 1));
        assert_eq!(
            c.try_add_item(&item(2, 2, 1)),
            AddOutcome::Added {
                position: Vec2i::new(0, 1)
            }
        );
        assert_eq!(
            c.try_add_item(&item(3, 1, 1)),
            AddOutcome::Added {
                position: Vec2i::new(2, 0)
            }
        );
    }

    #[test]
    fn add_is_idempotent() {
        let c = container(2, 2);
        let a = item(1, 1, 1);
        assert!(c.add_item(&a));
        let before = (c.entries(), c.revision());
        assert_eq!(
            c.try_add_item(&a),
            AddOutcome::AlreadyPresent {
                position: Vec2i::ZERO
            }
        );
        assert_eq!((c.entries(), c.revision()), before);
    }

    #[test]
    fn full_container_rejects() {
        let c = container(2, 1);
        assert!(c.add_item(&item(1, 2, 1)));
        assert_eq!(c.try_add_item(&item(2, 1, 1)), AddOutcome::NoSpace);
        assert_eq!(c.len(), 1);
        assert_eq!(c.metrics().space_rejections, 1);
    }

    #[test]
    fn oversized_item_rejected() {
        let c = container(2, 2);
        assert!(!c.add_item(&item(1, 3, 1)));
        assert!(!c.add_item(&item(2, 0, 1)));
    }

    #[test]
    fn ineligible_item_rejected() {
        let c = Container::new(
            ContainerConfig::new(Vec2i::new(4, 4))
                .with_eligibility(CategoryFilter::allow([CategoryId(1)])),
            Arc::new(UntrackedItems),
        )
        .unwrap();
        assert_eq!(c.try_add_item(&item(1, 1, 1)), AddOutcome::EligibilityRejected);
        let ok = Item::new(ItemId(2), Vec2i::ONE, CategoryId(1));
        assert!(c.add_item(&ok));
        assert_eq!(c.metrics().eligibility_rejections, 1);
    }

    #[test]
    fn container_cannot_hold_itself() {
        let id = ContainerId::next();
        let c = Container::new(
            ContainerConfig::new(Vec2i::new(4, 4)).with_id(id),
            Arc::new(UntrackedItems),
        )
        .unwrap();
        let bag = item(1, 1, 1).with_inner_container(id);
        assert!(!c.can_store(&bag));
        assert!(c.can_hold(&bag));
        assert!(!c.can_contain(&bag));
        assert_eq!(c.try_add_item(&bag), AddOutcome::EligibilityRejected);
        assert_eq!(c.try_add_item_at(&bag, Vec2i::ZERO), AddOutcome::EligibilityRejected);
        let other_bag = item(2, 1, 1).with_inner_container(ContainerId::next());
        assert!(c.add_item(&other_bag));
    }

    #[test]
    fn remove_then_readd_reuses_space() {
        let c = container(2, 2);
        let a = item(1, 1, 1);
        c.add_item(&a);
        c.add_item(&item(2, 1, 1));
        c.remove_item(a.id);
        let b = item(3, 1, 1);
        assert!(c.add_item(&b));
        assert_eq!(c.position_of(b.id), Some(Vec2i::ZERO));
        let ids: Vec<ItemId> = c.entries().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![ItemId(2), ItemId(3)]);
    }

    // ── add_item_at ─────────────────────────────────────────────

    #[test]
    fn move_to_same_spot_is_noop_success() {
        let c = container(2, 2);
        let a = item(1, 2, 2);
        assert!(c.add_item(&a));
        let rev = c.revision();
        assert_eq!(c.try_add_item_at(&a, Vec2i::ZERO), AddOutcome::AlreadyAtPosition);
        assert_eq!(c.revision(), rev);
        for pos in [Vec2i::new(1, 0), Vec2i::new(0, 1), Vec2i::new(-1, 0), Vec2i::new(1, 1)] {
            assert!(!c.add_item_at(&a, pos));
            assert_eq!(c.position_of(a.id), Some(Vec2i::ZERO));
        }
    }

    #[test]
    fn move_may_overlap_own_footprint() {
        let c = container(3, 1);
        let a = item(1, 2, 1);
        c.add_item(&a);
        assert_eq!(
            c.try_add_item_at(&a, Vec2i::new(1, 0)),
            AddOutcome::Moved {
                from: Vec2i::ZERO,
                to: Vec2i::new(1, 0)
            }
        );
    }

    #[test]
    fn move_onto_other_item_fails() {
        let c = container(3, 1);
        let a = item(1, 1, 1);
        let b = item(2, 1, 1);
        c.add_item(&a);
        c.add_item(&b);
        assert_eq!(c.try_add_item_at(&a, Vec2i::new(1, 0)), AddOutcome::NoSpace);
        assert!(c.add_item_at(&a, Vec2i::new(2, 0)));
        assert_eq!(c.item_at(Vec2i::new(2, 0)).map(|i| i.id), Some(a.id));
    }

    #[test]
    fn move_keeps_sequence_index() {
        let c = container(3, 1);
        c.add_item(&item(1, 1, 1));
        c.add_item(&item(2, 1, 1));
        c.add_item_at(&item(1, 1, 1), Vec2i::new(2, 0));
        let ids: Vec<ItemId> = c.entries().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![ItemId(1), ItemId(2)]);
    }

    #[test]
    fn positioned_add_validates_new_items() {
        let c = container(3, 3);
        c.add_item(&item(1, 2, 2));
        assert_eq!(c.try_add_item_at(&item(2, 1, 1), Vec2i::new(1, 1)), AddOutcome::NoSpace);
        assert_eq!(c.try_add_item_at(&item(2, 2, 1), Vec2i::new(2, 0)), AddOutcome::NoSpace);
        assert_eq!(
            c.try_add_item_at(&item(2, 1, 3), Vec2i::new(2, 0)),
            AddOutcome::Added {
                position: Vec2i::new(2, 0)
            }
        );
        assert_eq!(c.len(), 2);
    }

    // ── Queries ─────────────────────────────────────────────────

    #[test]
    fn area_queries() {
        let c = container(3, 3);
        let a = item(1, 2, 2);
        c.add_item(&a);
        assert!(!c.is_area_free(Rect::from_xywh(1, 1, 2, 2)));
        assert!(c.is_area_free_excluding(Rect::from_xywh(1, 1, 2, 2), a.id));
        assert!(!c.is_area_free_excluding(Rect::from_xywh(2, 2, 2, 2), a.id));
        assert!(c.is_area_free(Rect::from_xywh(2, 0, 1, 3)));
        assert!(c.entries().iter().all(|e| !e.is_excluded()));
    }

    #[test]
    fn can_hold_counts_own_footprint_as_free() {
        let c = container(2, 2);
        let a = item(1, 2, 2);
        c.add_item(&a);
        assert!(c.can_hold(&a));
        assert!(!c.can_hold(&item(2, 1, 1)));
    }

    #[test]
    fn item_at_and_position_of() {
        let c = container(4, 4);
        let a = item(1, 2, 3);
        c.add_item_at(&a, Vec2i::new(1, 1));
        assert_eq!(c.item_at(Vec2i::new(2, 3)), Some(a));
        assert_eq!(c.item_at(Vec2i::new(0, 0)), None);
        assert_eq!(c.position_of(ItemId(99)), None);
        assert_eq!(c.free_cells(), 10);
    }

    // ── Lifecycle collaborator ──────────────────────────────────

    #[test]
    fn back_references_follow_membership() {
        let (reg, c) = tracked(2, 2);
        let a = reg.spawn(Vec2i::ONE, CategoryId(0)).unwrap();
        c.add_item(&a);
        assert_eq!(reg.holder(a.id), Some(c.id()));
        c.remove_item(a.id);
        assert_eq!(reg.holder(a.id), None);
        assert!(c.remove_item(a.id).is_none());
    }

    #[test]
    fn item_in_one_container_at_a_time() {
        let reg = Arc::new(ItemRegistry::new());
        let c1 = Container::new(ContainerConfig::new(Vec2i::new(2, 2)), reg.clone()).unwrap();
        let c2 = Container::new(ContainerConfig::new(Vec2i::new(2, 2)), reg.clone()).unwrap();
        let a = reg.spawn(Vec2i::ONE, CategoryId(0)).unwrap();
        assert!(c1.add_item(&a));
        assert_eq!(
            c2.try_add_item(&a),
            AddOutcome::HeldElsewhere { holder: c1.id() }
        );
        assert!(c2.is_empty());
        c1.remove_item(a.id);
        assert!(c2.add_item(&a));
    }

    #[test]
    fn dump_detaches_without_destroying() {
        let (reg, c) = tracked(3, 3);
        let items: Vec<Item> = (0..3)
            .map(|_| reg.spawn(Vec2i::ONE, CategoryId(0)).unwrap())
            .collect();
        for i in &items {
            c.add_item(i);
        }
        assert_eq!(c.dump(), 3);
        assert!(c.is_empty());
        for i in &items {
            assert!(reg.is_alive(i.id));
            assert_eq!(reg.holder(i.id), None);
        }
    }

    #[test]
    fn purge_destroys_items() {
        let (reg, c) = tracked(3, 3);
        for _ in 0..4 {
            let i = reg.spawn(Vec2i::ONE, CategoryId(0)).unwrap();
            c.add_item(&i);
        }
        assert_eq!(c.purge(), 4);
        assert!(c.is_empty());
        assert!(reg.is_empty());
    }

    #[test]
    fn bulk_clear_raises_one_event() {
        let c = container(3, 3);
        for id in 0..5 {
            c.add_item(&item(id, 1, 1));
        }
        let rx = c.subscribe();
        c.dump();
        assert_eq!(c.observer_count(), 1);
        let events: Vec<ChangeEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_reset());
    }

    // ── Timestamps ──────────────────────────────────────────────

    /// Run `f` after a short pause and report whether `last_modified`
    /// moved strictly forward.
    fn advances(c: &Container, f: impl FnOnce(&Container)) -> bool {
        let before = c.last_modified();
        std::thread::sleep(Duration::from_millis(2));
        f(c);
        c.last_modified() > before
    }

    #[test]
    fn successful_mutations_advance_timestamp() {
        let (reg, c) = tracked(3, 3);
        let a = reg.spawn(Vec2i::ONE, CategoryId(0)).unwrap();
        let b = reg.spawn(Vec2i::ONE, CategoryId(0)).unwrap();
        assert!(advances(&c, |c| assert!(c.add_item(&a))));
        assert!(advances(&c, |c| assert!(c.add_item_at(&b, Vec2i::new(2, 2)))));
        assert!(advances(&c, |c| assert!(c.add_item_at(&a, Vec2i::new(1, 1)))));
        assert!(advances(&c, |c| assert!(c.remove_item(b.id).is_some())));
        assert!(advances(&c, |c| assert_eq!(c.dump(), 1)));
        c.add_item(&a);
        assert!(advances(&c, |c| assert_eq!(c.purge(), 1)));
    }

    #[test]
    fn rejected_and_noop_calls_keep_timestamp() {
        let c = container(2, 2);
        let a = item(1, 2, 2);
        c.add_item(&a);
        assert!(!advances(&c, |c| assert!(!c.add_item(&item(2, 1, 1)))));
        assert!(!advances(&c, |c| assert!(!c.add_item_at(&a, Vec2i::ONE))));
        assert!(!advances(&c, |c| assert!(!c.add_item_at(&item(3, 1, 1), Vec2i::ZERO))));
        assert!(!advances(&c, |c| assert!(c.add_item(&a))));
        assert!(!advances(&c, |c| assert!(c.add_item_at(&a, Vec2i::ZERO))));
        assert!(!advances(&c, |c| assert!(c.remove_item(ItemId(9)).is_none())));
    }

    #[test]
    fn clearing_an_empty_container_touches_timestamp() {
        let c = container(2, 2);
        let rx = c.subscribe();
        assert!(advances(&c, |c| assert_eq!(c.dump(), 0)));
        assert!(rx.try_recv().is_err());
    }

    // ── Notifications ───────────────────────────────────────────

    #[test]
    fn each_mutation_raises_one_event() {
        let c = container(3, 3);
        let rx = c.subscribe();
        let a = item(1, 1, 1);
        c.add_item(&a);
        c.add_item(&a);
        c.add_item_at(&a, Vec2i::new(2, 2));
        c.add_item_at(&a, Vec2i::new(2, 2));
        c.remove_item(a.id);
        c.remove_item(a.id);
        let kinds: Vec<ChangeKind> = rx.try_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Add, ChangeKind::Move, ChangeKind::Remove]);
        assert_eq!(c.revision(), 3);
    }

    #[test]
    fn failed_add_leaves_no_trace() {
        let (reg, c) = tracked(1, 1);
        let rx = c.subscribe();
        let a = reg.spawn(Vec2i::new(2, 1), CategoryId(0)).unwrap();
        let stamp = c.last_modified();
        std::thread::sleep(Duration::from_millis(2));
        assert!(!c.add_item(&a));
        assert!(!c.add_item_at(&a, Vec2i::ZERO));
        assert!(rx.try_recv().is_err());
        assert_eq!(c.revision(), 0);
        assert_eq!(c.last_modified(), stamp);
        assert_eq!(reg.holder(a.id), None);
    }

    #[test]
    fn events_describe_previous_and_current() {
        let c = container(3, 3);
        let a = item(1, 1, 1);
        c.add_item(&a);
        let rx = c.subscribe();
        c.add_item_at(&a, Vec2i::new(1, 1));
        let e = rx.try_recv().unwrap();
        assert_eq!(e.container, c.id());
        assert_eq!(e.previous.map(|p| p.position()), Some(Vec2i::ZERO));
        assert_eq!(e.current.map(|p| p.position()), Some(Vec2i::new(1, 1)));
        assert_eq!(e.index, 0);
    }

    #[test]
    fn observers_may_query_during_delivery() {
        let c = Arc::new(container(2, 2));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (c2, s2) = (Arc::downgrade(&c), Arc::clone(&seen));
        c.observe(move |_| {
            if let Some(c) = c2.upgrade() {
                s2.lock().unwrap().push(c.len());
            }
        });
        c.add_item(&item(1, 1, 1));
        c.add_item(&item(2, 1, 1));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    // ── Unchecked bulk operations ───────────────────────────────

    #[test]
    fn unchecked_add_skips_validation() {
        let c = container(2, 2);
        let n = c.add_items_unchecked([
            (item(1, 1, 1), Vec2i::new(1, 1)),
            (item(2, 1, 1), Vec2i::new(0, 0)),
        ]);
        assert_eq!(n, 2);
        assert_eq!(c.position_of(ItemId(1)), Some(Vec2i::new(1, 1)));
        assert_eq!(c.metrics().adds, 2);
    }

    #[test]
    fn unchecked_add_skips_items_held_elsewhere() {
        let reg = Arc::new(ItemRegistry::new());
        let c1 = Container::new(ContainerConfig::new(Vec2i::new(2, 2)), reg.clone()).unwrap();
        let c2 = Container::new(ContainerConfig::new(Vec2i::new(2, 2)), reg.clone()).unwrap();
        let a = reg.spawn(Vec2i::ONE, CategoryId(0)).unwrap();
        c1.add_item(&a);
        assert_eq!(c2.add_items_unchecked([(a, Vec2i::ZERO)]), 0);
        assert!(c2.is_empty());
    }

    #[test]
    fn unchecked_move_ignores_absent_items() {
        let c = container(3, 3);
        c.add_item(&item(1, 1, 1));
        let rx = c.subscribe();
        let n = c.move_items_unchecked([
            (ItemId(1), Vec2i::new(2, 2)),
            (ItemId(7), Vec2i::new(1, 1)),
            (ItemId(1), Vec2i::new(2, 2)),
        ]);
        assert_eq!(n, 1);
        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(c.position_of(ItemId(1)), Some(Vec2i::new(2, 2)));
    }
}
