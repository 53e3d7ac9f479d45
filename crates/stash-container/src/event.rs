//! Change notification: [`ChangeEvent`] and observer fan-out.
//!
//! Each structural mutation of a container produces exactly one event,
//! delivered synchronously before the mutating call returns. The one
//! exception is a bulk clear (`dump`/`purge`), which produces a single
//! reset event for the whole sequence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender};
use stash_core::ContainerId;

use crate::entry::StoredEntry;

/// What a [`ChangeEvent`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// An item became present.
    Add,
    /// A present item changed position (explicit move or replicated set).
    Move,
    /// An item is no longer present, or the whole sequence was cleared.
    Remove,
}

/// One structural change to a container's entry sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The container that changed.
    pub container: ContainerId,
    /// Per-container revision after this change. Consecutive events from
    /// one container have consecutive revisions.
    pub revision: u64,
    /// Kind of change.
    pub kind: ChangeKind,
    /// Index in the ordered sequence that changed: where an added entry
    /// now sits, or where a moved / removed entry sat. `0` for a reset.
    pub index: usize,
    /// The entry before the change (`None` for adds and resets).
    pub previous: Option<StoredEntry>,
    /// The entry after the change (`None` for removals and resets).
    pub current: Option<StoredEntry>,
}

impl ChangeEvent {
    /// `true` for the single event raised by a bulk clear.
    pub fn is_reset(&self) -> bool {
        self.kind == ChangeKind::Remove && self.previous.is_none() && self.current.is_none()
    }
}

/// Handle returned by [`Container::observe`](crate::Container::observe).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Clone)]
enum Sink {
    Callback(Callback),
    Channel(Sender<ChangeEvent>),
}

/// Registered observers.
///
/// Delivery happens after the container has released its state lock, so
/// callbacks may query or even mutate the container. Events from
/// concurrent mutations can therefore arrive out of revision order;
/// consumers that need order (see [`EntryMirror`](crate::EntryMirror))
/// sequence them by [`ChangeEvent::revision`].
pub(crate) struct Dispatcher {
    sinks: Mutex<Vec<(ObserverId, Sink)>>,
    next_id: AtomicU64,
}

impl Dispatcher {
    pub(crate) fn new() -> Self {
        Self {
            sinks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    fn register(&self, sink: Sink) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.sinks).push((id, sink));
        id
    }

    pub(crate) fn observe(&self, callback: Callback) -> ObserverId {
        self.register(Sink::Callback(callback))
    }

    pub(crate) fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.register(Sink::Channel(tx));
        rx
    }

    pub(crate) fn unobserve(&self, id: ObserverId) -> bool {
        let mut sinks = lock(&self.sinks);
        let before = sinks.len();
        sinks.retain(|(sid, _)| *sid != id);
        sinks.len() != before
    }

    pub(crate) fn observer_count(&self) -> usize {
        lock(&self.sinks).len()
    }

    /// Deliver `events` to every sink, in slice order.
    pub(crate) fn deliver(&self, events: &[ChangeEvent]) {
        if events.is_empty() {
            return;
        }
        let sinks: Vec<(ObserverId, Sink)> = lock(&self.sinks).clone();
        if sinks.is_empty() {
            return;
        }
        let mut disconnected = Vec::new();
        for event in events {
            for (id, sink) in &sinks {
                match sink {
                    Sink::Callback(cb) => cb(event),
                    Sink::Channel(tx) => {
                        if tx.send(event.clone()).is_err() && !disconnected.contains(id) {
                            disconnected.push(*id);
                        }
                    }
                }
            }
        }
        if !disconnected.is_empty() {
            lock(&self.sinks).retain(|(id, _)| !disconnected.contains(id));
        }
    }
}

/// Lock a mutex, recovering the data from a poisoned lock.
///
/// Observers run outside the lock and the exclusion flag is restored on
/// unwind, so a poisoned container lock still guards consistent state.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
