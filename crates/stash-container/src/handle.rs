//! Slot + generation table behind [`ItemRegistry`](crate::ItemRegistry).
//!
//! Destroyed items leave their slot with a bumped generation, so a stale
//! [`ItemId`] resolves to `None` instead of aliasing whatever item reuses
//! the slot. Double-remove is a safe no-op.

use stash_core::ItemId;

/// Id encoding: upper 32 bits = slot index, lower 32 bits = generation.
fn encode(slot: u32, generation: u32) -> ItemId {
    ItemId(((slot as u64) << 32) | (generation as u64))
}

fn decode(id: ItemId) -> (u32, u32) {
    ((id.0 >> 32) as u32, id.0 as u32)
}

struct Slot<T> {
    generation: u32,
    data: Option<T>,
}

/// Generational slot table keyed by [`ItemId`], reusing slots via a free list.
pub(crate) struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> HandleTable<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Insert a value built from its own id.
    pub(crate) fn insert_with(&mut self, build: impl FnOnce(ItemId) -> T) -> ItemId {
        self.live += 1;
        if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            let id = encode(slot_idx, slot.generation);
            slot.data = Some(build(id));
            id
        } else {
            let slot_idx = self.slots.len() as u32;
            let id = encode(slot_idx, 0);
            self.slots.push(Slot {
                generation: 0,
                data: Some(build(id)),
            });
            id
        }
    }

    pub(crate) fn get(&self, id: ItemId) -> Option<&T> {
        let (slot_idx, generation) = decode(id);
        let slot = self.slots.get(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.data.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: ItemId) -> Option<&mut T> {
        let (slot_idx, generation) = decode(id);
        let slot = self.slots.get_mut(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.data.as_mut()
    }

    /// Remove the value behind `id`, bumping the slot generation.
    ///
    /// A slot whose generation wraps to 0 is retired rather than recycled,
    /// so ids from its first lifetime can never resolve again.
    pub(crate) fn remove(&mut self, id: ItemId) -> Option<T> {
        let (slot_idx, generation) = decode(id);
        let slot = self.slots.get_mut(slot_idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.data.take()?;
        self.live -= 1;
        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation != 0 {
            self.free_list.push(slot_idx);
        }
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }
}
