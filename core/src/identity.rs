//! Stable identities for state and render nodes, and the store that maps state identities to
//! their values.

use core::any::Any;
use std::collections::HashMap;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[repr(C)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32, u16, u16, [u8; 8]);

        impl $name {
            /// Allocates a fresh identifier. Never returns the same value twice.
            pub fn new() -> $name {
                let uuid = Uuid::new_v4();
                let (a, b, c, d) = uuid.as_fields();
                $name(a, b, c, *d)
            }
        }

        impl Default for $name {
            fn default() -> $name {
                $name::new()
            }
        }
    };
}

uuid_id! {
    /// A unique identifier for a piece of state.
    ///
    /// (this is just a UUID)
    StateId
}

uuid_id! {
    /// A unique identifier for a materialized render node.
    NodeId
}

/// A value slot in the identity store.
struct Slot {
    value: Box<dyn Any + Send>,
    /// Set on write; cleared once the redraw that observes the write has run.
    dirty: bool,
}

/// Maps state identities to their current values.
///
/// Slots are created lazily on first read or write and released when the render node owning
/// them is destroyed.
#[derive(Default)]
pub struct IdentityStore {
    slots: HashMap<StateId, Slot>,
}

impl IdentityStore {
    pub fn new() -> IdentityStore {
        IdentityStore::default()
    }

    /// Returns a clone of the stored value.
    ///
    /// Returns `None` if the slot was never initialized or holds a value of another type.
    pub fn get<T: Any + Clone>(&self, id: StateId) -> Option<T> {
        self.slots
            .get(&id)
            .and_then(|slot| slot.value.downcast_ref::<T>())
            .cloned()
    }

    /// Calls `f` with a reference to the stored value, if it exists and has type `T`.
    pub fn with<T: Any, R>(&self, id: StateId, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.slots
            .get(&id)
            .and_then(|slot| slot.value.downcast_ref::<T>())
            .map(f)
    }

    /// Returns true if a value is stored under this id.
    pub fn contains(&self, id: StateId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Stores a value. Does not mark the slot dirty.
    pub fn set<T: Any + Send>(&mut self, id: StateId, value: T) {
        self.set_boxed(id, Box::new(value));
    }

    /// Stores an already type-erased value. Does not mark the slot dirty.
    pub fn set_boxed(&mut self, id: StateId, value: Box<dyn Any + Send>) {
        match self.slots.get_mut(&id) {
            Some(slot) => slot.value = value,
            None => {
                self.slots.insert(id, Slot { value, dirty: false });
            }
        }
    }

    /// Stores a value only if the slot is still empty; returns the value now in the slot.
    pub(crate) fn init<T: Any + Clone + Send>(&mut self, id: StateId, value: T) -> T {
        if let Some(existing) = self.get::<T>(id) {
            return existing;
        }
        self.set(id, value.clone());
        value
    }

    /// Marks a slot dirty. A no-op for ids that have no slot.
    pub fn mark_dirty(&mut self, id: StateId) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.dirty = true;
        }
    }

    pub fn clear_dirty(&mut self, id: StateId) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.dirty = false;
        }
    }

    pub fn is_dirty(&self, id: StateId) -> bool {
        self.slots.get(&id).map_or(false, |slot| slot.dirty)
    }

    /// Returns true if any of the given ids is dirty.
    pub fn any_dirty<'a>(&self, ids: impl IntoIterator<Item = &'a StateId>) -> bool {
        ids.into_iter().any(|id| self.is_dirty(*id))
    }

    /// Clears every dirty flag and returns the ids that were dirty.
    pub fn take_dirty(&mut self) -> Vec<StateId> {
        let mut ids = Vec::new();
        for (id, slot) in &mut self.slots {
            if slot.dirty {
                slot.dirty = false;
                ids.push(*id);
            }
        }
        ids
    }

    /// Moves the slot of `old` to `new`, so a cell recreated with a fresh identity keeps the
    /// value of the cell it replaces.
    ///
    /// A no-op if `old` has no slot or both ids are equal.
    pub fn retarget(&mut self, old: StateId, new: StateId) {
        if old == new {
            return;
        }
        if let Some(slot) = self.slots.remove(&old) {
            self.slots.insert(new, slot);
        }
    }

    /// Destroys a slot.
    pub fn release(&mut self, id: StateId) {
        self.slots.remove(&id);
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = StateId::new();
        let b = StateId::new();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(NodeId::new(), NodeId::new());
    }

    #[test]
    fn uninitialized_and_mismatched_reads_are_none() {
        let mut store = IdentityStore::new();
        let id = StateId::new();
        assert_eq!(store.get::<i32>(id), None);

        store.set(id, 5_i32);
        assert_eq!(store.get::<i32>(id), Some(5));
        assert_eq!(store.get::<String>(id), None, "wrong type should not be returned");
    }

    #[test]
    fn set_does_not_dirty() {
        let mut store = IdentityStore::new();
        let id = StateId::new();
        store.set(id, "a");
        assert!(!store.is_dirty(id));
        store.mark_dirty(id);
        assert!(store.is_dirty(id));
        store.clear_dirty(id);
        assert!(!store.is_dirty(id));
    }

    #[test]
    fn dirtying_unknown_ids_is_a_no_op() {
        let mut store = IdentityStore::new();
        let id = StateId::new();
        store.mark_dirty(id);
        assert!(!store.is_dirty(id));
        assert!(store.is_empty());
    }

    #[test]
    fn take_dirty_clears_flags() {
        let mut store = IdentityStore::new();
        let a = StateId::new();
        let b = StateId::new();
        store.set(a, 1_u8);
        store.set(b, 2_u8);
        store.mark_dirty(b);

        assert_eq!(store.take_dirty(), vec![b]);
        assert!(!store.is_dirty(b));
        assert!(store.take_dirty().is_empty());
    }

    #[test]
    fn retarget_moves_value_and_flags() {
        let mut store = IdentityStore::new();
        let old = StateId::new();
        let new = StateId::new();
        store.set(old, String::from("kept"));
        store.mark_dirty(old);
        store.set(new, String::from("fresh"));

        store.retarget(old, new);
        assert_eq!(store.get::<String>(new).as_deref(), Some("kept"));
        assert!(store.is_dirty(new));
        assert!(!store.contains(old));
        assert_eq!(store.len(), 1);

        // moving a missing slot leaves the target alone
        let other = StateId::new();
        store.retarget(other, new);
        assert_eq!(store.get::<String>(new).as_deref(), Some("kept"));
    }

    #[test]
    fn init_keeps_first_value() {
        let mut store = IdentityStore::new();
        let id = StateId::new();
        assert_eq!(store.init(id, 1_u32), 1);
        assert_eq!(store.init(id, 2_u32), 1);
    }
}
