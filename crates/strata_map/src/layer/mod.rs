//! Layers: the flat per-scope deltas the store stacks up.
//!
//! A layer records only what changed while it was some instance's top:
//! deliberate writes land in the authored map, read-through cache entries
//! in the memo map. Keeping the two apart means "this key was set here"
//! and "this key's resolution was cached here" stay distinguishable, while
//! reads and compression give authored entries precedence.
//!
//! Layers are shared by reference between a parent and its descendants, so
//! they live behind [`SharedLayer`], a single-threaded `Rc<RefCell<_>>`
//! handle.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::SealedLayerError;
use crate::slot::Slot;

/// One flat key → slot delta.
#[derive(Debug)]
pub(crate) struct Layer<K, V> {
    /// Deliberate writes made while this layer was an instance's top.
    authored: FxHashMap<K, Slot<V>>,
    /// Cached resolutions from lower layers, including negative results
    /// as tombstones. Never consulted before `authored`.
    memo: FxHashMap<K, Slot<V>>,
    sealed: bool,
}

impl<K, V> Layer<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new() -> Self {
        Layer {
            authored: FxHashMap::default(),
            memo: FxHashMap::default(),
            sealed: false,
        }
    }

    /// Build the single replacement layer produced by compression. The
    /// folded slots become authored content; the memo starts empty.
    pub(crate) fn from_folded(folded: FxHashMap<K, Slot<V>>) -> Self {
        Layer {
            authored: folded,
            memo: FxHashMap::default(),
            sealed: false,
        }
    }

    /// Record a deliberate write. Rejected once the layer is sealed.
    #[inline]
    pub(crate) fn write(&mut self, key: K, slot: Slot<V>) -> Result<(), SealedLayerError> {
        if self.sealed {
            return Err(SealedLayerError);
        }
        self.authored.insert(key, slot);
        Ok(())
    }

    /// Drop a key outright. Only correct when no layer lies beneath this
    /// one; otherwise a tombstone must be written instead.
    #[inline]
    pub(crate) fn remove(&mut self, key: &K) -> Result<(), SealedLayerError> {
        if self.sealed {
            return Err(SealedLayerError);
        }
        self.authored.remove(key);
        self.memo.remove(key);
        Ok(())
    }

    /// The slot this layer knows for `key`, authored entries first.
    #[inline]
    pub(crate) fn resolve(&self, key: &K) -> Option<&Slot<V>> {
        self.authored.get(key).or_else(|| self.memo.get(key))
    }

    /// Cache a slot resolved from lower layers. Callers must not memoize
    /// through a sealed layer.
    #[inline]
    pub(crate) fn memoize(&mut self, key: K, slot: Slot<V>) {
        debug_assert!(!self.sealed);
        self.memo.insert(key, slot);
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    #[inline]
    pub(crate) fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Fold this layer's view into an accumulated flat map: memo entries
    /// first so authored writes win, tombstones erase, anything else
    /// overwrites.
    pub(crate) fn fold_into(&self, folded: &mut FxHashMap<K, Slot<V>>) {
        for (key, slot) in self.memo.iter().chain(self.authored.iter()) {
            match slot {
                Slot::Tombstone => {
                    folded.remove(key);
                }
                _ => {
                    folded.insert(key.clone(), slot.clone());
                }
            }
        }
    }

    /// Iterate authored entries. Used for snapshot exports after
    /// compression, when authored content is the whole visible state.
    pub(crate) fn authored_entries(&self) -> impl Iterator<Item = (&K, &Slot<V>)> {
        self.authored.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.authored.len()
    }
}

/// Single-threaded shared handle to a [`Layer`].
///
/// Thin wrapper over `Rc<RefCell<Layer>>`; the factory method keeps layer
/// allocation in one place and makes the non-`Arc` choice explicit. NOT
/// thread-safe, intentionally: stacks branch and drop on one thread.
#[repr(transparent)]
pub(crate) struct SharedLayer<K, V>(Rc<RefCell<Layer<K, V>>>);

impl<K, V> SharedLayer<K, V> {
    pub(crate) fn new(layer: Layer<K, V>) -> Self {
        SharedLayer(Rc::new(RefCell::new(layer)))
    }

    #[inline]
    pub(crate) fn borrow(&self) -> Ref<'_, Layer<K, V>> {
        self.0.borrow()
    }

    #[inline]
    pub(crate) fn borrow_mut(&self) -> RefMut<'_, Layer<K, V>> {
        self.0.borrow_mut()
    }
}

impl<K, V> Clone for SharedLayer<K, V> {
    #[inline]
    fn clone(&self) -> Self {
        SharedLayer(Rc::clone(&self.0))
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for SharedLayer<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedLayer").field(&self.0).finish()
    }
}
