//! The layered store: shared ancestor layers plus one owned top layer.

use std::hash::Hash;
use std::mem;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::error::SealedLayerError;
use crate::layer::{Layer, SharedLayer};
use crate::policy::{Caching, ChildPolicy};
use crate::slot::Slot;

/// A layered associative set/map.
///
/// Contents live in a stack of flat layers. A key's effective value is
/// decided by the first layer, scanning top to bottom, that knows the key;
/// a tombstone there means the key is absent no matter what lower layers
/// hold. Deriving a child shares every existing layer by reference and
/// appends one fresh layer only the child writes, which makes branching a
/// scope as cheap as a handful of `Rc` clones.
///
/// The one layer an instance mutates is its own top layer. Ancestor
/// layers are reachable but never written through — with one documented
/// exception: the *original owner* of a shared layer can keep writing to
/// it (see [`create_child`](Self::create_child)), unless it seals the
/// layer first.
///
/// # Example
///
/// ```
/// use strata_map::StrataMap;
///
/// let mut root = StrataMap::new();
/// root.set("a", 1)?;
///
/// let mut child = root.create_child();
/// child.set("b", 2)?;
/// child.remove(&"a")?;
///
/// assert_eq!(root.get(&"a"), Some(1));
/// assert!(!root.contains(&"b"));
/// assert!(!child.contains(&"a"));
/// assert_eq!(child.get(&"b"), Some(2));
/// # Ok::<(), strata_map::SealedLayerError>(())
/// ```
#[derive(Debug)]
pub struct StrataMap<K, V> {
    /// Ancestor layers, bottom to top. Shared by reference with the
    /// instances they came from; this instance never writes through them.
    shared: SmallVec<[SharedLayer<K, V>; 4]>,
    /// The one layer this instance writes.
    own: SharedLayer<K, V>,
    caching: Caching,
}

impl<K, V> StrataMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Empty root instance with caching enabled.
    #[inline]
    pub fn new() -> Self {
        Self::with_caching(Caching::Enabled)
    }

    /// Empty root instance with an explicit caching policy.
    pub fn with_caching(caching: Caching) -> Self {
        StrataMap {
            shared: SmallVec::new(),
            own: SharedLayer::new(Layer::new()),
            caching,
        }
    }

    /// Number of layers a lookup may consult.
    #[inline]
    pub fn depth(&self) -> usize {
        self.shared.len() + 1
    }

    /// Record `key` as present with no associated value (set-style
    /// membership). Idempotent.
    #[inline]
    pub fn add(&mut self, key: K) -> Result<(), SealedLayerError> {
        self.own.borrow_mut().write(key, Slot::Present)
    }

    /// Bind `key` to `value` in the own layer. The last write wins.
    #[inline]
    pub fn set(&mut self, key: K, value: V) -> Result<(), SealedLayerError> {
        self.own.borrow_mut().write(key, Slot::Bound(value))
    }

    /// Delete `key` from this instance's view.
    ///
    /// With ancestor layers present the deletion is recorded as a
    /// tombstone in the own layer — the data below is not ours to erase.
    /// A root instance owns everything it sees and drops the key
    /// outright.
    pub fn remove(&mut self, key: &K) -> Result<(), SealedLayerError> {
        if self.shared.is_empty() {
            self.own.borrow_mut().remove(key)
        } else {
            self.own.borrow_mut().write(key.clone(), Slot::Tombstone)
        }
    }

    /// Whether `key` is visible (present and not tombstoned) anywhere in
    /// the stack.
    pub fn contains(&self, key: &K) -> bool {
        if let Some(slot) = self.own.borrow().resolve(key) {
            return slot.is_present();
        }
        self.resolve_below(key)
            .is_some_and(|slot| slot.is_present())
    }

    /// The value bound to `key`, if any.
    ///
    /// `None` covers three states the store deliberately does not
    /// distinguish here: key absent, key tombstoned, and key added
    /// set-style without a value. [`contains`](Self::contains) separates
    /// the last case from the first two.
    pub fn get(&self, key: &K) -> Option<V> {
        if let Some(slot) = self.own.borrow().resolve(key) {
            return slot.value().cloned();
        }
        self.resolve_below(key)
            .and_then(|slot| slot.value().cloned())
    }

    /// Scan ancestor layers top to bottom for `key`, memoizing the
    /// resolution into the own layer when the caching policy permits.
    ///
    /// `None` means no ancestor layer knows the key at all; a tombstone
    /// comes back as a real slot so callers can tell "deleted" from
    /// "never seen".
    fn resolve_below(&self, key: &K) -> Option<Slot<V>> {
        if self.shared.is_empty() {
            return None;
        }
        for layer in self.shared.iter().rev() {
            if let Some(slot) = layer.borrow().resolve(key) {
                let slot = slot.clone();
                self.memoize(key, &slot);
                return Some(slot);
            }
        }
        // Complete miss: remember it as a tombstone so repeated lookups
        // of the same key stop walking the stack.
        self.memoize(key, &Slot::Tombstone);
        None
    }

    fn memoize(&self, key: &K, slot: &Slot<V>) {
        if !self.caching.is_enabled() {
            return;
        }
        let mut own = self.own.borrow_mut();
        if own.is_sealed() {
            return;
        }
        own.memoize(key.clone(), slot.clone());
    }

    /// Flatten the whole stack into a single freshly owned layer.
    ///
    /// Folds bottom to top, so upper layers override and tombstones
    /// erase; the result holds only currently-visible keys. This is the
    /// one way to reclaim memory held by tombstones and overrides, and it
    /// caps every later lookup at a single layer.
    pub fn compress(&mut self) {
        let layers = self.depth();
        let mut folded = FxHashMap::default();
        for layer in &self.shared {
            layer.borrow().fold_into(&mut folded);
        }
        self.own.borrow().fold_into(&mut folded);
        let layer = Layer::from_folded(folded);
        tracing::trace!(layers, entries = layer.len(), "compressed layer stack");
        self.own = SharedLayer::new(layer);
        self.shared.clear();
    }

    /// Compress, then snapshot every visible key.
    ///
    /// The snapshot never aliases the internal layer.
    pub fn to_set(&mut self) -> FxHashSet<K> {
        self.compress();
        self.own
            .borrow()
            .authored_entries()
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Compress, then snapshot every visible key with its value.
    ///
    /// Set-style members (added without a value) come back as `None`.
    /// The snapshot never aliases the internal layer.
    pub fn to_map(&mut self) -> FxHashMap<K, Option<V>> {
        self.compress();
        self.own
            .borrow()
            .authored_entries()
            .map(|(key, slot)| (key.clone(), slot.value().cloned()))
            .collect()
    }

    /// Derive a child that sees everything this instance sees, with
    /// caching enabled.
    ///
    /// The child reuses this instance's layers by reference and appends
    /// one empty layer of its own; nothing is copied and this instance is
    /// structurally unaffected. Caveat, pinned by a regression test:
    /// writes this instance keeps making to its current own layer remain
    /// visible to the child, because that layer is shared, not frozen.
    /// Call [`seal`](Self::seal) before deriving to rule that out.
    #[must_use]
    pub fn create_child(&self) -> Self {
        self.create_child_with(ChildPolicy::Cached)
    }

    /// Derive a child under an explicit [`ChildPolicy`].
    #[must_use]
    pub fn create_child_with(&self, policy: ChildPolicy) -> Self {
        let mut shared = self.shared.clone();
        shared.push(self.own.clone());
        let caching = match policy {
            ChildPolicy::Cached => Caching::Enabled,
            ChildPolicy::Uncached | ChildPolicy::DepthLimited(_) => Caching::Disabled,
        };
        let mut child = StrataMap {
            shared,
            own: SharedLayer::new(Layer::new()),
            caching,
        };
        if let ChildPolicy::DepthLimited(limit) = policy {
            if child.depth() > limit {
                tracing::debug!(
                    depth = child.depth(),
                    limit,
                    "child depth exceeds limit; flattening"
                );
                child.compress();
            }
        }
        child
    }

    /// Seal the own layer: every later [`add`](Self::add),
    /// [`set`](Self::set), or [`remove`](Self::remove) against it fails
    /// with [`SealedLayerError`] until a new layer is opened with
    /// [`push_layer`](Self::push_layer). Lookups keep working but stop
    /// memoizing, so a sealed layer's contents never change. Idempotent.
    pub fn seal(&mut self) {
        self.own.borrow_mut().seal();
    }

    /// Whether the own layer is sealed.
    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.own.borrow().is_sealed()
    }

    /// Demote the own layer to the top of the shared prefix and open a
    /// fresh own layer above it.
    pub fn push_layer(&mut self) {
        let previous = mem::replace(&mut self.own, SharedLayer::new(Layer::new()));
        self.shared.push(previous);
    }
}

impl<K, V> Default for StrataMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
