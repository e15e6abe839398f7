//! Per-key slot records stored inside a layer.

/// What a layer knows about one key.
///
/// `Present` unifies set-style membership with map-style storage: the key
/// is there, it just carries no value (`get` reports `None` while
/// `contains` reports `true`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Slot<V> {
    /// Key present with an associated value.
    Bound(V),
    /// Key present with no associated value (set-style membership).
    Present,
    /// Key deleted at this layer; masks every layer below.
    Tombstone,
}

impl<V> Slot<V> {
    /// Returns `true` unless this slot is a deletion mask.
    #[inline]
    pub(crate) fn is_present(&self) -> bool {
        !matches!(self, Slot::Tombstone)
    }

    /// The stored value, if the slot carries one.
    #[inline]
    pub(crate) fn value(&self) -> Option<&V> {
        match self {
            Slot::Bound(value) => Some(value),
            Slot::Present | Slot::Tombstone => None,
        }
    }
}
