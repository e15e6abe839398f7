//! Typed knobs: memoization policy and child-derivation policy.

/// Whether lookups resolved from ancestor layers are memoized into the
/// instance's own layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Caching {
    /// Memoize resolved slots, including misses, into the own layer.
    #[default]
    Enabled,
    /// Never memoize; every lookup walks the stack.
    Disabled,
}

impl Caching {
    /// Returns `true` if memoization is on.
    #[inline]
    pub fn is_enabled(self) -> bool {
        matches!(self, Caching::Enabled)
    }
}

/// How a child instance is derived from its parent.
///
/// Replaces a runtime-typed "boolean or number" argument with a tagged
/// choice: the depth limit is its own variant instead of a magic number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildPolicy {
    /// Share the parent's stack; caching enabled.
    Cached,
    /// Share the parent's stack; caching disabled.
    Uncached,
    /// Share the parent's stack with caching disabled, and flatten the
    /// child immediately if its stack ends up deeper than the limit.
    /// Bounds lookup cost for chains expected to grow long, at the price
    /// of an eager fold.
    DepthLimited(usize),
}
