//! Layered associative store with copy-on-branch scope derivation.
//!
//! A [`StrataMap`] organizes its contents as a stack of flat layers. Each
//! layer records only the changes made relative to the layers beneath it:
//! additions, overwrites, and deletions (as tombstones). Deriving a child
//! reuses the parent's layers by reference and appends one new layer that
//! the child alone writes, so a large shared base can back many
//! short-lived scopes without ever being copied.
//!
//! # Architecture
//!
//! - `Layer`: one flat key → slot delta, split into authored writes and
//!   memoized lookups, with an optional seal.
//! - [`StrataMap`]: the instance — shared ancestor layers plus one owned
//!   top layer and a [`Caching`] policy.
//! - Lookups scan top to bottom and, with [`Caching::Enabled`], memoize
//!   what they resolve into the top layer; tombstones double as negative
//!   cache entries.
//! - [`StrataMap::compress`] folds the whole stack back into a single
//!   owned layer, discarding masked history.
//!
//! Single-threaded by design: layers are shared with `Rc`, not `Arc`.

mod error;
mod layer;
mod map;
mod policy;
mod slot;

pub use error::SealedLayerError;
pub use map::StrataMap;
pub use policy::{Caching, ChildPolicy};
