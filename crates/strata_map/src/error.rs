//! Errors surfaced by the store.

use std::error::Error;
use std::fmt;

/// Returned when an authored write targets a sealed own layer.
///
/// Sealing is opt-in; an instance that never calls
/// [`seal`](crate::StrataMap::seal) never sees this error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SealedLayerError;

impl fmt::Display for SealedLayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("layer is sealed; push a new layer or derive a child before writing")
    }
}

impl Error for SealedLayerError {}
