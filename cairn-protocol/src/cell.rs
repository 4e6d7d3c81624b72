//! Cell addressing.
//!
//! A cell is one addressable unit of the pyramid, identified by its layer
//! (0-indexed from the bottom) and its index within that layer. The canonical
//! text form is `"<layer>-<index>"`, e.g. `"2-1"` — this is the form that
//! travels on the wire and the form clients render from.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellIdError {
    #[error("Invalid circle id '{0}': expected '<layer>-<index>' with non-negative integers")]
    Malformed(String),
}

/// One addressable cell of the pyramid.
///
/// Ordering is by `(layer, index)`, which is what makes sorted highlight
/// snapshots deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId {
    pub layer: u32,
    pub index: u32,
}

impl CellId {
    pub fn new(layer: u32, index: u32) -> Self {
        Self { layer, index }
    }

    /// Parse the canonical `"<layer>-<index>"` form.
    pub fn parse(value: &str) -> Result<Self, CellIdError> {
        let malformed = || CellIdError::Malformed(value.to_string());
        let (layer, index) = value.split_once('-').ok_or_else(malformed)?;
        let layer = layer.parse::<u32>().map_err(|_| malformed())?;
        let index = index.parse::<u32>().map_err(|_| malformed())?;
        Ok(Self { layer, index })
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.layer, self.index)
    }
}

impl std::str::FromStr for CellId {
    type Err = CellIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}
