//! Pyramid geometry.
//!
//! The shape of the pyramid is two positive integers: the total layer count
//! and the width of layer 0. Each layer going up shrinks by one slot relative
//! to the layer below, so layer `l` holds indices `0 .. bottom_size - l`.
//! The shape defines which cell ids are valid and which cells in the layer
//! below can structurally support a given cell.

use crate::cell::CellId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Layer count for a freshly created room.
pub const DEFAULT_LAYERS: u32 = 4;
/// Bottom-layer width for a freshly created room.
pub const DEFAULT_BOTTOM_SIZE: u32 = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("layers must be a positive integer, got {0}")]
    InvalidLayers(i64),
    #[error("bottomSize must be a positive integer, got {0}")]
    InvalidBottomSize(i64),
}

/// The pyramid's shape: `layers` rows stacked on a bottom row of
/// `bottom_size` slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PyramidShape {
    pub layers: u32,
    #[serde(rename = "bottomSize")]
    pub bottom_size: u32,
}

impl PyramidShape {
    pub fn new(layers: u32, bottom_size: u32) -> Result<Self, ShapeError> {
        if layers == 0 {
            return Err(ShapeError::InvalidLayers(0));
        }
        if bottom_size == 0 {
            return Err(ShapeError::InvalidBottomSize(0));
        }
        Ok(Self { layers, bottom_size })
    }

    /// Build a shape from untrusted wire integers, rejecting non-positive
    /// and out-of-range values.
    pub fn from_wire(layers: i64, bottom_size: i64) -> Result<Self, ShapeError> {
        let layers_u32 =
            u32::try_from(layers).map_err(|_| ShapeError::InvalidLayers(layers))?;
        let bottom_u32 =
            u32::try_from(bottom_size).map_err(|_| ShapeError::InvalidBottomSize(bottom_size))?;
        if layers_u32 == 0 {
            return Err(ShapeError::InvalidLayers(layers));
        }
        if bottom_u32 == 0 {
            return Err(ShapeError::InvalidBottomSize(bottom_size));
        }
        Ok(Self {
            layers: layers_u32,
            bottom_size: bottom_u32,
        })
    }

    /// Number of valid slots in `layer`. Layers at or above `bottom_size`
    /// have no valid slots (the pyramid has already narrowed to nothing).
    pub fn layer_width(&self, layer: u32) -> u32 {
        self.bottom_size.saturating_sub(layer)
    }

    /// Whether `cell` addresses a valid slot under this shape.
    pub fn contains(&self, cell: CellId) -> bool {
        cell.layer < self.layers && cell.index < self.layer_width(cell.layer)
    }

    /// The cells in the layer directly beneath `cell` that can structurally
    /// support it. A cell at `(layer, index)` straddles `(layer-1, index)`
    /// and `(layer-1, index+1)`; each counts only if that slot exists under
    /// this shape. Layer 0 cells have no supports and need none.
    pub fn supports_below(&self, cell: CellId) -> Vec<CellId> {
        if cell.layer == 0 {
            return Vec::new();
        }
        let below = cell.layer - 1;
        let below_width = self.layer_width(below);
        let mut supports = Vec::with_capacity(2);
        if cell.index < below_width {
            supports.push(CellId::new(below, cell.index));
        }
        if cell.index + 1 < below_width {
            supports.push(CellId::new(below, cell.index + 1));
        }
        supports
    }
}

impl Default for PyramidShape {
    fn default() -> Self {
        Self {
            layers: DEFAULT_LAYERS,
            bottom_size: DEFAULT_BOTTOM_SIZE,
        }
    }
}
