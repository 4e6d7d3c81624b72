//! # Cairn Protocol SDK
//!
//! **The shared language of a cairn room: pyramid geometry, dependency
//! rules, and wire messages.**
//!
//! A cairn room synchronizes one fact across every connected client — the
//! set of highlighted cells in a layered pyramid. This crate holds
//! everything both sides of the wire must agree on, with no I/O and no
//! shared state, so a server, a bot, or a test harness can all reason about
//! the same rules.
//!
//! ## Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cell`] | Cell addressing: `(layer, index)` pairs and the `"L-I"` text form |
//! | [`pyramid`] | Shape, per-layer widths, and the adjacency-below relation |
//! | [`rules`] | Pure select/deselect decisions over a highlight snapshot |
//! | [`messages`] | Tagged JSON wire messages, inbound and outbound |

// ── Public modules ──────────────────────────────────────────────────────────

/// Cell addressing: `(layer, index)` pairs and their canonical text form.
pub mod cell;

/// Tagged JSON wire messages, inbound and outbound.
pub mod messages;

/// Pyramid shape, layer widths, and adjacency.
pub mod pyramid;

/// Pure dependency-rule decisions over highlight snapshots.
pub mod rules;

// ── Re-exports for convenience ──────────────────────────────────────────────

pub use cell::{CellId, CellIdError};
pub use messages::{ClientMessage, DecodeError, ServerMessage};
pub use pyramid::{PyramidShape, ShapeError, DEFAULT_BOTTOM_SIZE, DEFAULT_LAYERS};
pub use rules::{can_deselect, can_select, DeselectDecision, SelectDecision};

// ── Library metadata ────────────────────────────────────────────────────────

/// Cairn protocol SDK version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the SDK version string.
pub fn version() -> &'static str {
    VERSION
}

// ── Tests ───────────────────────────────────────────────────────────────────
