//! Dependency rule engine.
//!
//! Pure decision functions over an explicit snapshot of the highlight set.
//! Nothing here does I/O or touches shared state; callers are expected to
//! capture the snapshot under the room's mutation guard so the decision is
//! made against a consistent view.
//!
//! The deselection check is deliberately one-level: each higher highlighted
//! cell is tested against its own direct supports in the reduced set, with
//! no cascade simulation of what removing a blocker would in turn unblock.

use crate::cell::CellId;
use crate::pyramid::PyramidShape;
use std::collections::BTreeSet;

/// Outcome of a selection check: whether the cell may be highlighted, and a
/// human-readable reason either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectDecision {
    pub allowed: bool,
    pub reason: String,
}

/// Outcome of a deselection check. `blockers` holds every currently
/// highlighted cell in a higher layer whose sole remaining support is the
/// candidate, ordered by `(layer, index)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeselectDecision {
    pub allowed: bool,
    pub blockers: Vec<CellId>,
}

impl DeselectDecision {
    /// Human-readable rejection reason naming every blocker.
    pub fn reason(&self) -> String {
        format!("would orphan {}", join_cells(&self.blockers))
    }
}

fn join_cells(cells: &[CellId]) -> String {
    cells
        .iter()
        .map(CellId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// May `cell` be added to the highlight set?
///
/// Bottom-layer cells are always eligible. Any other cell needs at least one
/// of its adjacent-below supports already highlighted in `snapshot`.
pub fn can_select(
    shape: &PyramidShape,
    snapshot: &BTreeSet<CellId>,
    cell: CellId,
) -> SelectDecision {
    if cell.layer == 0 {
        return SelectDecision {
            allowed: true,
            reason: "bottom layer".to_string(),
        };
    }

    if !shape.contains(cell) {
        return SelectDecision {
            allowed: false,
            reason: format!("{cell} is outside the current pyramid"),
        };
    }

    let supports = shape.supports_below(cell);
    let present: Vec<CellId> = supports
        .iter()
        .copied()
        .filter(|s| snapshot.contains(s))
        .collect();

    if present.is_empty() {
        SelectDecision {
            allowed: false,
            reason: format!("requires one of {} to be highlighted", join_cells(&supports)),
        }
    } else {
        SelectDecision {
            allowed: true,
            reason: format!("supported by {}", join_cells(&present)),
        }
    }
}

/// May `cell` be removed from the highlight set?
///
/// For every other highlighted cell in a strictly higher layer, re-evaluate
/// its direct adjacency-below support against the snapshot with `cell`
/// removed; any such cell left with zero support is a blocker. The
/// simulation is a pure what-if — the snapshot itself is never mutated, so
/// no reader can observe an intermediate state.
pub fn can_deselect(
    shape: &PyramidShape,
    snapshot: &BTreeSet<CellId>,
    cell: CellId,
) -> DeselectDecision {
    let blockers: Vec<CellId> = snapshot
        .iter()
        .copied()
        .filter(|h| h.layer > cell.layer)
        .filter(|h| {
            !shape
                .supports_below(*h)
                .iter()
                .any(|s| *s != cell && snapshot.contains(s))
        })
        .collect();

    DeselectDecision {
        allowed: blockers.is_empty(),
        blockers,
    }
}
