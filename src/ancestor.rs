//! Common-ancestor resolution for bounded coverings.
//!
//! A viewport is covered with a handful of cells at mixed levels. Callers want
//! one stable identifier for it, so they can tell whether a previous lookup is
//! still valid, and a quad partition of the area for display.

use crate::geometry::cell_polygon;
use geo::Polygon;
use s2::cellid::CellID;

/// Smallest cell containing a covering, with its four children rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct AncestorCovering {
    pub cell: CellID,
    pub token: String,
    pub level: u64,
    /// Children 0..=3 as closed `[lng, lat]` rings.
    pub quad_tree: [Polygon<f64>; 4],
}

impl AncestorCovering {
    fn from_cell(cell: CellID) -> Self {
        let quad_tree = cell.children().map(cell_polygon);
        Self {
            cell,
            token: cell.to_token(),
            level: cell.level(),
            quad_tree,
        }
    }
}

/// Resolve the common ancestor of `covering` and render its children.
///
/// Returns `None` for an empty covering and for coverings spread over more
/// than one cube face, which have no common ancestor. A single-cell covering
/// resolves to that cell itself, not its parent.
///
/// ```
/// use cellpack::ancestor::resolve_ancestor;
/// use cellpack::token::parse_tokens;
///
/// let covering = parse_tokens(["89c2598ca85", "89c2598ca8f", "89c2598ca91"]).unwrap();
/// let resolved = resolve_ancestor(&covering).unwrap();
/// assert!(covering.iter().all(|c| resolved.cell.contains(c)));
/// assert_eq!(resolved.quad_tree.len(), 4);
/// ```
pub fn resolve_ancestor(covering: &[CellID]) -> Option<AncestorCovering> {
    common_ancestor(covering).map(AncestorCovering::from_cell)
}

/// Smallest cell containing every cell of `covering`.
///
/// The walk starts at the coarsest covering cell (first one on ties) and
/// widens one level at a time until every cell is contained.
pub fn common_ancestor(covering: &[CellID]) -> Option<CellID> {
    let mut coarsest: Option<&CellID> = None;
    for cell in covering {
        if coarsest.is_none_or(|best| cell.level() < best.level()) {
            coarsest = Some(cell);
        }
    }

    let mut candidate = *coarsest?;
    loop {
        if covering.iter().all(|cell| candidate.contains(cell)) {
            log::debug!(
                "resolved {} covering cells to ancestor {} at level {}",
                covering.len(),
                candidate.to_token(),
                candidate.level()
            );
            return Some(candidate);
        }

        if candidate.level() == 0 {
            log::debug!("covering of {} cells spans several faces", covering.len());
            return None;
        }
        candidate = candidate.immediate_parent();
    }
}
