//! Covering of user geometry with S2 cells.
//!
//! The covering algorithm belongs to the S2 library; this module only adapts
//! a ring of `[lng, lat]` vertices to it and exposes the result behind the
//! [`Coverer`] trait so callers can substitute their own implementation.

use crate::config::CoveringOptions;
use crate::error::{CellPackError, Result};
use crate::geometry::{cell_polygon, validate_ring};
use geo::{BoundingRect, Intersects, LineString, Polygon};
use s2::cellid::CellID;
use s2::rect::Rect;
use s2::region::RegionCoverer;

/// Source of cell coverings.
pub trait Coverer {
    /// Cover the area enclosed by `ring`. `Ok(None)` means no covering was
    /// found.
    fn covering(
        &self,
        ring: &LineString<f64>,
        options: &CoveringOptions,
    ) -> Result<Option<Vec<CellID>>>;
}

/// [`Coverer`] backed by the S2 region coverer.
///
/// The ring's bounding rectangle is covered first; cells that do not touch
/// the ring's interior or boundary are then dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct S2Coverer;

impl Coverer for S2Coverer {
    fn covering(
        &self,
        ring: &LineString<f64>,
        options: &CoveringOptions,
    ) -> Result<Option<Vec<CellID>>> {
        options.validate().map_err(CellPackError::Config)?;
        validate_ring(ring)?;

        let polygon = Polygon::new(ring.clone(), vec![]);
        let bounds = match polygon.bounding_rect() {
            Some(bounds) => bounds,
            None => return Ok(None),
        };

        let rect = Rect::from_degrees(
            bounds.min().y,
            bounds.min().x,
            bounds.max().y,
            bounds.max().x,
        );
        let coverer = RegionCoverer {
            min_level: options.min_level,
            max_level: options.max_level,
            level_mod: 1,
            max_cells: options.max_cells,
        };

        let union = coverer.covering(&rect);
        let candidates = union.0.len();
        let cells: Vec<CellID> = union
            .0
            .into_iter()
            .filter(|cell| cell_polygon(*cell).intersects(&polygon))
            .collect();

        log::debug!(
            "covered ring of {} vertices with {} cells ({} candidates)",
            ring.0.len(),
            cells.len(),
            candidates
        );

        if cells.is_empty() {
            return Ok(None);
        }
        Ok(Some(cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(lng: f64, lat: f64, size: f64) -> LineString<f64> {
        LineString::from(vec![
            (lng, lat),
            (lng + size, lat),
            (lng + size, lat + size),
            (lng, lat + size),
            (lng, lat),
        ])
    }

    #[test]
    fn test_covering_respects_budget_and_levels() {
        let options = CoveringOptions::area();
        let cells = S2Coverer
            .covering(&square(-47.89, -15.80, 0.01), &options)
            .unwrap()
            .unwrap();

        assert!(!cells.is_empty());
        assert!(cells.len() <= options.max_cells);
        for cell in &cells {
            assert!(cell.is_valid());
            assert!(cell.level() <= options.max_level as u64);
        }
    }

    #[test]
    fn test_covering_touches_ring() {
        let ring = square(-74.01, 40.70, 0.02);
        let polygon = Polygon::new(ring.clone(), vec![]);
        let cells = S2Coverer
            .covering(&ring, &CoveringOptions::claim())
            .unwrap()
            .unwrap();
        assert!(cells.iter().all(|c| cell_polygon(*c).intersects(&polygon)));
    }

    #[test]
    fn test_covering_rejects_invalid_ring() {
        let ring = LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]);
        assert!(S2Coverer.covering(&ring, &CoveringOptions::area()).is_err());

        let ring = square(179.0, 89.5, 2.0);
        assert!(S2Coverer.covering(&ring, &CoveringOptions::area()).is_err());
    }

    #[test]
    fn test_covering_rejects_invalid_options() {
        let options = CoveringOptions::area().with_max_cells(0);
        let err = S2Coverer
            .covering(&square(10.0, 10.0, 1.0), &options)
            .unwrap_err();
        assert!(matches!(err, CellPackError::Config(_)));
    }
}
