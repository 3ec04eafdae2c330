//! Cell polygons and coordinate validation.

use crate::error::{CellPackError, Result};
use crate::token::parse_tokens;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use s2::cell::Cell;
use s2::cellid::CellID;
use s2::latlng::LatLng;

/// Render a cell as a closed `[lng, lat]` ring `v0, v1, v2, v3, v0`.
pub fn cell_polygon(cell: CellID) -> Polygon<f64> {
    let cell = Cell::from(cell);
    let mut ring: Vec<Coord<f64>> = (0..4)
        .map(|k| {
            let vertex = cell.vertex(k);
            let ll = LatLng::from(&vertex).normalized();
            Coord {
                x: ll.lng.deg(),
                y: ll.lat.deg(),
            }
        })
        .collect();
    ring.push(ring[0]);

    Polygon::new(LineString::from(ring), vec![])
}

/// Render every cell, in input order.
pub fn cells_multi_polygon(cells: &[CellID]) -> MultiPolygon<f64> {
    MultiPolygon::new(cells.iter().copied().map(cell_polygon).collect())
}

/// Render registered tokens for display.
///
/// ```
/// use cellpack::geometry::draw_cells;
///
/// let shapes = draw_cells(["89c259", "89c257"]).unwrap();
/// assert_eq!(shapes.0.len(), 2);
/// ```
pub fn draw_cells<I, S>(tokens: I) -> Result<MultiPolygon<f64>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let cells = parse_tokens(tokens)?;
    Ok(cells_multi_polygon(&cells))
}

/// Validates a `[lng, lat]` coordinate.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use cellpack::geometry::validate_coord;
/// use geo::Coord;
///
/// assert!(validate_coord(&Coord { x: -47.88, y: -15.79 }).is_ok());
/// assert!(validate_coord(&Coord { x: 200.0, y: 40.0 }).is_err());
/// assert!(validate_coord(&Coord { x: -74.0, y: f64::NAN }).is_err());
/// ```
pub fn validate_coord(coord: &Coord<f64>) -> Result<()> {
    let (x, y) = (coord.x, coord.y);

    if !x.is_finite() {
        return Err(CellPackError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            x
        )));
    }

    if !y.is_finite() {
        return Err(CellPackError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            y
        )));
    }

    if !(-180.0..=180.0).contains(&x) {
        return Err(CellPackError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            x
        )));
    }

    if !(-90.0..=90.0).contains(&y) {
        return Err(CellPackError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            y
        )));
    }

    Ok(())
}

/// Validates a loop of coordinates: every vertex in range and at least three
/// distinct vertices.
pub fn validate_ring(ring: &LineString<f64>) -> Result<()> {
    for (idx, coord) in ring.coords().enumerate() {
        validate_coord(coord).map_err(|e| {
            CellPackError::InvalidInput(format!("Ring point at index {}: {}", idx, e))
        })?;
    }

    let mut distinct: Vec<&Coord<f64>> = Vec::new();
    for coord in ring.coords() {
        if !distinct.contains(&coord) {
            distinct.push(coord);
        }
        if distinct.len() >= 3 {
            return Ok(());
        }
    }

    Err(CellPackError::InvalidInput(format!(
        "Ring needs at least 3 distinct vertices, got {}",
        distinct.len()
    )))
}
