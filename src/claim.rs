//! Geocoding of drawn polygons into registrable cell sets.
//!
//! ```rust
//! use cellpack::claim::geocode;
//! use cellpack::covering::S2Coverer;
//! use cellpack::CoveringOptions;
//! use geo::polygon;
//!
//! let poly = polygon![
//!     (x: -47.890, y: -15.800),
//!     (x: -47.880, y: -15.800),
//!     (x: -47.880, y: -15.790),
//!     (x: -47.890, y: -15.790),
//! ];
//! let claim = geocode(&S2Coverer, &poly, &CoveringOptions::claim())?.unwrap();
//! let packed = claim.pack()?;
//! assert_eq!(packed.cells()?.len(), claim.tokens.len());
//! # Ok::<(), cellpack::CellPackError>(())
//! ```

use crate::ancestor::{AncestorCovering, resolve_ancestor};
use crate::config::CoveringOptions;
use crate::covering::Coverer;
use crate::error::{CellPackError, Result};
use crate::geometry::cells_multi_polygon;
use crate::pack::{PackedCells, encode_cells};
use geo::{Centroid, Coord, LineString, MultiPolygon, Point, Polygon};
use s2::cellid::CellID;
use serde_json::json;

/// Cells covering one drawn polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedClaim {
    pub cells: Vec<CellID>,
    pub tokens: Vec<String>,
    /// Outline of every covering cell.
    pub cell_shapes: MultiPolygon<f64>,
    /// The polygon as drawn.
    pub poly: Polygon<f64>,
    /// Centroid of the polygon's closed exterior ring.
    pub centroid: Point<f64>,
}

impl GeocodedClaim {
    /// Pack the claim's cells for registration.
    pub fn pack(&self) -> Result<PackedCells> {
        encode_cells(self.cells.iter().copied())
    }

    /// Vertex count of the drawn loop, excluding the closing vertex.
    pub fn vertex_count(&self) -> usize {
        self.poly.exterior().0.len().saturating_sub(1)
    }

    /// JSON document with GeoJSON geometries:
    /// `{tokens, cells, poly, lat, lng}`.
    pub fn to_json(&self) -> serde_json::Value {
        let cells = geojson::Geometry::new(geojson::Value::from(&self.cell_shapes));
        let poly = geojson::Geometry::new(geojson::Value::from(&self.poly));
        json!({
            "tokens": self.tokens,
            "cells": cells,
            "poly": poly,
            "lat": self.centroid.y(),
            "lng": self.centroid.x(),
        })
    }
}

/// Cover a drawn polygon and collect everything needed to register it.
///
/// The exterior ring is read as a loop; its first vertex, which GeoJSON
/// repeats at the end, is skipped. Interior rings are ignored.
pub fn geocode<C: Coverer>(
    coverer: &C,
    polygon: &Polygon<f64>,
    options: &CoveringOptions,
) -> Result<Option<GeocodedClaim>> {
    let ring = polygon.exterior();
    let loop_coords: Vec<Coord<f64>> = ring.0.iter().skip(1).copied().collect();
    let loop_ring = LineString::from(loop_coords);

    let cells = match coverer.covering(&loop_ring, options)? {
        Some(cells) => cells,
        None => {
            log::debug!("no covering for polygon of {} vertices", ring.0.len());
            return Ok(None);
        }
    };

    let centroid = ring.centroid().ok_or_else(|| {
        CellPackError::InvalidInput("polygon loop has no centroid".to_string())
    })?;

    Ok(Some(GeocodedClaim {
        tokens: cells.iter().map(|c| c.to_token()).collect(),
        cell_shapes: cells_multi_polygon(&cells),
        cells,
        poly: polygon.clone(),
        centroid,
    }))
}

/// [`geocode`] from a GeoJSON geometry. Anything but a `Polygon` is rejected.
pub fn geocode_geojson<C: Coverer>(
    coverer: &C,
    geometry_json: &str,
    options: &CoveringOptions,
) -> Result<Option<GeocodedClaim>> {
    let polygon = polygon_from_geojson(geometry_json)?;
    geocode(coverer, &polygon, options)
}

/// Parse a GeoJSON `Polygon` geometry.
pub fn polygon_from_geojson(geometry_json: &str) -> Result<Polygon<f64>> {
    let raw: serde_json::Value = serde_json::from_str(geometry_json)?;
    let kind = raw["type"].as_str().unwrap_or("<missing>");
    if kind != "Polygon" {
        return Err(CellPackError::InvalidGeometry(format!(
            "geometry must be a GeoJSON Polygon, got {}",
            kind
        )));
    }

    let geometry: geojson::Geometry = serde_json::from_value(raw)?;
    let rings = match geometry.value {
        geojson::Value::Polygon(rings) => rings,
        _ => {
            return Err(CellPackError::InvalidGeometry(
                "geometry must be a GeoJSON Polygon".to_string(),
            ));
        }
    };

    let mut rings = rings.into_iter().map(|ring| {
        ring.into_iter()
            .map(|position| match position.as_slice() {
                [x, y, ..] => Ok(Coord { x: *x, y: *y }),
                _ => Err(CellPackError::InvalidGeometry(format!(
                    "position needs two coordinates, got {}",
                    position.len()
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(LineString::from)
    });

    let exterior = rings
        .next()
        .ok_or_else(|| CellPackError::InvalidGeometry("polygon has no rings".to_string()))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Cover a viewport loop with a small budget and resolve its common ancestor.
pub fn geocode_area<C: Coverer>(
    coverer: &C,
    ring: &LineString<f64>,
    options: &CoveringOptions,
) -> Result<Option<AncestorCovering>> {
    Ok(coverer
        .covering(ring, options)?
        .and_then(|cells| resolve_ancestor(&cells)))
}
