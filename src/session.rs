//! Caller-owned state for an interactive claim-drawing session.
//!
//! Tracks each drawn feature while its covering is computed, and the last
//! viewport ancestor so repeated idle events only report real changes.

use crate::ancestor::AncestorCovering;
use crate::claim::{GeocodedClaim, geocode_area};
use crate::config::CoveringOptions;
use crate::covering::Coverer;
use crate::error::Result;
use geo::LineString;
use rustc_hash::FxHashMap;
use serde_json::json;

/// Lifecycle of one drawn feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureState {
    /// Covering requested, not yet available.
    Pending,
    Ready(GeocodedClaim),
}

/// Outcome of an area lookup compared with the previous one.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaUpdate {
    /// Another lookup is in flight; this one was not started.
    Busy,
    /// Same ancestor as last time.
    Unchanged,
    /// New ancestor to display and query.
    Changed(AncestorCovering),
    /// Nothing visible to resolve.
    Cleared,
}

/// Client-side state for one map session: drawn features awaiting or holding
/// their claims, plus the last viewport ancestor and whether a lookup is
/// running.
#[derive(Debug, Default)]
pub struct ClaimSession {
    features: FxHashMap<String, FeatureState>,
    last_area_token: Option<String>,
    area_in_flight: bool,
}

impl ClaimSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a feature as waiting for its covering. Replaces any previous
    /// state for the same id, as an edited polygon supersedes the old one.
    pub fn begin_feature(&mut self, id: impl Into<String>) {
        self.features.insert(id.into(), FeatureState::Pending);
    }

    /// Store a finished covering. Returns `false` when the feature was
    /// removed in the meantime; the result is then discarded.
    pub fn complete_feature(&mut self, id: &str, claim: GeocodedClaim) -> bool {
        match self.features.get_mut(id) {
            Some(state) => {
                *state = FeatureState::Ready(claim);
                true
            }
            None => {
                log::debug!("dropping covering for removed feature {}", id);
                false
            }
        }
    }

    pub fn remove_feature(&mut self, id: &str) -> Option<FeatureState> {
        self.features.remove(id)
    }

    pub fn feature(&self, id: &str) -> Option<&FeatureState> {
        self.features.get(id)
    }

    pub fn pending_count(&self) -> usize {
        self.features
            .values()
            .filter(|state| matches!(state, FeatureState::Pending))
            .count()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// GeoJSON FeatureCollection of every ready claim's cells, ordered by id,
    /// each tagged with an `id` property.
    pub fn feature_collection(&self) -> serde_json::Value {
        let mut ready: Vec<(&String, &GeocodedClaim)> = self
            .features
            .iter()
            .filter_map(|(id, state)| match state {
                FeatureState::Ready(claim) => Some((id, claim)),
                FeatureState::Pending => None,
            })
            .collect();
        ready.sort_by(|a, b| a.0.cmp(b.0));

        let features: Vec<serde_json::Value> = ready
            .into_iter()
            .map(|(id, claim)| {
                json!({
                    "type": "Feature",
                    "properties": { "id": id },
                    "geometry": geojson::Geometry::new(geojson::Value::from(&claim.cell_shapes)),
                })
            })
            .collect();

        json!({
            "type": "FeatureCollection",
            "features": features,
        })
    }

    /// Token of the last resolved viewport ancestor.
    pub fn last_area_token(&self) -> Option<&str> {
        self.last_area_token.as_deref()
    }

    /// Start an area lookup. Returns `false` if one is already in flight.
    pub fn begin_area_lookup(&mut self) -> bool {
        if self.area_in_flight {
            return false;
        }
        self.area_in_flight = true;
        true
    }

    /// Finish an area lookup started with [`begin_area_lookup`].
    ///
    /// [`begin_area_lookup`]: ClaimSession::begin_area_lookup
    pub fn finish_area_lookup(&mut self, result: Option<AncestorCovering>) -> AreaUpdate {
        self.area_in_flight = false;

        match result {
            None => {
                self.last_area_token = None;
                AreaUpdate::Cleared
            }
            Some(area) if self.last_area_token.as_deref() == Some(area.token.as_str()) => {
                AreaUpdate::Unchanged
            }
            Some(area) => {
                log::debug!(
                    "viewport ancestor changed to {} at level {}",
                    area.token,
                    area.level
                );
                self.last_area_token = Some(area.token.clone());
                AreaUpdate::Changed(area)
            }
        }
    }

    /// Cover `ring`, resolve its ancestor and compare with the last one.
    pub fn resolve_area<C: Coverer>(
        &mut self,
        coverer: &C,
        ring: &LineString<f64>,
        options: &CoveringOptions,
    ) -> Result<AreaUpdate> {
        if !self.begin_area_lookup() {
            return Ok(AreaUpdate::Busy);
        }

        match geocode_area(coverer, ring, options) {
            Ok(result) => Ok(self.finish_area_lookup(result)),
            Err(e) => {
                self.area_in_flight = false;
                Err(e)
            }
        }
    }
}
