//! Compact packing of S2 cell sets for land registration, and common-ancestor
//! resolution for viewport lookups.
//!
//! ## Features
//! - **Cell-set packing**: shared ancestor path stored once, bit-exact records per cell
//! - **Lookup keys**: single-cell keys for exact and ancestor probes against a registry
//! - **Ancestor resolution**: smallest cell containing a covering, with its quad partition
//! - **Geocoding**: drawn GeoJSON polygons to S2 coverings via the `s2` region coverer
//!
//! ```rust
//! use cellpack::{decode, encode, encode_one};
//!
//! let packed = encode(["89c2598ca85", "89c2598ca8f", "89c2598ca91", "89c2598ca9b"])?;
//! assert_eq!(packed.to_hex(), "0x2889c2598ca804200470048004d0");
//!
//! let cells = decode(packed.as_bytes())?;
//! assert_eq!(cells[0].to_token(), "89c2598ca85");
//!
//! let key = encode_one("89c2598ca85")?;
//! assert!(key.len() > 2);
//! # Ok::<(), cellpack::CellPackError>(())
//! ```

pub mod ancestor;
pub mod claim;
pub mod config;
pub mod covering;
pub mod error;
pub mod geometry;
pub mod pack;
pub mod session;
pub mod token;

pub use error::{CellPackError, Result};

pub use config::{Config, CoveringOptions};

pub use pack::{
    PackedCells, ancestor_keys, decode, decode_key, encode, encode_cell_key, encode_cells,
    encode_one,
};

pub use ancestor::{AncestorCovering, common_ancestor, resolve_ancestor};

pub use claim::{GeocodedClaim, geocode, geocode_area, geocode_geojson};

pub use covering::{Coverer, S2Coverer};

pub use session::{AreaUpdate, ClaimSession, FeatureState};

pub use s2::cellid::CellID;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{CellPackError, Result};

    pub use crate::{CellID, PackedCells, decode, encode, encode_one};

    pub use crate::{AncestorCovering, resolve_ancestor};

    pub use crate::{Config, Coverer, CoveringOptions, S2Coverer};

    pub use crate::{ClaimSession, GeocodedClaim, geocode, geocode_area};
}
