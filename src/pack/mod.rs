//! Compact packing of S2 cell sets.
//!
//! Cells from one land claim sit close together and share a long ancestor
//! path. The packed form stores that shared path once, followed by one
//! length-prefixed record per cell holding only the bits below it.
//!
//! ```text
//! byte    prefix_len        0, or 1 + matched bits (3, 5, .., 63)
//! bits    prefix            top prefix_len bits of the smallest cell
//! repeat per cell, ascending:
//!   byte  cell_len          0..=64
//!   bits  cell              remainder with trailing zero pairs and sentinel removed
//! ```
//!
//! Bit fields are MSB-first and padded to whole bytes with zero low bits.
//!
//! ```rust
//! use cellpack::pack::{decode, encode};
//!
//! let packed = encode(["89c2598ca85", "89c2598ca8f", "89c2598ca91", "89c2598ca9b"])?;
//! assert_eq!(packed.prefix_len(), Some(40));
//! assert_eq!(decode(packed.as_bytes())?.len(), 4);
//! # Ok::<(), cellpack::CellPackError>(())
//! ```

mod bits;
mod decode;

pub use decode::{decode, decode_key};

use crate::error::{CellPackError, Result};
use crate::token::{FACE_BITS, parse_token, parse_token_at, validate_cell};
use bits::put_field;
use bytes::{Bytes, BytesMut};
use s2::cellid::CellID;
use serde::{Serialize, Serializer};
use std::fmt;

/// Width of the remainder window before the shared prefix is removed. One
/// bit wider than the identifier so the `p = 0` case needs no special path.
pub(crate) const REMAINDER_WIDTH: u32 = 65;

const FACE_SHIFT: u32 = 64 - FACE_BITS;

/// A packed cell set.
///
/// An empty set packs to an empty byte string: there is nothing to register.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct PackedCells(Bytes);

impl PackedCells {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Header prefix length, or `None` for an empty set.
    pub fn prefix_len(&self) -> Option<u8> {
        self.0.first().copied()
    }

    /// Lowercase hex with a leading `0x`, the form stored by the registry.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Decode back to the sorted, deduplicated cells.
    pub fn cells(&self) -> Result<Vec<CellID>> {
        decode(&self.0)
    }
}

impl fmt::Debug for PackedCells {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PackedCells").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for PackedCells {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for PackedCells {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for PackedCells {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Pack a set of cell tokens.
///
/// Tokens are validated first; the error names the offending token and its
/// position. Order and duplicates in the input do not affect the output.
pub fn encode<I, S>(tokens: I) -> Result<PackedCells>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let cells = tokens
        .into_iter()
        .enumerate()
        .map(|(position, token)| parse_token_at(token.as_ref(), position))
        .collect::<Result<Vec<_>>>()?;
    Ok(pack_sorted(sorted_unique(cells)))
}

/// Pack a set of cell identifiers.
pub fn encode_cells<I>(cells: I) -> Result<PackedCells>
where
    I: IntoIterator<Item = CellID>,
{
    let cells = cells
        .into_iter()
        .enumerate()
        .map(|(position, cell)| {
            validate_cell(cell).map(|_| cell).map_err(|reason| {
                CellPackError::invalid_token(format!("{:016x}", cell.0), position, reason)
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(pack_sorted(sorted_unique(cells)))
}

/// Pack one token as a registry lookup key: a single cell record with no
/// header.
///
/// ```rust
/// use cellpack::pack::encode_one;
///
/// let key = encode_one("89c2598ca85")?;
/// assert_eq!(key[0], 44);
/// assert_eq!(key.len(), 7);
/// # Ok::<(), cellpack::CellPackError>(())
/// ```
pub fn encode_one(token: &str) -> Result<Bytes> {
    Ok(encode_cell_key(parse_token(token)?))
}

/// Pack one already-validated identifier as a lookup key.
pub fn encode_cell_key(cell: CellID) -> Bytes {
    let mut buf = BytesMut::with_capacity(9);
    put_record(&mut buf, cell.0, 0);
    buf.freeze()
}

/// Lookup keys for the cell and each of its ancestors, finest first.
///
/// Probing the registry with every key answers "what is registered at or
/// above this cell".
pub fn ancestor_keys(token: &str) -> Result<Vec<Bytes>> {
    let cell = parse_token(token)?;
    Ok((0..=cell.level())
        .rev()
        .map(|level| encode_cell_key(cell.parent(level)))
        .collect())
}

fn sorted_unique(cells: Vec<CellID>) -> Vec<u64> {
    let mut values: Vec<u64> = cells.into_iter().map(|c| c.0).collect();
    values.sort_unstable();
    values.dedup();
    values
}

fn pack_sorted(values: Vec<u64>) -> PackedCells {
    if values.is_empty() {
        return PackedCells::default();
    }

    let matched = shared_prefix_bits(&values);
    let prefix_len = if matched > 0 { matched + 1 } else { 0 };

    let mut buf = BytesMut::with_capacity(2 + values.len() * 4);
    put_field(&mut buf, prefix_len as u64, 8);
    if prefix_len > 0 {
        put_field(&mut buf, values[0] >> (64 - prefix_len), prefix_len);
    }

    for &value in &values {
        put_record(&mut buf, value, prefix_len);
    }

    log::debug!(
        "packed {} cells with {}-bit shared prefix into {} bytes",
        values.len(),
        matched,
        buf.len()
    );

    PackedCells(buf.freeze())
}

/// Number of leading bits shared by every value, aligned to the face selector
/// and then to whole levels.
///
/// Only the extremes of the sorted set are compared; every value between two
/// integers that share their top `k` bits shares them too. The result never
/// passes the shallowest member's path, so nested members keep their sentinel
/// inside their remainder.
fn shared_prefix_bits(sorted: &[u64]) -> u32 {
    let (first, last) = match sorted {
        [first, .., last] => (*first, *last),
        _ => return 0,
    };

    if first >> FACE_SHIFT != last >> FACE_SHIFT {
        return 0;
    }

    let min_level = sorted
        .iter()
        .map(|&v| CellID(v).level() as u32)
        .min()
        .unwrap_or(0);
    let limit = FACE_BITS + 2 * min_level;

    let mut matched = FACE_BITS;
    for shift in (1..FACE_SHIFT - 1).rev().step_by(2) {
        if matched + 2 > limit || first >> shift != last >> shift {
            break;
        }
        matched += 2;
    }

    debug_assert!(
        sorted
            .iter()
            .all(|&v| v >> (64 - matched) == first >> (64 - matched))
    );
    matched
}

/// Append one cell record relative to a header of `prefix_len` bits.
fn put_record(buf: &mut BytesMut, value: u64, prefix_len: u32) {
    let width = REMAINDER_WIDTH - prefix_len;
    let mask = (1u128 << width) - 1;
    let mut rest = value as u128 & mask;
    debug_assert!(rest != 0, "sentinel must lie inside the remainder");

    let mut trimmed = 0;
    while rest & 0b11 == 0 {
        rest >>= 2;
        trimmed += 2;
    }
    rest >>= 1;

    let cell_len = width - trimmed - 1;
    log::trace!("cell {:016x}: {} bits after trimming {}", value, cell_len, trimmed);

    put_field(buf, cell_len as u64, 8);
    put_field(buf, rest as u64, cell_len);
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_of(bytes: &[u8]) -> String {
        to_hex(bytes)
    }

    #[test]
    fn test_single_cell_set_has_no_prefix() {
        let packed = encode(["89c2598ca85"]).unwrap();
        assert_eq!(packed.to_hex(), "0x002c44e12cc65420");
    }

    #[test]
    fn test_single_cell_key() {
        let key = encode_one("89c2598ca85").unwrap();
        assert_eq!(hex_of(&key), "0x2c44e12cc65420");
    }

    #[test]
    fn test_shared_prefix_header() {
        let packed = encode(["89c2598ca85", "89c2598ca8f", "89c2598ca91", "89c2598ca9b"]).unwrap();
        assert_eq!(packed.to_hex(), "0x2889c2598ca804200470048004d0");
    }

    #[test]
    fn test_cross_face_has_no_prefix() {
        let packed = encode(["077ffffffc", "0780000004", "92d5555554", "932aaaaaac"]).unwrap();
        assert_eq!(packed.prefix_len(), Some(0));
        assert_eq!(
            packed.to_hex(),
            "0x002603bffffffc2603c000000026496aaaaaa8264995555554"
        );
    }

    #[test]
    fn test_leaf_cells() {
        let packed = encode(["89c2598ca846bd55", "89c2598ca846bd57", "89c2598ca846bd53"]).unwrap();
        assert_eq!(packed.to_hex(), "0x3e89c2598ca846bd500240028002c0");
    }

    #[test]
    fn test_face_cell_key() {
        assert_eq!(hex_of(&encode_one("1").unwrap()), "0x0400");
        assert_eq!(hex_of(&encode_one("b").unwrap()), "0x0450");
    }

    #[test]
    fn test_nested_cells_keep_sentinel() {
        // "14" is a level-1 descendant of face cell "1"; without the level
        // cap the prefix would swallow the face cell's sentinel
        let packed = encode(["1", "14"]).unwrap();
        assert_eq!(packed.to_hex(), "0x0410000280");
        assert_eq!(
            packed.cells().unwrap(),
            vec![CellID(0x1000_0000_0000_0000), CellID(0x1400_0000_0000_0000)]
        );
    }

    #[test]
    fn test_level_zero_record_can_be_empty() {
        let packed = encode(["1", "14"]).unwrap();
        // header 0x04 0x10, then the face cell record: length 0, no payload
        assert_eq!(packed.as_bytes()[2], 0);
    }

    #[test]
    fn test_order_and_duplicates_do_not_matter() {
        let a = encode(["89c2598ca9b", "89c2598ca85", "89c2598ca91", "89c2598ca8f"]).unwrap();
        let b = encode([
            "89c2598ca85",
            "89c2598ca8f",
            "89c2598ca850",
            "89c2598ca91",
            "89c2598ca9b",
            "89c2598ca8f",
        ])
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_set() {
        let packed = encode(Vec::<String>::new()).unwrap();
        assert!(packed.is_empty());
        assert_eq!(packed.prefix_len(), None);
        assert_eq!(packed.to_hex(), "0x");
    }

    #[test]
    fn test_invalid_token_rejected_with_position() {
        let err = encode(["89c259", "89c25g"]).unwrap_err();
        assert!(matches!(err, CellPackError::InvalidToken { position: 1, .. }));
    }

    #[test]
    fn test_encode_cells_rejects_invalid_identifier() {
        assert!(encode_cells([CellID(0)]).is_err());
        assert!(encode_cells([CellID(0x89c2_5900_0000_0000)]).is_ok());
    }

    #[test]
    fn test_shared_prefix_extremes_bound_interior() {
        let values = vec![
            0x89c2_598c_a850_0000,
            0x89c2_598c_a8f0_0000,
            0x89c2_598c_a910_0000,
            0x89c2_598c_a9b0_0000,
        ];
        let matched = shared_prefix_bits(&values);
        assert_eq!(matched, 39);
        for v in &values {
            assert_eq!(v >> (64 - matched), values[0] >> (64 - matched));
        }
    }

    #[test]
    fn test_shared_prefix_is_level_aligned() {
        // first difference at bit 7 from the top: prefix stops at 7 bits
        let a = 0x8900_0000_0000_0000u64 | (1 << 20);
        let b = 0x8800_0000_0000_0000u64 | (1 << 20);
        let mut values = vec![a, b];
        values.sort_unstable();
        assert_eq!(shared_prefix_bits(&values), 7);
    }

    #[test]
    fn test_ancestor_keys_finest_first() {
        let keys = ancestor_keys("89c259").unwrap();
        assert_eq!(keys.len(), 11);
        assert_eq!(keys[0], encode_one("89c259").unwrap());
        assert_eq!(keys[10], encode_one("9").unwrap());
    }
}
