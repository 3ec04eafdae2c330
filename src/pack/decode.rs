//! Inverse of the packed cell format.

use super::REMAINDER_WIDTH;
use super::bits::{FieldReader, MAX_FIELD_BITS};
use crate::error::{CellPackError, Result};
use crate::token::validate_cell;
use s2::cellid::CellID;

/// Decode a packed cell set into its sorted, deduplicated cells.
///
/// An empty byte string decodes to an empty set.
pub fn decode(bytes: &[u8]) -> Result<Vec<CellID>> {
    let mut reader = FieldReader::new(bytes);
    if reader.is_empty() {
        return Ok(Vec::new());
    }

    let prefix_len = reader.read_u8()? as u32;
    if prefix_len != 0
        && (prefix_len < 4 || prefix_len > MAX_FIELD_BITS || prefix_len % 2 != 0)
    {
        return Err(CellPackError::Malformed(format!(
            "invalid prefix length {}",
            prefix_len
        )));
    }

    // the last header bit duplicates the top remainder bit of the smallest cell
    let width = REMAINDER_WIDTH - prefix_len;
    let (prefix, header_bit) = if prefix_len > 0 {
        let header = reader.read_field(prefix_len)? as u128;
        ((header >> 1) << width, Some(header & 1))
    } else {
        (0, None)
    };

    let mut cells: Vec<CellID> = Vec::new();
    while !reader.is_empty() {
        let offset = reader.position();
        let remainder = read_remainder(&mut reader, width)?;
        if cells.is_empty()
            && let Some(bit) = header_bit
            && (remainder >> (width - 1)) & 1 != bit
        {
            return Err(CellPackError::Malformed(format!(
                "record at byte {} disagrees with the last header bit",
                offset
            )));
        }

        let value = prefix | remainder;
        let cell = to_cell(value, offset)?;

        if let Some(prev) = cells.last()
            && prev.0 >= cell.0
        {
            return Err(CellPackError::Malformed(format!(
                "record at byte {} is not in ascending order",
                offset
            )));
        }
        cells.push(cell);
    }

    if cells.is_empty() {
        return Err(CellPackError::Malformed(
            "header without cell records".to_string(),
        ));
    }

    Ok(cells)
}

/// Decode a single-cell lookup key.
pub fn decode_key(bytes: &[u8]) -> Result<CellID> {
    let mut reader = FieldReader::new(bytes);
    let value = read_remainder(&mut reader, REMAINDER_WIDTH)?;
    if !reader.is_empty() {
        return Err(CellPackError::Malformed(format!(
            "{} trailing bytes after key",
            bytes.len() - reader.position()
        )));
    }
    to_cell(value, 0)
}

/// Read one record and restore its sentinel and trailing zero pairs.
fn read_remainder(reader: &mut FieldReader<'_>, width: u32) -> Result<u128> {
    let offset = reader.position();
    let cell_len = reader.read_u8()? as u32;
    if cell_len + 1 > width {
        return Err(CellPackError::Malformed(format!(
            "record at byte {} claims {} bits, at most {} fit",
            offset,
            cell_len,
            width - 1
        )));
    }

    let trimmed = width - 1 - cell_len;
    if trimmed % 2 != 0 {
        return Err(CellPackError::Malformed(format!(
            "record at byte {} has a misaligned length {}",
            offset, cell_len
        )));
    }

    let bits = reader.read_field(cell_len)? as u128;
    Ok(((bits << 1) | 1) << trimmed)
}

fn to_cell(value: u128, offset: usize) -> Result<CellID> {
    let value = u64::try_from(value).map_err(|_| {
        CellPackError::Malformed(format!("record at byte {} overflows 64 bits", offset))
    })?;
    let cell = CellID(value);
    validate_cell(cell).map_err(|reason| {
        CellPackError::Malformed(format!("record at byte {}: {}", offset, reason))
    })?;
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::{encode, encode_one};
    use crate::token::parse_tokens;

    #[test]
    fn test_decode_single_cell() {
        let packed = encode(["89c2598ca85"]).unwrap();
        let cells = decode(packed.as_bytes()).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].to_token(), "89c2598ca85");
    }

    #[test]
    fn test_decode_shared_prefix() {
        let tokens = ["89c2598ca85", "89c2598ca8f", "89c2598ca91", "89c2598ca9b"];
        let cells = decode(encode(tokens).unwrap().as_bytes()).unwrap();
        assert_eq!(cells, parse_tokens(tokens).unwrap());
    }

    #[test]
    fn test_decode_key() {
        let key = encode_one("89c2598ca846bd55").unwrap();
        assert_eq!(decode_key(&key).unwrap().to_token(), "89c2598ca846bd55");

        let key = encode_one("1").unwrap();
        assert_eq!(decode_key(&key).unwrap().0, 0x1000_0000_0000_0000);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_truncated_record() {
        let packed = encode(["89c2598ca85", "89c2598ca8f"]).unwrap();
        let bytes = packed.as_bytes();
        assert!(decode(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_decode_rejects_header_only() {
        let packed = encode(["89c2598ca85", "89c2598ca8f"]).unwrap();
        let header_len = 1 + (packed.prefix_len().unwrap() as usize).div_ceil(8);
        assert!(decode(&packed.as_bytes()[..header_len]).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_prefix_length() {
        assert!(decode(&[65, 0, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
        assert!(decode(&[7, 0x80]).is_err());
    }

    #[test]
    fn test_decode_rejects_out_of_order() {
        let a = encode_one("89c2598ca9b").unwrap();
        let b = encode_one("89c2598ca85").unwrap();
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&a);
        bytes.extend_from_slice(&b);
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_altered_header_bit() {
        let packed = encode(["89c2598ca85", "89c2598ca8f", "89c2598ca91", "89c2598ca9b"]).unwrap();
        assert_eq!(packed.prefix_len(), Some(40));

        let mut bytes = packed.as_bytes().to_vec();
        bytes[5] ^= 0x01;
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, CellPackError::Malformed(_)));
    }

    #[test]
    fn test_decode_allows_later_records_to_differ_from_header_bit() {
        // 89c2598ca8.. and 89c2598ca9.. split on the duplicated bit
        let tokens = ["89c2598ca85", "89c2598ca91"];
        let packed = encode(tokens).unwrap();
        assert_eq!(decode(packed.as_bytes()).unwrap(), parse_tokens(tokens).unwrap());
    }

    #[test]
    fn test_decode_key_rejects_trailing_bytes() {
        let mut key = encode_one("89c259").unwrap().to_vec();
        key.push(0);
        assert!(decode_key(&key).is_err());
    }
}
