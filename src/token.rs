//! Parsing and validation of S2 cell tokens.
//!
//! A token is the hex form of a 64-bit cell identifier with trailing zero
//! digits removed. Parsing right-pads it back to 16 digits before reading
//! the integer, so `"89c259"` and `"89c2590000000000"` name the same cell.

use crate::error::{CellPackError, Result};
use s2::cellid::CellID;

/// Number of hex digits in a fully padded token.
pub const TOKEN_HEX_DIGITS: usize = 16;

/// Bits used by the face selector at the top of every identifier.
pub const FACE_BITS: u32 = 3;

/// Deepest subdivision level of the hierarchy.
pub const MAX_LEVEL: u64 = 30;

/// Parse a single token into a cell identifier.
///
/// # Examples
///
/// ```
/// use cellpack::token::parse_token;
///
/// let cell = parse_token("89c259").unwrap();
/// assert_eq!(cell.0, 0x89c2_5900_0000_0000);
/// assert_eq!(cell.level(), 10);
///
/// assert!(parse_token("xyz").is_err());
/// assert!(parse_token("").is_err());
/// ```
pub fn parse_token(token: &str) -> Result<CellID> {
    parse_token_at(token, 0)
}

/// Parse every token, reporting the position of the first invalid one.
pub fn parse_tokens<I, S>(tokens: I) -> Result<Vec<CellID>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .enumerate()
        .map(|(position, token)| parse_token_at(token.as_ref(), position))
        .collect()
}

pub(crate) fn parse_token_at(token: &str, position: usize) -> Result<CellID> {
    if token.is_empty() {
        return Err(CellPackError::invalid_token(token, position, "empty token"));
    }

    if token.len() > TOKEN_HEX_DIGITS {
        return Err(CellPackError::invalid_token(
            token,
            position,
            format!(
                "{} hex digits exceeds the maximum of {}",
                token.len(),
                TOKEN_HEX_DIGITS
            ),
        ));
    }

    // from_str_radix tolerates a leading '+', tokens must not
    if let Some(bad) = token.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(CellPackError::invalid_token(
            token,
            position,
            format!("non-hex character {:?}", bad),
        ));
    }

    let raw = u64::from_str_radix(token, 16)
        .map_err(|e| CellPackError::invalid_token(token, position, e.to_string()))?;
    let padding = 4 * (TOKEN_HEX_DIGITS - token.len()) as u32;
    let cell = CellID(raw << padding);

    validate_cell(cell).map_err(|reason| CellPackError::invalid_token(token, position, reason))?;
    Ok(cell)
}

/// Check the structural invariants of an identifier: face in 0..=5 and a
/// single sentinel bit at an even position.
pub fn validate_cell(cell: CellID) -> std::result::Result<(), String> {
    if cell.0 == 0 {
        return Err("identifier has no sentinel bit".to_string());
    }

    let face = cell.0 >> (64 - FACE_BITS);
    if face > 5 {
        return Err(format!("face {} is out of range 0..=5", face));
    }

    if cell.0.trailing_zeros() % 2 != 0 {
        return Err(format!(
            "sentinel bit at odd position {}",
            cell.0.trailing_zeros()
        ));
    }

    debug_assert!(cell.is_valid());
    Ok(())
}

/// Render an identifier as its shortest token.
pub fn to_token(cell: CellID) -> String {
    cell.to_token()
}
