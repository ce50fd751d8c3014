//! Text coordinates for the engine protocol: letter column with `I`
//! skipped, 1-based row, e.g. "A1" or "J10". Row 0 maps to "1".

use crate::types::Pos;

/// Column letters in protocol order; `I` is omitted by convention.
pub const GTP_COLUMNS: &[u8] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

pub fn pos_to_gtp(pos: Pos, size: usize) -> Option<String> {
    let n = size as i8;
    if !(0..n).contains(&pos.row) || !(0..n).contains(&pos.col) {
        return None;
    }
    let col_char = GTP_COLUMNS[pos.col as usize] as char;
    Some(format!("{}{}", col_char, pos.row + 1))
}

pub fn gtp_to_pos(text: &str, size: usize) -> Option<Pos> {
    let mut chars = text.chars();
    let col_char = chars.next()?.to_ascii_uppercase();
    let col = GTP_COLUMNS.iter().position(|&c| c as char == col_char)? as i8;
    let row: i8 = chars.as_str().parse::<i8>().ok()?.checked_sub(1)?;
    let n = size as i8;
    if !(0..n).contains(&row) || !(0..n).contains(&col) {
        return None;
    }
    Some(Pos::new(row, col))
}

#[cfg(test)]
#[path = "coords_tests.rs"]
mod coords_tests;
