//! A1 references and rectangular ranges
//!
//! Rows and columns are 0-based everywhere in the model; only the A1 text
//! form is 1-based.

use std::fmt;

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// Letters for a 0-based column: 0 is `A`, 26 is `AA`
pub fn column_name(col: u16) -> String {
    let mut n = u32::from(col) + 1;
    let mut letters = Vec::with_capacity(3);
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.iter().rev().map(|&b| char::from(b)).collect()
}

fn column_from_letters(letters: &str) -> Option<u16> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut n: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        n = n * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1;
    }
    u16::try_from(n - 1).ok().filter(|col| *col < MAX_COLS)
}

/// One cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u16,
}

impl CellRef {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Parse `B7` or `$B$7`
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidReference(text.to_string());
        let bare: String = text.trim().chars().filter(|c| *c != '$').collect();
        let split = bare.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
        let (letters, digits) = bare.split_at(split);

        let col = column_from_letters(letters).ok_or_else(invalid)?;
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 || row > MAX_ROWS {
            return Err(invalid());
        }
        Ok(Self { row: row - 1, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), u64::from(self.row) + 1)
    }
}

/// Inclusive block of cells, stored normalized so `first <= last`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u16,
    pub last_col: u16,
}

impl CellRange {
    /// Corners may come in either order
    pub fn new(first_row: u32, last_row: u32, first_col: u16, last_col: u16) -> Self {
        Self {
            first_row: first_row.min(last_row),
            last_row: first_row.max(last_row),
            first_col: first_col.min(last_col),
            last_col: first_col.max(last_col),
        }
    }

    /// Parse `A1:C3`; a lone `B2` is a one-cell range
    pub fn parse(text: &str) -> Result<Self> {
        let (a, b) = match text.split_once(':') {
            Some((a, b)) => (CellRef::parse(a)?, CellRef::parse(b)?),
            None => {
                let single = CellRef::parse(text)?;
                (single, single)
            }
        };
        Ok(Self::new(a.row, b.row, a.col, b.col))
    }

    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    /// Whether the range sits entirely inside rows `start..=end`
    pub fn within_rows(&self, start: u32, end: u32) -> bool {
        self.first_row >= start && self.last_row <= end
    }

    /// The same range moved vertically, if it still fits on a sheet
    pub fn offset_rows(&self, offset: i64) -> Option<Self> {
        let move_row = |row: u32| {
            let moved = i64::from(row) + offset;
            u32::try_from(moved).ok().filter(|r| *r < MAX_ROWS)
        };
        Some(Self {
            first_row: move_row(self.first_row)?,
            last_row: move_row(self.last_row)?,
            ..*self
        })
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            CellRef::new(self.first_row, self.first_col),
            CellRef::new(self.last_row, self.last_col)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(MAX_COLS - 1), "XFD");
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(CellRef::parse("A1").unwrap(), CellRef::new(0, 0));
        assert_eq!(CellRef::parse("$c$10").unwrap(), CellRef::new(9, 2));
        assert_eq!(CellRef::parse("XFD1048576").unwrap().to_string(), "XFD1048576");
        for bad in ["", "A", "1", "A0", "XFE1", "A1048577", "A-1", "1A"] {
            assert!(CellRef::parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_range_is_normalized() {
        let range = CellRange::parse("C4:A2").unwrap();
        assert_eq!(range, CellRange::new(1, 3, 0, 2));
        assert_eq!(range.to_string(), "A2:C4");
        assert!(range.contains(2, 1));
        assert!(!range.contains(4, 1));
        assert_eq!(CellRange::parse("B2").unwrap(), CellRange::new(1, 1, 1, 1));
    }

    #[test]
    fn test_offset_rows() {
        let range = CellRange::new(4, 6, 0, 0);
        assert_eq!(range.offset_rows(2), Some(CellRange::new(6, 8, 0, 0)));
        assert_eq!(range.offset_rows(-5), None);
        assert_eq!(range.offset_rows(i64::from(MAX_ROWS)), None);
        assert!(range.within_rows(4, 10));
        assert!(!range.within_rows(5, 10));
    }
}
