//! Workbook model errors

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Ways an edit or lookup can break the worksheet limits
#[derive(Debug, Error)]
pub enum Error {
    #[error("row {0} is past the last worksheet row")]
    RowOutOfRange(u64),

    #[error("column {0} is past the last worksheet column")]
    ColumnOutOfRange(u64),

    /// Not an A1 reference or an A1:B2 range
    #[error("'{0}' is not a cell reference")]
    InvalidReference(String),

    #[error("sheet name '{name}' {reason}")]
    InvalidSheetName { name: String, reason: &'static str },

    /// Sheet names compare case-insensitively
    #[error("a sheet named '{0}' already exists")]
    DuplicateSheetName(String),

    #[error("rows {start}..={end} cannot move by {offset}")]
    RowShift { start: u32, end: u32, offset: i64 },
}
