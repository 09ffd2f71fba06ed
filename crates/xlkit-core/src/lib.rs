//! # xlkit-core
//!
//! The in-memory workbook model shared by the codecs and the accessor.
//!
//! - [`CellValue`] - what a cell holds
//! - [`CellRef`] and [`CellRange`] - A1 references and merged regions
//! - [`Style`] and [`NumberFormat`] - alignment, wrapping and number format
//! - [`Workbook`] and [`Worksheet`] - sheets of physical rows
//! - [`date`] - serial date conversion
//!
//! ## Example
//!
//! ```rust
//! use xlkit_core::{CellValue, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.sheet_mut(0).unwrap();
//! sheet.set_value(0, 0, "Hello").unwrap();
//! sheet.set_value(0, 1, 42.0).unwrap();
//!
//! // rows exist on their own, even without cells
//! sheet.create_row(4).unwrap();
//! assert_eq!(sheet.row_count(), 2);
//! assert_eq!(sheet.value(0, 1), Some(&CellValue::Number(42.0)));
//! ```

pub mod date;
pub mod error;
pub mod format;
pub mod reference;
pub mod sheet;
pub mod style;
pub mod value;
pub mod workbook;

pub use error::{Error, Result};
pub use format::NumberFormat;
pub use reference::{CellRange, CellRef};
pub use sheet::{Cell, Column, Row, Worksheet};
pub use style::{HorizontalAlignment, Style, StylePool, VerticalAlignment};
pub use value::{CellValue, ErrorValue, FormulaResult};
pub use workbook::Workbook;

/// Rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Columns in a worksheet
pub const MAX_COLS: u16 = 16_384;
