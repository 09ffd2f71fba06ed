//! Common imports for accessor users
//!
//! ```rust
//! use xlkit::prelude::*;
//! ```

pub use crate::{
    AccessorError, AccessorOptions, AccessorResult, CellInput, CellRange, CellValue,
    HorizontalAlignment, NumberFormat, SheetAccessor, Style, UploadedFile, VerticalAlignment,
    Workbook, WorkbookExt, Worksheet,
};
