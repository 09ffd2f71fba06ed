//! # xlkit
//!
//! A cursor-based accessor for Excel workbooks.
//!
//! xlkit loads a workbook from a path, an open file, an upload or a `file:`
//! URI, reads and writes cells along a row cursor, applies basic layout
//! (alignment, column widths, row heights, merges, row insertion) and
//! exports the result as `.xlsx` to an HTTP response or a local file.
//!
//! ## Features
//!
//! - Read and write XLSX files (Office Open XML)
//! - Read XLS files (legacy BIFF8 format), feature `xls`
//! - Date-aware reads driven by the cell's number format
//!
//! ## Example
//!
//! ```rust
//! use xlkit::prelude::*;
//!
//! let mut sheet = SheetAccessor::new_excel();
//! sheet.title(["Item", "Price"]).unwrap();
//! sheet.next_row();
//! sheet.write(0, "Tea").unwrap().write(1, 12.50).unwrap();
//!
//! assert_eq!(sheet.read(1).as_deref(), Some("12.5"));
//!
//! // Save to file
//! // sheet.export_file("out/prices").unwrap();
//! ```

pub mod accessor;
pub mod error;
pub mod prelude;
pub mod source;

pub use accessor::{AccessorOptions, CellInput, SheetAccessor, STATUS_FAILED, STATUS_OK};
pub use error::{AccessorError, AccessorResult};
pub use source::{MemoryUpload, SourceFormat, UploadedFile};

pub use xlkit_core::{
    date, CellRange, CellRef, CellValue, ErrorValue, FormulaResult, HorizontalAlignment,
    NumberFormat, Style, VerticalAlignment, Workbook, Worksheet, MAX_COLS, MAX_ROWS,
};

#[cfg(feature = "xls")]
pub use xlkit_xls::{XlsError, XlsReader};
pub use xlkit_xlsx::{XlsxError, XlsxReader, XlsxWriter};

use std::path::Path;

/// File I/O for a bare [`Workbook`], dispatched on the file extension
pub trait WorkbookExt: Sized {
    /// Open `.xlsx`/`.xlsm`, or `.xls` with the `xls` feature
    fn open<P: AsRef<Path>>(path: P) -> AccessorResult<Self>;

    /// Save as `.xlsx`
    fn save<P: AsRef<Path>>(&self, path: P) -> AccessorResult<()>;
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> AccessorResult<Workbook> {
        let path = path.as_ref();
        match extension_of(path).as_deref() {
            Some("xlsx" | "xlsm") => Ok(XlsxReader::read_file(path)?),
            #[cfg(feature = "xls")]
            Some("xls") => Ok(XlsReader::read_file(path)?),
            _ => Err(AccessorError::UnknownFormat(path.display().to_string())),
        }
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> AccessorResult<()> {
        let path = path.as_ref();
        match extension_of(path).as_deref() {
            Some("xlsx") => Ok(XlsxWriter::write_file(self, path)?),
            _ => Err(AccessorError::UnknownFormat(path.display().to_string())),
        }
    }
}
