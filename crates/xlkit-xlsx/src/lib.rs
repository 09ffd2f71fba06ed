//! # xlkit-xlsx
//!
//! Reads and writes Office Open XML workbooks (`.xlsx`).
//!
//! Only what the workbook model holds survives a round trip: cell values
//! with cached formula results, alignment and number formats, row heights,
//! column widths, hidden rows, columns and sheets, merged regions, the 1904
//! date system and the recalculate-on-open flags. Fonts, fills, borders and
//! everything else in a package are ignored on read.

pub mod error;
pub mod reader;
pub mod writer;

mod styles;
mod xml;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
