//! # xlkit-xls
//!
//! Reads legacy Excel workbooks (`.xls`, BIFF8 inside a compound file).
//!
//! Reading fills the same model the XLSX codec uses, so a workbook opened
//! from `.xls` is saved as `.xlsx`. Formula token streams are not
//! decompiled: a formula cell keeps only its cached result.

pub mod biff;
pub mod error;
pub mod reader;

mod xf;

pub use error::{XlsError, XlsResult};
pub use reader::XlsReader;
