//! Failures while reading or writing a package

use thiserror::Error;

pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Not a zip archive, or a damaged one
    #[error("broken package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A part every workbook needs is absent
    #[error("package has no {0}")]
    MissingPart(String),

    /// A cell whose contents cannot be understood
    #[error("cell {at}: {reason}")]
    BadCell { at: String, reason: String },

    /// The content breaks worksheet limits (a row past the last one, say)
    #[error(transparent)]
    Model(#[from] xlkit_core::Error),
}
