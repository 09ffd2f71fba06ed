//! Accessor error types

use std::path::PathBuf;

use thiserror::Error;

/// Result type for accessor operations
pub type AccessorResult<T> = std::result::Result<T, AccessorError>;

/// Errors raised while loading, editing or exporting through a [`SheetAccessor`](crate::SheetAccessor)
#[derive(Debug, Error)]
pub enum AccessorError {
    /// The input stream could not be opened
    #[error("cannot open {}: {source}", path.display())]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The URI does not name a local file
    #[error("not a local file URI: {0}")]
    InvalidUri(String),

    /// The stream is neither XLSX nor XLS
    #[error("unrecognized workbook format: {0}")]
    UnknownFormat(String),

    /// XLSX parse or write failure
    #[error(transparent)]
    Xlsx(#[from] xlkit_xlsx::XlsxError),

    /// XLS parse failure
    #[cfg(feature = "xls")]
    #[error(transparent)]
    Xls(#[from] xlkit_xls::XlsError),

    /// The output file could not be opened
    #[error("cannot open output {}: {source}", path.display())]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configured chrono pattern could not be rendered
    #[error("invalid date pattern: {0}")]
    InvalidPattern(String),

    /// The accessor holds no workbook
    #[error("no workbook loaded")]
    NotLoaded,

    /// The requested worksheet does not exist
    #[error("worksheet {0} does not exist")]
    SheetNotFound(usize),

    /// Response header value rejected
    #[error("invalid header value: {0}")]
    Header(#[from] http::header::InvalidHeaderValue),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Workbook model error
    #[error(transparent)]
    Core(#[from] xlkit_core::Error),
}

impl AccessorError {
    /// Whether the stream was opened but could not be parsed as a workbook
    pub fn is_parse_failure(&self) -> bool {
        match self {
            AccessorError::UnknownFormat(_) | AccessorError::Xlsx(_) => true,
            #[cfg(feature = "xls")]
            AccessorError::Xls(_) => true,
            _ => false,
        }
    }
}
