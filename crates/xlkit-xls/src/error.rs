//! Failures while reading a legacy workbook

use thiserror::Error;

pub type XlsResult<T> = std::result::Result<T, XlsError>;

#[derive(Debug, Error)]
pub enum XlsError {
    /// Also what the compound file layer reports for a damaged container
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("compound file has no Workbook stream")]
    NoWorkbookStream,

    /// BIFF5 and older
    #[error("BIFF version {0:#06x} is not supported, only BIFF8")]
    NotBiff8(u16),

    #[error("workbook globals never end")]
    UnterminatedGlobals,

    #[error("record data ends early at byte {at}")]
    Truncated { at: usize },

    #[error("string ending at byte {at} is not valid UTF-16")]
    BadString { at: usize },

    #[error(transparent)]
    Model(#[from] xlkit_core::Error),
}
