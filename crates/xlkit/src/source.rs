//! Input sources: format sniffing, uploads and `file:` URIs

use std::borrow::Cow;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;

use crate::error::{AccessorError, AccessorResult};

/// Leading bytes of a zip archive (XLSX)
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Leading bytes of a Compound File Binary container (XLS)
const CFB_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Container format of a workbook stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Xlsx,
    Xls,
}

/// Detect the workbook format from the stream's magic bytes.
///
/// The stream is rewound to where it started. Returns `None` for anything
/// that is neither a zip archive nor a CFB container.
pub fn sniff_format<R: Read + Seek>(reader: &mut R) -> io::Result<Option<SourceFormat>> {
    let start = reader.stream_position()?;
    let mut magic = [0u8; 8];
    let mut filled = 0;
    while filled < magic.len() {
        let n = reader.read(&mut magic[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    reader.seek(SeekFrom::Start(start))?;

    let head = &magic[..filled];
    if head.starts_with(&ZIP_MAGIC) {
        Ok(Some(SourceFormat::Xlsx))
    } else if head == CFB_MAGIC {
        Ok(Some(SourceFormat::Xls))
    } else {
        Ok(None)
    }
}

/// A file received as part of a multipart upload
pub trait UploadedFile {
    /// File name as sent by the client, if any
    fn original_filename(&self) -> Option<&str> {
        None
    }

    /// The uploaded content
    fn bytes(&self) -> io::Result<Cow<'_, [u8]>>;
}

impl UploadedFile for [u8] {
    fn bytes(&self) -> io::Result<Cow<'_, [u8]>> {
        Ok(Cow::Borrowed(self))
    }
}

impl UploadedFile for Vec<u8> {
    fn bytes(&self) -> io::Result<Cow<'_, [u8]>> {
        Ok(Cow::Borrowed(self.as_slice()))
    }
}

/// An in-memory upload that keeps its client-side file name
#[derive(Debug, Clone)]
pub struct MemoryUpload {
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

impl MemoryUpload {
    pub fn new<S: Into<String>>(file_name: S, data: Vec<u8>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            data,
        }
    }
}

impl UploadedFile for MemoryUpload {
    fn original_filename(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    fn bytes(&self) -> io::Result<Cow<'_, [u8]>> {
        Ok(Cow::Borrowed(self.data.as_slice()))
    }
}

/// Resolve a `file:` URI to a local path.
///
/// Accepts `file:/path`, `file:///path` and `file://localhost/path`. The
/// path is percent-decoded.
pub fn file_uri_to_path(uri: &str) -> AccessorResult<PathBuf> {
    let invalid = || AccessorError::InvalidUri(uri.to_string());

    let scheme_len = "file:".len();
    let is_file_scheme = uri
        .get(..scheme_len)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("file:"));
    if !is_file_scheme {
        return Err(invalid());
    }
    let rest = &uri[scheme_len..];

    let path = match rest.strip_prefix("//") {
        Some(authority_and_path) => {
            let (authority, path) = match authority_and_path.find('/') {
                Some(idx) => authority_and_path.split_at(idx),
                None => return Err(invalid()),
            };
            if !authority.is_empty() && !authority.eq_ignore_ascii_case("localhost") {
                return Err(invalid());
            }
            path
        }
        None if rest.starts_with('/') => rest,
        None => return Err(invalid()),
    };

    // Query and fragment are not part of the path
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let decoded = urlencoding::decode(path).map_err(|_| invalid())?;

    if cfg!(windows) {
        // file:///C:/dir -> C:/dir
        let bytes = decoded.as_bytes();
        if bytes.len() >= 3 && bytes[0] == b'/' && bytes[2] == b':' {
            return Ok(PathBuf::from(&decoded[1..]));
        }
    }

    Ok(PathBuf::from(decoded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn test_sniff_format() {
        let mut xlsx = Cursor::new(b"PK\x03\x04rest".to_vec());
        assert_eq!(sniff_format(&mut xlsx).unwrap(), Some(SourceFormat::Xlsx));
        assert_eq!(xlsx.position(), 0);

        let mut xls = Cursor::new(CFB_MAGIC.to_vec());
        assert_eq!(sniff_format(&mut xls).unwrap(), Some(SourceFormat::Xls));

        let mut csv = Cursor::new(b"a,b,c\n".to_vec());
        assert_eq!(sniff_format(&mut csv).unwrap(), None);

        let mut empty = Cursor::new(Vec::new());
        assert_eq!(sniff_format(&mut empty).unwrap(), None);
    }

    #[test]
    fn test_sniff_rewinds_to_start_position() {
        let mut data = b"xxPK\x03\x04".to_vec();
        data.extend_from_slice(&[0; 8]);
        let mut cursor = Cursor::new(data);
        cursor.set_position(2);
        assert_eq!(sniff_format(&mut cursor).unwrap(), Some(SourceFormat::Xlsx));
        assert_eq!(cursor.position(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_uri_to_path() {
        assert_eq!(
            file_uri_to_path("file:///tmp/report.xlsx").unwrap(),
            PathBuf::from("/tmp/report.xlsx")
        );
        assert_eq!(
            file_uri_to_path("file://localhost/tmp/a%20b.xlsx").unwrap(),
            PathBuf::from("/tmp/a b.xlsx")
        );
        assert_eq!(
            file_uri_to_path("file:/tmp/x.xlsx").unwrap(),
            PathBuf::from("/tmp/x.xlsx")
        );
        assert_eq!(
            file_uri_to_path("FILE:///tmp/x.xlsx?v=1").unwrap(),
            PathBuf::from("/tmp/x.xlsx")
        );
    }

    #[test]
    fn test_rejects_non_local_uris() {
        for uri in [
            "http://example.com/a.xlsx",
            "file://server/share/a.xlsx",
            "file:relative.xlsx",
            "file://",
            "/plain/path.xlsx",
        ] {
            assert!(
                matches!(file_uri_to_path(uri), Err(AccessorError::InvalidUri(_))),
                "{uri}"
            );
        }
    }

    #[test]
    fn test_upload_impls() {
        let upload = MemoryUpload::new("book.xlsx", vec![1, 2, 3]);
        assert_eq!(upload.original_filename(), Some("book.xlsx"));
        assert_eq!(upload.bytes().unwrap().as_ref(), &[1, 2, 3]);

        let raw = vec![9u8];
        assert_eq!(raw.original_filename(), None);
        assert_eq!(raw.bytes().unwrap().as_ref(), &[9]);
    }
}
