//! BIFF8 record stream and the primitives inside record bodies
//!
//! A record is a little-endian `u16` id, a `u16` body length and the body.
//! Bodies longer than 8224 bytes spill into CONTINUE records, which are
//! folded into their parent here. The offsets where they were joined are
//! kept because a string crossing one restates its encoding flag.

use std::sync::Arc;

use crate::error::{XlsError, XlsResult};

/// Record ids ([MS-XLS] 2.3)
pub mod id {
    pub const BOF: u16 = 0x0809;
    pub const EOF: u16 = 0x000A;
    pub const CONTINUE: u16 = 0x003C;

    pub const BOUNDSHEET: u16 = 0x0085;
    pub const SST: u16 = 0x00FC;
    pub const DATEMODE: u16 = 0x0022;
    pub const FORMAT: u16 = 0x041E;
    pub const XF: u16 = 0x00E0;

    pub const LABELSST: u16 = 0x00FD;
    pub const LABEL: u16 = 0x0204;
    pub const NUMBER: u16 = 0x0203;
    pub const RK: u16 = 0x027E;
    pub const MULRK: u16 = 0x00BD;
    pub const BLANK: u16 = 0x0201;
    pub const MULBLANK: u16 = 0x00BE;
    pub const BOOLERR: u16 = 0x0205;
    pub const FORMULA: u16 = 0x0006;
    /// Text result of the FORMULA right before it
    pub const STRING: u16 = 0x0207;

    pub const ROW: u16 = 0x0208;
    pub const COLINFO: u16 = 0x007D;
    pub const MERGECELLS: u16 = 0x00E5;
}

/// `BOF.vers` of the only version read
pub const BIFF8: u16 = 0x0600;
/// `BOF.dt` of the workbook globals substream
pub const GLOBALS: u16 = 0x0005;

#[derive(Debug)]
pub(crate) struct Record {
    pub id: u16,
    pub body: Vec<u8>,
    /// Body offsets where a CONTINUE record was appended
    pub seams: Vec<usize>,
}

impl Record {
    pub fn bytes(&self) -> Bytes<'_> {
        Bytes::new(&self.body)
    }
}

/// Split a `Workbook` stream into records, folding CONTINUE bodies in
pub(crate) fn records(stream: &[u8]) -> XlsResult<Vec<Record>> {
    let mut out: Vec<Record> = Vec::new();
    let mut input = Bytes::new(stream);

    while input.remaining() >= 4 {
        let id = input.u16()?;
        let len = usize::from(input.u16()?);
        let body = input.take(len)?;

        if id == id::CONTINUE {
            if let Some(parent) = out.last_mut() {
                parent.seams.push(parent.body.len());
                parent.body.extend_from_slice(body);
            }
            continue;
        }
        out.push(Record {
            id,
            body: body.to_vec(),
            seams: Vec::new(),
        });
    }
    Ok(out)
}

/// Decode an RK number: a 30-bit integer or the top 30 bits of a double,
/// optionally scaled by 1/100
pub(crate) fn rk_value(rk: u32) -> f64 {
    let value = if rk & 0x02 != 0 {
        f64::from((rk as i32) >> 2)
    } else {
        f64::from_bits(u64::from(rk & !0x03) << 32)
    };
    if rk & 0x01 != 0 {
        value / 100.0
    } else {
        value
    }
}

/// Little-endian reader over a record body
pub(crate) struct Bytes<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Bytes<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn skip(&mut self, n: usize) -> XlsResult<()> {
        self.take(n).map(drop)
    }

    fn take(&mut self, n: usize) -> XlsResult<&'a [u8]> {
        let slice = self
            .pos
            .checked_add(n)
            .and_then(|end| self.data.get(self.pos..end))
            .ok_or(XlsError::Truncated { at: self.pos })?;
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> XlsResult<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> XlsResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> XlsResult<u16> {
        self.array().map(u16::from_le_bytes)
    }

    pub fn u32(&mut self) -> XlsResult<u32> {
        self.array().map(u32::from_le_bytes)
    }

    pub fn f64(&mut self) -> XlsResult<f64> {
        self.array().map(f64::from_le_bytes)
    }

    pub fn raw8(&mut self) -> XlsResult<[u8; 8]> {
        self.array()
    }

    pub fn rk(&mut self) -> XlsResult<f64> {
        self.u32().map(rk_value)
    }

    /// `ShortXLUnicodeString`: one-byte length
    pub fn short_string(&mut self) -> XlsResult<String> {
        let len = usize::from(self.u8()?);
        let flags = self.u8()?;
        self.chars(len, flags, &[])
    }

    /// `XLUnicodeString` or `XLUnicodeRichExtendedString`: two-byte length,
    /// rich-text runs and phonetic data are skipped
    pub fn string(&mut self) -> XlsResult<String> {
        self.string_across(&[])
    }

    fn string_across(&mut self, seams: &[usize]) -> XlsResult<String> {
        let len = usize::from(self.u16()?);
        let flags = self.u8()?;
        let runs = if flags & 0x08 != 0 { self.u16()? } else { 0 };
        let phonetic = if flags & 0x04 != 0 { self.u32()? } else { 0 };

        let text = self.chars(len, flags, seams)?;
        self.skip(usize::from(runs) * 4 + phonetic as usize)?;
        Ok(text)
    }

    /// `count` characters, compressed (one byte) or UTF-16LE per `flags`.
    /// At each seam the flag byte is repeated and may switch encodings.
    fn chars(&mut self, count: usize, flags: u8, seams: &[usize]) -> XlsResult<String> {
        let mut wide = flags & 0x01 != 0;
        let mut units: Vec<u16> = Vec::with_capacity(count);

        while units.len() < count {
            if seams.contains(&self.pos) {
                wide = self.u8()? & 0x01 != 0;
            }
            let unit = if wide {
                self.u16()?
            } else {
                u16::from(self.u8()?)
            };
            units.push(unit);
        }
        String::from_utf16(&units).map_err(|_| XlsError::BadString { at: self.pos })
    }
}

/// Shared string table from a merged SST record.
///
/// A table cut short by its writer keeps the strings read so far.
pub(crate) fn shared_strings(sst: &Record) -> XlsResult<Vec<Arc<str>>> {
    let mut bytes = sst.bytes();
    bytes.skip(4)?;
    let unique = bytes.u32()? as usize;

    let mut strings = Vec::with_capacity(unique.min(sst.body.len()));
    while strings.len() < unique {
        match bytes.string_across(&sst.seams) {
            Ok(s) => strings.push(Arc::from(s)),
            Err(e) => {
                log::warn!("shared string table stops at {} of {unique}: {e}", strings.len());
                break;
            }
        }
    }
    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(id: u16, body: &[u8]) -> Vec<u8> {
        let mut out = id.to_le_bytes().to_vec();
        out.extend_from_slice(&(body.len() as u16).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_continue_folds_into_parent() {
        let mut stream = raw(id::SST, &[1, 2, 3]);
        stream.extend(raw(id::CONTINUE, &[4, 5]));
        stream.extend(raw(id::EOF, &[]));

        let recs = records(&stream).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].body, vec![1, 2, 3, 4, 5]);
        assert_eq!(recs[0].seams, vec![3]);
        assert_eq!(recs[1].id, id::EOF);
    }

    #[test]
    fn test_record_longer_than_stream() {
        let mut stream = raw(id::NUMBER, &[0; 4]);
        stream.truncate(6);
        assert!(matches!(records(&stream), Err(XlsError::Truncated { at: 4 })));
    }

    #[test]
    fn test_rk_values() {
        assert_eq!(rk_value((42 << 2) | 0x02), 42.0);
        assert_eq!(rk_value(((-5i32 << 2) as u32) | 0x02), -5.0);
        assert_eq!(rk_value((1250 << 2) | 0x03), 12.5);
        let bits = (45292.0_f64.to_bits() >> 32) as u32;
        assert_eq!(rk_value(bits & !0x03), 45292.0);
    }

    #[test]
    fn test_reads_stop_at_end() {
        let mut bytes = Bytes::new(&[0x34]);
        assert!(bytes.u16().is_err());
        assert_eq!(bytes.position(), 0);
        assert_eq!(bytes.u8().unwrap(), 0x34);
        assert_eq!(bytes.remaining(), 0);
    }

    #[test]
    fn test_strings() {
        let mut bytes = Bytes::new(&[0x03, 0x00, 0x00, b'A', b'B', b'C']);
        assert_eq!(bytes.string().unwrap(), "ABC");

        // "日期" as UTF-16LE
        let mut bytes = Bytes::new(&[0x02, 0x00, 0x01, 0xE5, 0x65, 0x1F, 0x67]);
        assert_eq!(bytes.string().unwrap(), "日期");

        let mut bytes = Bytes::new(&[0x02, 0x00, b'O', b'K']);
        assert_eq!(bytes.short_string().unwrap(), "OK");
    }

    #[test]
    fn test_rich_string_skips_runs() {
        let mut data = vec![0x02, 0x00, 0x08, 0x01, 0x00, b'H', b'i'];
        data.extend_from_slice(&[0, 0, 1, 0]);
        data.extend_from_slice(&[0x01, 0x00, 0x00, b'Z']);
        let mut bytes = Bytes::new(&data);
        assert_eq!(bytes.string().unwrap(), "Hi");
        assert_eq!(bytes.string().unwrap(), "Z");
    }

    #[test]
    fn test_shared_string_split_across_continue() {
        let mut body = 2u32.to_le_bytes().to_vec();
        body.extend_from_slice(&2u32.to_le_bytes());
        body.extend_from_slice(&[0x01, 0x00, 0x00, b'x']);
        // "ab" compressed, then the seam switches to UTF-16 for "日"
        body.extend_from_slice(&[0x03, 0x00, 0x00, b'a', b'b']);
        let seam = body.len();
        body.extend_from_slice(&[0x01, 0xE5, 0x65]);

        let sst = Record {
            id: id::SST,
            body,
            seams: vec![seam],
        };
        let strings = shared_strings(&sst).unwrap();
        assert_eq!(strings, vec![Arc::<str>::from("x"), Arc::from("ab日")]);
    }

    #[test]
    fn test_short_shared_string_table() {
        let mut body = 3u32.to_le_bytes().to_vec();
        body.extend_from_slice(&3u32.to_le_bytes());
        body.extend_from_slice(&[0x01, 0x00, 0x00, b'q', 0x09, 0x00]);
        let sst = Record {
            id: id::SST,
            body,
            seams: Vec::new(),
        };
        assert_eq!(shared_strings(&sst).unwrap().len(), 1);
    }
}
