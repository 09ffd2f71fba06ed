//! Reads the `Workbook` stream of a compound file into a [`Workbook`]

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use xlkit_core::{
    CellRange, CellRef, CellValue, ErrorValue, FormulaResult, Style, Workbook, Worksheet, MAX_COLS,
};

use crate::biff::{self, id, Bytes, Record};
use crate::error::{XlsError, XlsResult};
use crate::xf;

pub struct XlsReader;

impl XlsReader {
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsResult<Workbook> {
        Self::read(BufReader::new(File::open(path)?))
    }

    pub fn read<R: Read + Seek>(input: R) -> XlsResult<Workbook> {
        let mut container = cfb::CompoundFile::open(input)?;
        // BIFF5 names the stream "Book"; it fails the version check
        let name = ["/Workbook", "/Book"]
            .into_iter()
            .find(|name| container.exists(name))
            .ok_or(XlsError::NoWorkbookStream)?;
        let mut stream = Vec::new();
        container.open_stream(name)?.read_to_end(&mut stream)?;

        let records = biff::records(&stream)?;
        let (globals, rest) = Globals::read(&records)?;

        let mut workbook = Workbook::empty();
        workbook.set_date_1904(globals.date_1904);

        let mut bodies = substreams(rest);
        for entry in &globals.sheets {
            // One substream per BOUNDSHEET, charts and macro sheets included
            let body = bodies.next();
            if entry.kind != 0 {
                log::debug!("skipping non-worksheet '{}'", entry.name);
                continue;
            }
            let sheet = workbook.add_sheet(&entry.name)?;
            sheet.set_visible(entry.visibility == 0);
            let mut builder = SheetBuilder {
                sheet,
                globals: &globals,
                awaiting_text: None,
            };
            for record in body.unwrap_or_default() {
                builder.apply(record)?;
            }
        }

        if workbook.sheet_count() == 0 {
            workbook.add_sheet("Sheet1")?;
        }
        log::debug!(
            "read {} sheet(s) and {} shared strings from BIFF8",
            workbook.sheet_count(),
            globals.strings.len()
        );
        Ok(workbook)
    }
}

/// A BOUNDSHEET entry
struct SheetEntry {
    name: String,
    /// 0 visible, 1 hidden, 2 very hidden
    visibility: u8,
    /// 0 worksheet, 2 chart, 6 macro sheet
    kind: u8,
}

/// What the globals substream tells the sheets
struct Globals {
    date_1904: bool,
    strings: Vec<Arc<str>>,
    styles: Vec<Style>,
    sheets: Vec<SheetEntry>,
}

impl Globals {
    /// Read up to the globals' EOF; returns the records after it
    fn read(records: &[Record]) -> XlsResult<(Self, &[Record])> {
        let mut globals = Globals {
            date_1904: false,
            strings: Vec::new(),
            styles: Vec::new(),
            sheets: Vec::new(),
        };
        let mut formats = HashMap::new();
        let mut xfs = Vec::new();

        for (i, record) in records.iter().enumerate() {
            match record.id {
                id::BOF => {
                    let mut bytes = record.bytes();
                    let version = bytes.u16()?;
                    if bytes.u16()? == biff::GLOBALS && version != biff::BIFF8 {
                        return Err(XlsError::NotBiff8(version));
                    }
                }
                id::EOF => {
                    globals.styles = xf::styles(&xfs, &formats);
                    return Ok((globals, &records[i + 1..]));
                }
                id::DATEMODE => globals.date_1904 = record.bytes().u16()? == 1,
                id::SST => globals.strings = biff::shared_strings(record)?,
                id::BOUNDSHEET => {
                    let mut bytes = record.bytes();
                    bytes.skip(4)?;
                    let visibility = bytes.u8()?;
                    let kind = bytes.u8()?;
                    globals.sheets.push(SheetEntry {
                        visibility,
                        kind,
                        name: bytes.short_string()?,
                    });
                }
                id::FORMAT => match xf::read_format(&record.body) {
                    Ok((id, code)) => {
                        formats.insert(id, code);
                    }
                    Err(e) => log::warn!("ignoring FORMAT record: {e}"),
                },
                id::XF => match xf::read_xf(&record.body) {
                    Ok(parsed) => xfs.push(parsed),
                    Err(e) => log::warn!("ignoring XF record: {e}"),
                },
                _ => {}
            }
        }
        Err(XlsError::UnterminatedGlobals)
    }
}

/// Bodies of the BOF..EOF substreams, nested ones (chart objects) included
/// in their parent
fn substreams(records: &[Record]) -> impl Iterator<Item = &[Record]> {
    let mut depth = 0usize;
    let mut start = 0;
    let mut bodies = Vec::new();
    for (i, record) in records.iter().enumerate() {
        match record.id {
            id::BOF => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            id::EOF if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    bodies.push(&records[start..i]);
                }
            }
            _ => {}
        }
    }
    bodies.into_iter()
}

/// Cell position and XF index heading every cell record
fn cell_header(bytes: &mut Bytes<'_>) -> XlsResult<(u32, u16, u16)> {
    Ok((u32::from(bytes.u16()?), bytes.u16()?, bytes.u16()?))
}

/// Replays one worksheet substream onto a sheet
struct SheetBuilder<'a> {
    sheet: &'a mut Worksheet,
    globals: &'a Globals,
    /// Formula cell whose text result arrives in the next STRING record
    awaiting_text: Option<CellRef>,
}

impl SheetBuilder<'_> {
    fn put(&mut self, row: u32, col: u16, xf: u16, value: CellValue) -> XlsResult<()> {
        let fallback = Style::default();
        let style = self.globals.styles.get(usize::from(xf)).unwrap_or_else(|| {
            log::debug!("cell {} names missing XF {xf}", CellRef::new(row, col));
            &fallback
        });
        self.sheet.set_cell(row, col, value, style)?;
        Ok(())
    }

    fn apply(&mut self, record: &Record) -> XlsResult<()> {
        let mut bytes = record.bytes();
        if record.id != id::STRING {
            self.awaiting_text = None;
        }

        match record.id {
            id::LABELSST => {
                let (row, col, xf) = cell_header(&mut bytes)?;
                let index = bytes.u32()? as usize;
                match self.globals.strings.get(index) {
                    Some(text) => self.put(row, col, xf, CellValue::Text(Arc::clone(text)))?,
                    None => log::warn!("shared string {index} does not exist"),
                }
            }
            id::LABEL => {
                let (row, col, xf) = cell_header(&mut bytes)?;
                let text = bytes.string()?;
                self.put(row, col, xf, CellValue::text(text))?;
            }
            id::NUMBER => {
                let (row, col, xf) = cell_header(&mut bytes)?;
                let n = bytes.f64()?;
                self.put(row, col, xf, CellValue::Number(n))?;
            }
            id::RK => {
                let (row, col, xf) = cell_header(&mut bytes)?;
                let n = bytes.rk()?;
                self.put(row, col, xf, CellValue::Number(n))?;
            }
            id::BLANK => {
                let (row, col, xf) = cell_header(&mut bytes)?;
                self.put(row, col, xf, CellValue::Blank)?;
            }
            // row, first col, (xf, rk)*, last col
            id::MULRK => {
                let row = u32::from(bytes.u16()?);
                let mut col = bytes.u16()?;
                while bytes.remaining() >= 8 {
                    let xf = bytes.u16()?;
                    let n = bytes.rk()?;
                    self.put(row, col, xf, CellValue::Number(n))?;
                    col += 1;
                }
            }
            // row, first col, xf*, last col
            id::MULBLANK => {
                let row = u32::from(bytes.u16()?);
                let mut col = bytes.u16()?;
                while bytes.remaining() >= 4 {
                    let xf = bytes.u16()?;
                    self.put(row, col, xf, CellValue::Blank)?;
                    col += 1;
                }
            }
            id::BOOLERR => {
                let (row, col, xf) = cell_header(&mut bytes)?;
                let (value, is_error) = (bytes.u8()?, bytes.u8()? != 0);
                let value = if is_error {
                    CellValue::Error(ErrorValue::from_code(value).unwrap_or(ErrorValue::Value))
                } else {
                    CellValue::Bool(value != 0)
                };
                self.put(row, col, xf, value)?;
            }
            id::FORMULA => {
                let (row, col, xf) = cell_header(&mut bytes)?;
                let result = formula_result(bytes.raw8()?);
                if result.is_none() {
                    self.awaiting_text = Some(CellRef::new(row, col));
                }
                self.put(row, col, xf, CellValue::formula("", result))?;
            }
            id::STRING => {
                if let Some(at) = self.awaiting_text.take() {
                    let text = bytes.string()?;
                    let value = CellValue::formula("", Some(FormulaResult::Text(text)));
                    self.sheet.set_value(at.row, at.col, value)?;
                }
            }
            id::MERGECELLS => {
                let count = bytes.u16()?;
                for _ in 0..count {
                    let (first_row, last_row) = (bytes.u16()?, bytes.u16()?);
                    let (first_col, last_col) = (bytes.u16()?, bytes.u16()?);
                    self.sheet.add_merged_region(CellRange::new(
                        u32::from(first_row),
                        u32::from(last_row),
                        first_col,
                        last_col,
                    ))?;
                }
            }
            // row, first col, last col + 1, height in twips, 4 reserved, flags
            id::ROW => {
                let row = u32::from(bytes.u16()?);
                self.sheet.create_row(row)?;
                bytes.skip(4)?;
                let height = bytes.u16()? & 0x7FFF;
                bytes.skip(4)?;
                let flags = bytes.u32()?;
                if flags & 0x20 != 0 {
                    self.sheet.set_row_hidden(row, true)?;
                }
                if flags & 0x40 != 0 && height > 0 {
                    self.sheet.set_row_height(row, Some(f64::from(height) / 20.0))?;
                }
            }
            // first col, last col, width in 1/256 characters, xf, flags
            id::COLINFO => {
                let first = bytes.u16()?;
                let last = bytes.u16()?.min(MAX_COLS - 1);
                let width = f64::from(bytes.u16()?) / 256.0;
                bytes.skip(2)?;
                let hidden = bytes.u16()? & 0x0001 != 0;
                for col in first..=last {
                    if width > 0.0 {
                        self.sheet.set_column_width(col, width)?;
                    }
                    if hidden {
                        self.sheet.set_column_hidden(col, true)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Decode `FORMULA.val`. `None` means a text result follows in a STRING
/// record; an empty text result is stored inline.
fn formula_result(raw: [u8; 8]) -> Option<FormulaResult> {
    if raw[6..] != [0xFF, 0xFF] {
        return Some(FormulaResult::Number(f64::from_le_bytes(raw)));
    }
    match raw[0] {
        0x01 => Some(FormulaResult::Bool(raw[2] != 0)),
        0x02 => Some(FormulaResult::Error(
            ErrorValue::from_code(raw[2]).unwrap_or(ErrorValue::Value),
        )),
        0x03 => Some(FormulaResult::Text(String::new())),
        _ => None,
    }
}
