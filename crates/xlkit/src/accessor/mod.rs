//! Cursor-based workbook accessor
//!
//! A [`SheetAccessor`] owns one workbook and addresses one worksheet of it
//! at a time. Reads and writes default to the cursor row, which the caller
//! moves explicitly with [`SheetAccessor::next_row`] and friends.
//!
//! # Example
//!
//! ```rust
//! use xlkit::SheetAccessor;
//!
//! let mut sheet = SheetAccessor::new_excel();
//! sheet.title(["Name", "Age"]).unwrap();
//! sheet.next_row();
//! sheet.write_row(["Ada", "36"]).unwrap();
//!
//! assert_eq!(sheet.read_at(1, 0).as_deref(), Some("Ada"));
//! assert_eq!(sheet.row_count(), 2);
//! ```

mod input;
mod options;
mod text;

pub use input::CellInput;
pub use options::AccessorOptions;
pub use text::{remove_zero, round_to};

use std::fmt::{self, Write as _};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::{Path, PathBuf};

use http::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use http::Response;
use rust_decimal::prelude::ToPrimitive;
use xlkit_core::date::{datetime_to_serial, serial_to_datetime};
use xlkit_core::{
    CellRange, CellValue, FormulaResult, HorizontalAlignment, Style, VerticalAlignment, Workbook,
    Worksheet, MAX_COLS,
};
use xlkit_xlsx::{XlsxReader, XlsxWriter};

use crate::error::{AccessorError, AccessorResult};
use crate::source::{file_uri_to_path, sniff_format, SourceFormat, UploadedFile};
use text::{cached_number, plain_decimal, plain_integer, with_fraction, written_number};

/// Status of an accessor whose workbook is ready
pub const STATUS_OK: u16 = 200;

/// Status of an accessor that failed to load
pub const STATUS_FAILED: u16 = 500;

/// Horizontal placement applied by a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Centered and wrapped
    Centered,
    /// Left aligned, wrap kept from the base style
    Left,
}

impl Placement {
    fn apply(self, mut style: Style) -> Style {
        match self {
            Placement::Centered => {
                style.horizontal = HorizontalAlignment::Center;
                style.wrap_text = true;
            }
            Placement::Left => style.horizontal = HorizontalAlignment::Left,
        }
        style
    }
}

/// Spreadsheet accessor over one workbook with a row cursor
pub struct SheetAccessor {
    workbook: Option<Workbook>,
    sheet_index: usize,
    current_row: u32,
    status: u16,
    default_style: Style,
    options: AccessorOptions,
    load_error: Option<AccessorError>,
}

impl SheetAccessor {
    // ==================== Construction ====================

    /// Create an accessor over a blank workbook with one worksheet
    pub fn new_excel() -> Self {
        Self::from_workbook(Workbook::new())
    }

    /// Wrap an existing workbook
    pub fn from_workbook(workbook: Workbook) -> Self {
        let mut accessor = Self::blank();
        accessor.workbook = Some(workbook);
        accessor.init();
        accessor
    }

    /// Replace the accessor's options
    pub fn with_options(mut self, options: AccessorOptions) -> Self {
        self.options = options;
        self
    }

    /// Load a workbook from a local path.
    ///
    /// Fails only when the file cannot be opened. A file that opens but does
    /// not parse yields an accessor with [`load_success`](Self::load_success)
    /// false.
    pub fn load_path<P: AsRef<Path>>(path: P) -> AccessorResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| AccessorError::SourceOpen {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loading workbook from {}", path.display());
        Ok(Self::load_file(file))
    }

    /// Load a workbook from an open file
    pub fn load_file(file: File) -> Self {
        Self::load_reader(BufReader::new(file))
    }

    /// Load a workbook from an uploaded file
    pub fn load_upload<U: UploadedFile + ?Sized>(upload: &U) -> AccessorResult<Self> {
        let bytes = upload.bytes().map_err(|source| AccessorError::SourceOpen {
            path: PathBuf::from(upload.original_filename().unwrap_or("<upload>")),
            source,
        })?;
        Ok(Self::load_bytes(&bytes))
    }

    /// Load a workbook from a local `file:` URI
    pub fn load_uri(uri: &str) -> AccessorResult<Self> {
        let path = file_uri_to_path(uri)?;
        Self::load_path(path)
    }

    /// Load a workbook from an in-memory buffer
    pub fn load_bytes(bytes: &[u8]) -> Self {
        Self::load_reader(Cursor::new(bytes))
    }

    /// Load a workbook from any seekable stream, sniffing its format
    pub fn load_reader<R: Read + Seek>(reader: R) -> Self {
        match parse_workbook(reader) {
            Ok(workbook) => Self::from_workbook(workbook),
            Err(e) => {
                log::warn!("failed to load workbook: {e}");
                let mut accessor = Self::blank();
                accessor.load_error = Some(e);
                accessor
            }
        }
    }

    fn blank() -> Self {
        Self {
            workbook: None,
            sheet_index: 0,
            current_row: 0,
            status: STATUS_FAILED,
            default_style: Style::default(),
            options: AccessorOptions::default(),
            load_error: None,
        }
    }

    fn init(&mut self) {
        if let Some(workbook) = self.workbook.as_mut() {
            for sheet in workbook.sheets_mut() {
                sheet.set_force_formula_recalculation(true);
            }
        }
        self.default_style = Style::new()
            .wrap(true)
            .horizontal(HorizontalAlignment::Center)
            .vertical(VerticalAlignment::Center);
        self.status = STATUS_OK;
    }

    // ==================== State ====================

    /// Whether a workbook was created or loaded
    pub fn load_success(&self) -> bool {
        self.status == STATUS_OK && self.workbook.is_some()
    }

    /// [`STATUS_OK`] once initialized, [`STATUS_FAILED`] otherwise
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Why loading failed, if it did
    pub fn load_error(&self) -> Option<&AccessorError> {
        self.load_error.as_ref()
    }

    /// Turn a failed load into its error
    pub fn into_loaded(mut self) -> AccessorResult<Self> {
        if let Some(e) = self.load_error.take() {
            return Err(e);
        }
        if !self.load_success() {
            return Err(AccessorError::NotLoaded);
        }
        Ok(self)
    }

    pub fn options(&self) -> &AccessorOptions {
        &self.options
    }

    /// Style new cells start from: centered both ways, wrapped
    pub fn default_style(&self) -> &Style {
        &self.default_style
    }

    pub fn workbook(&self) -> Option<&Workbook> {
        self.workbook.as_ref()
    }

    /// The worksheet reads and writes address
    pub fn worksheet(&self) -> Option<&Worksheet> {
        self.workbook.as_ref()?.sheet(self.sheet_index)
    }

    fn sheet_mut(&mut self) -> AccessorResult<&mut Worksheet> {
        let index = self.sheet_index;
        self.workbook
            .as_mut()
            .ok_or(AccessorError::NotLoaded)?
            .sheet_mut(index)
            .ok_or(AccessorError::SheetNotFound(index))
    }

    fn date_1904(&self) -> bool {
        self.workbook.as_ref().is_some_and(Workbook::date_1904)
    }

    // ==================== Reading ====================

    /// Read a cell of the cursor row as text
    pub fn read(&self, col: u16) -> Option<String> {
        self.read_at(self.current_row, col)
    }

    /// Read a cell as text.
    ///
    /// Numbers are rounded to an integer, ties to even. Blank and error
    /// cells, and absent rows or cells, read as `None`. Formula cells read
    /// as their cached result.
    pub fn read_at(&self, row: u32, col: u16) -> Option<String> {
        render_value(self.worksheet()?.value(row, col)?)
    }

    /// Read a cell of the cursor row, rendering date-formatted numbers as dates
    pub fn read_date(&self, col: u16) -> Option<String> {
        self.read_date_at(self.current_row, col)
    }

    /// Read a cell, rendering date-formatted numbers as dates.
    ///
    /// The pattern is picked from the number format id: 20 and 32 are
    /// times, 14, 31, 57 and 58 are dates, any other date format is a full
    /// date-time. Numbers without a date format, and date-formatted serials
    /// with no calendar date (negative ones), are written out in full.
    pub fn read_date_at(&self, row: u32, col: u16) -> Option<String> {
        let sheet = self.worksheet()?;
        match sheet.value(row, col)? {
            CellValue::Number(n) => {
                let style = sheet.style(row, col);
                if style.is_date() {
                    self.render_date(*n, style.number_format.id())
                } else {
                    Some(plain_decimal(*n))
                }
            }
            other => render_value(other),
        }
    }

    fn render_date(&self, serial: f64, format_id: u32) -> Option<String> {
        let Some(dt) = serial_to_datetime(serial, self.date_1904()) else {
            log::debug!("serial {serial} has no calendar date, reading it as a number");
            return Some(plain_decimal(serial));
        };
        let pattern = match format_id {
            20 | 32 => &self.options.time_pattern,
            14 | 31 | 57 | 58 => &self.options.date_pattern,
            _ => &self.options.datetime_pattern,
        };
        render_pattern(dt.format(pattern), pattern).ok()
    }

    /// Read a number from the cursor row
    pub fn read_number(&self, col: u16) -> f64 {
        self.read_number_at(self.current_row, col)
    }

    /// Read a number; absent and non-numeric cells read as 0
    pub fn read_number_at(&self, row: u32, col: u16) -> f64 {
        let Some(value) = self.worksheet().and_then(|ws| ws.value(row, col)) else {
            return 0.0;
        };
        value.number().unwrap_or_else(|| {
            log::debug!("cell ({row}, {col}) holds a {} value, reading 0", value.kind());
            0.0
        })
    }

    // ==================== Writing ====================

    /// Write to the cursor row, centered and wrapped
    pub fn write<V: Into<CellInput>>(&mut self, col: u16, value: V) -> AccessorResult<&mut Self> {
        let row = self.current_row;
        self.write_at(row, col, value)
    }

    /// Write a cell, centered and wrapped.
    ///
    /// A [`CellInput::Null`] value leaves the sheet untouched. An
    /// [`CellInput::Unsupported`] value is logged and skipped.
    pub fn write_at<V: Into<CellInput>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> AccessorResult<&mut Self> {
        self.put(row, col, value.into(), Placement::Centered)?;
        Ok(self)
    }

    /// Write to the cursor row, left aligned
    pub fn write_left<V: Into<CellInput>>(
        &mut self,
        col: u16,
        value: V,
    ) -> AccessorResult<&mut Self> {
        let row = self.current_row;
        self.write_left_at(row, col, value)
    }

    /// Write a cell, left aligned.
    ///
    /// Text values also have trailing zeros stripped, see [`remove_zero`].
    pub fn write_left_at<V: Into<CellInput>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> AccessorResult<&mut Self> {
        self.put(row, col, value.into(), Placement::Left)?;
        Ok(self)
    }

    /// Write values into the cursor row starting at column 0.
    ///
    /// Null entries are skipped but still take up their column.
    pub fn write_row<I, V>(&mut self, values: I) -> AccessorResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellInput>,
    {
        let row = self.current_row;
        for (i, value) in values.into_iter().enumerate() {
            self.put(row, column_index(i)?, value.into(), Placement::Centered)?;
        }
        Ok(self)
    }

    /// Write a header row into row 0 and size each column to its header
    pub fn title<I, V>(&mut self, values: I) -> AccessorResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellInput>,
    {
        let factor = self.options.title_width_factor;
        let mut widths = Vec::new();
        for (i, value) in values.into_iter().enumerate() {
            let value = value.into();
            let width = match self.header_text(&value)? {
                Some(text) => (text.chars().count() as u32).saturating_mul(factor),
                None => 0,
            };
            self.put(0, column_index(i)?, value, Placement::Centered)?;
            widths.push(width);
        }
        self.set_widths(&widths)
    }

    /// Reset a cell to blank, creating it if needed
    pub fn set_blank(&mut self, row: u32, col: u16) -> AccessorResult<&mut Self> {
        self.sheet_mut()?.set_blank(row, col)?;
        Ok(self)
    }

    fn put(
        &mut self,
        row: u32,
        col: u16,
        input: CellInput,
        placement: Placement,
    ) -> AccessorResult<()> {
        if input.is_null() {
            return Ok(());
        }
        let sheet = self.worksheet().ok_or(AccessorError::NotLoaded)?;
        let base = match sheet.cell(row, col) {
            Some(_) => sheet.style(row, col).clone(),
            None => self.default_style.clone(),
        };

        let Some(value) = self.cell_value(&input, placement)? else {
            return Ok(());
        };
        let style = placement.apply(base);
        self.sheet_mut()?.set_cell(row, col, value, &style)?;
        Ok(())
    }

    /// The stored form of a written value; `None` means nothing is written
    fn cell_value(
        &self,
        input: &CellInput,
        placement: Placement,
    ) -> AccessorResult<Option<CellValue>> {
        let value = match input {
            CellInput::Null => return Ok(None),
            CellInput::Double(v) => CellValue::text(written_number(*v)),
            CellInput::Float(v) => CellValue::text(written_number(round_to(f64::from(*v), 2))),
            CellInput::Decimal(d) => match d.to_f64() {
                Some(v) => CellValue::text(written_number(v)),
                None => {
                    log::error!("{d} has no double form, not written");
                    return Ok(None);
                }
            },
            CellInput::Int(v) => CellValue::Number(f64::from(*v)),
            CellInput::Long(v) => CellValue::Number(*v as f64),
            CellInput::Timestamp(dt) => match datetime_to_serial(*dt, self.date_1904()) {
                Some(serial) => CellValue::Number(serial),
                None => {
                    log::error!("{dt} precedes the workbook's date system, not written");
                    return Ok(None);
                }
            },
            CellInput::Bool(b) => CellValue::Bool(*b),
            CellInput::Char(c) => CellValue::text(c.to_string()),
            CellInput::Text(s) if placement == Placement::Left => CellValue::text(remove_zero(s)),
            CellInput::Text(s) => CellValue::text(s.as_str()),
            CellInput::Date(d) => {
                let pattern = &self.options.date_pattern;
                CellValue::text(render_pattern(d.format(pattern), pattern)?)
            }
            CellInput::DateTime(dt) => {
                let pattern = &self.options.datetime_pattern;
                CellValue::text(render_pattern(dt.format(pattern), pattern)?)
            }
            CellInput::Unsupported(type_name) => {
                log::error!("cannot write a value of type {type_name} into a cell");
                return Ok(None);
            }
        };
        Ok(Some(value))
    }

    /// Text a title cell is sized by
    fn header_text(&self, input: &CellInput) -> AccessorResult<Option<String>> {
        let text = match input {
            CellInput::Null => return Ok(None),
            CellInput::Text(s) => s.clone(),
            CellInput::Double(v) => with_fraction(v.to_string()),
            CellInput::Float(v) => with_fraction(v.to_string()),
            CellInput::Decimal(d) => d.to_string(),
            CellInput::Int(v) => v.to_string(),
            CellInput::Long(v) => v.to_string(),
            CellInput::Bool(b) => b.to_string(),
            CellInput::Char(c) => c.to_string(),
            CellInput::Timestamp(dt) => {
                let pattern = &self.options.datetime_pattern;
                render_pattern(dt.format(pattern), pattern)?
            }
            CellInput::Unsupported(type_name) => type_name.to_string(),
            other => match self.cell_value(other, Placement::Centered)? {
                Some(CellValue::Text(s)) => s.to_string(),
                _ => String::new(),
            },
        };
        Ok(Some(text))
    }

    // ==================== Layout ====================

    /// Set a column's width in characters
    pub fn set_width(&mut self, col: u16, count: u32) -> AccessorResult<&mut Self> {
        self.sheet_mut()?.set_column_width(col, f64::from(count))?;
        Ok(self)
    }

    /// Set the widths of columns `0..counts.len()` in characters
    pub fn set_widths(&mut self, counts: &[u32]) -> AccessorResult<&mut Self> {
        let sheet = self.sheet_mut()?;
        for (i, count) in counts.iter().enumerate() {
            sheet.set_column_width(column_index(i)?, f64::from(*count))?;
        }
        Ok(self)
    }

    /// Record a merged region.
    ///
    /// Overlaps with existing regions are not checked. Returns `false` only
    /// when there is no workbook or the region lies outside the sheet.
    pub fn merge(&mut self, start_row: u32, end_row: u32, start_col: u16, end_col: u16) -> bool {
        let range = CellRange::new(start_row, end_row, start_col, end_col);
        match self.sheet_mut() {
            Ok(sheet) => match sheet.add_merged_region(range) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("merge {range} rejected: {e}");
                    false
                }
            },
            Err(_) => false,
        }
    }

    /// Merge `height` rows down from the cursor row in each of `cols`
    pub fn merge_y(&mut self, height: u32, cols: &[u16]) -> AccessorResult<&mut Self> {
        if height <= 1 {
            return Ok(self);
        }
        let start = self.current_row;
        let end = start.saturating_add(height - 1);
        let sheet = self.sheet_mut()?;
        for &col in cols {
            sheet.add_merged_region(CellRange::new(start, end, col, col))?;
        }
        Ok(self)
    }

    /// Set the cursor row's height in twips (1/20 point).
    ///
    /// Negative values restore the default height. The row is created if
    /// absent.
    pub fn set_row_height(&mut self, twips: i16) -> AccessorResult<&mut Self> {
        let row = self.current_row;
        let height = (twips >= 0).then(|| f64::from(twips) / 20.0);
        self.sheet_mut()?.set_row_height(row, height)?;
        Ok(self)
    }

    /// Insert an empty row at the cursor
    pub fn insert_rows(&mut self) -> AccessorResult<&mut Self> {
        let row = self.current_row;
        self.insert_rows_at(row)
    }

    /// Insert an empty row at `index`, shifting any rows from there down by one
    pub fn insert_rows_at(&mut self, index: u32) -> AccessorResult<&mut Self> {
        let sheet = self.sheet_mut()?;
        if sheet.has_row(index) {
            if let Some(last) = sheet.last_row() {
                sheet.shift_rows(index, last, 1)?;
            }
        }
        sheet.create_row(index)?;
        Ok(self)
    }

    // ==================== Navigation ====================

    /// Move the cursor down one row
    pub fn next_row(&mut self) -> &mut Self {
        self.current_row = self.current_row.saturating_add(1);
        self
    }

    /// Move the cursor by `delta` rows, stopping at row 0
    pub fn next_rows(&mut self, delta: i64) -> &mut Self {
        let target = i64::from(self.current_row).saturating_add(delta);
        self.current_row = target.clamp(0, i64::from(u32::MAX)) as u32;
        self
    }

    /// Whether a row exists just below the cursor
    pub fn has_next_row(&self) -> bool {
        match (self.worksheet(), self.current_row.checked_add(1)) {
            (Some(sheet), Some(next)) => sheet.has_row(next),
            _ => false,
        }
    }

    /// Switch to the second worksheet and rewind the cursor
    pub fn next_sheet(&mut self) -> AccessorResult<&mut Self> {
        let workbook = self.workbook.as_ref().ok_or(AccessorError::NotLoaded)?;
        if workbook.sheet(1).is_none() {
            return Err(AccessorError::SheetNotFound(1));
        }
        self.sheet_index = 1;
        self.current_row = 0;
        Ok(self)
    }

    /// Number of rows physically present in the worksheet
    pub fn row_count(&self) -> usize {
        self.worksheet().map_or(0, |sheet| sheet.row_count())
    }

    pub fn current_row(&self) -> u32 {
        self.current_row
    }

    pub fn set_current_row(&mut self, row: u32) -> &mut Self {
        self.current_row = row;
        self
    }

    pub fn sheet_index(&self) -> usize {
        self.sheet_index
    }

    // ==================== Export ====================

    /// Write the workbook as an `.xlsx` attachment into a response body.
    ///
    /// Nothing else should be written to the body afterwards.
    pub fn export_response<B: Write>(
        self,
        file_name: &str,
        response: &mut Response<B>,
    ) -> AccessorResult<()> {
        let workbook = self.workbook.ok_or(AccessorError::NotLoaded)?;

        let disposition = format!(
            "attachment; filename={}{}",
            urlencoding::encode(file_name),
            self.options.file_suffix
        );
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(&self.options.content_type)?);
        headers.insert(CONTENT_DISPOSITION, HeaderValue::from_str(&disposition)?);

        let mut buffer = Cursor::new(Vec::new());
        XlsxWriter::write(&workbook, &mut buffer)?;
        drop(workbook);

        let body = response.body_mut();
        body.write_all(buffer.get_ref())?;
        body.flush()?;
        log::debug!("exported {} bytes as {disposition}", buffer.get_ref().len());
        Ok(())
    }

    /// Write the workbook to `path` plus the `.xlsx` suffix, creating parent
    /// directories. Returns the path written.
    pub fn export_file<P: AsRef<Path>>(self, path: P) -> AccessorResult<PathBuf> {
        let workbook = self.workbook.ok_or(AccessorError::NotLoaded)?;

        let mut target = path.as_ref().as_os_str().to_owned();
        target.push(&self.options.file_suffix);
        let target = PathBuf::from(target);

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| AccessorError::OutputOpen {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = File::create(&target).map_err(|source| AccessorError::OutputOpen {
            path: target.clone(),
            source,
        })?;

        let mut writer = BufWriter::new(file);
        XlsxWriter::write(&workbook, &mut writer)?;
        writer.flush()?;
        log::debug!("exported workbook to {}", target.display());
        Ok(target)
    }

    /// Write the workbook as `.xlsx` into any seekable sink
    pub fn export_writer<W: Write + Seek>(self, writer: W) -> AccessorResult<()> {
        let workbook = self.workbook.ok_or(AccessorError::NotLoaded)?;
        XlsxWriter::write(&workbook, writer)?;
        Ok(())
    }
}

impl fmt::Debug for SheetAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetAccessor")
            .field("loaded", &self.workbook.is_some())
            .field("sheet_index", &self.sheet_index)
            .field("current_row", &self.current_row)
            .field("status", &self.status)
            .field("load_error", &self.load_error)
            .finish()
    }
}

/// Copy a stream into a local file, returning the bytes copied
pub fn copy_to_local<P: AsRef<Path>, R: Read>(path: P, mut reader: R) -> io::Result<u64> {
    let mut file = BufWriter::new(File::create(path)?);
    let copied = io::copy(&mut reader, &mut file)?;
    file.flush()?;
    Ok(copied)
}

fn parse_workbook<R: Read + Seek>(mut reader: R) -> AccessorResult<Workbook> {
    match sniff_format(&mut reader)? {
        Some(SourceFormat::Xlsx) => Ok(XlsxReader::read(reader)?),
        #[cfg(feature = "xls")]
        Some(SourceFormat::Xls) => Ok(xlkit_xls::XlsReader::read(reader)?),
        #[cfg(not(feature = "xls"))]
        Some(SourceFormat::Xls) => Err(AccessorError::UnknownFormat(
            "legacy .xls support is not enabled".into(),
        )),
        None => Err(AccessorError::UnknownFormat(
            "neither a zip package nor a compound file".into(),
        )),
    }
}

fn render_value(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Number(n) => Some(plain_integer(*n)),
        CellValue::Text(s) => Some(s.to_string()),
        CellValue::Bool(b) => Some(b.to_string()),
        CellValue::Formula { result, .. } => match result {
            Some(FormulaResult::Number(n)) => Some(cached_number(*n)),
            Some(FormulaResult::Text(s)) => Some(s.clone()),
            Some(FormulaResult::Bool(b)) => Some(b.to_string()),
            Some(FormulaResult::Error(_)) | None => None,
        },
        CellValue::Blank | CellValue::Error(_) => None,
    }
}

/// Render a chrono formatter, rejecting malformed patterns
fn render_pattern(formatted: impl fmt::Display, pattern: &str) -> AccessorResult<String> {
    let mut out = String::new();
    write!(out, "{formatted}").map_err(|_| AccessorError::InvalidPattern(pattern.to_string()))?;
    Ok(out)
}

fn column_index(i: usize) -> AccessorResult<u16> {
    u16::try_from(i)
        .ok()
        .filter(|col| *col < MAX_COLS)
        .ok_or(AccessorError::Core(xlkit_core::Error::ColumnOutOfRange(i as u64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use xlkit_core::NumberFormat;

    #[test]
    fn test_new_excel_is_initialized() {
        let sheet = SheetAccessor::new_excel();
        assert!(sheet.load_success());
        assert_eq!(sheet.status(), STATUS_OK);
        assert!(sheet.worksheet().unwrap().force_formula_recalculation());

        let style = sheet.default_style();
        assert_eq!(style.horizontal, HorizontalAlignment::Center);
        assert_eq!(style.vertical, VerticalAlignment::Center);
        assert!(style.wrap_text);
    }

    #[test]
    fn test_write_value_forms() {
        let mut sheet = SheetAccessor::new_excel();
        sheet
            .write(0, 12.50)
            .unwrap()
            .write(1, 1.005f32)
            .unwrap()
            .write(2, 42)
            .unwrap()
            .write(3, true)
            .unwrap()
            .write(4, 'x')
            .unwrap()
            .write(5, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
            .unwrap();

        let ws = sheet.worksheet().unwrap();
        assert_eq!(ws.value(0, 0), Some(&CellValue::text("12.5")));
        assert_eq!(ws.value(0, 1), Some(&CellValue::text("1")));
        assert_eq!(ws.value(0, 2), Some(&CellValue::Number(42.0)));
        assert_eq!(ws.value(0, 3), Some(&CellValue::Bool(true)));
        assert_eq!(ws.value(0, 4), Some(&CellValue::text("x")));
        assert_eq!(ws.value(0, 5), Some(&CellValue::text("2024-03-09")));
    }

    #[test]
    fn test_write_uses_existing_cell_style() {
        let mut sheet = SheetAccessor::new_excel();
        let dated = Style::new().number_format(NumberFormat::Builtin(14));
        sheet
            .sheet_mut()
            .unwrap()
            .set_cell(0, 0, 1.0, &dated)
            .unwrap();

        sheet.write_left_at(0, 0, 45000).unwrap();
        let style = sheet.worksheet().unwrap().style(0, 0);
        assert_eq!(style.number_format, NumberFormat::Builtin(14));
        assert_eq!(style.horizontal, HorizontalAlignment::Left);
        assert!(!style.wrap_text);
    }

    #[test]
    fn test_unsupported_value_is_skipped() {
        let mut sheet = SheetAccessor::new_excel();
        sheet.write(0, CellInput::unsupported::<Vec<u8>>()).unwrap();
        assert!(sheet.worksheet().unwrap().cell(0, 0).is_none());
    }

    #[test]
    fn test_unloaded_accessor() {
        let mut sheet = SheetAccessor::load_bytes(b"not a workbook");
        assert!(!sheet.load_success());
        assert_eq!(sheet.status(), STATUS_FAILED);
        assert!(sheet.load_error().unwrap().is_parse_failure());
        assert_eq!(sheet.read(0), None);
        assert_eq!(sheet.read_number(0), 0.0);
        assert!(!sheet.merge(0, 1, 0, 1));
        assert!(matches!(sheet.write(0, 1), Err(AccessorError::NotLoaded)));
        // null writes never touch the workbook
        assert!(sheet.write(0, CellInput::Null).is_ok());
    }

    #[test]
    fn test_decimal_writes_through_double() {
        let mut sheet = SheetAccessor::new_excel();
        let price: Decimal = "12.50".parse().unwrap();
        let third: Decimal = "0.3333333333333333333333333333".parse().unwrap();
        sheet.write(0, price).unwrap().write(1, third).unwrap();

        let ws = sheet.worksheet().unwrap();
        assert_eq!(ws.value(0, 0), Some(&CellValue::text("12.5")));
        assert_eq!(ws.value(0, 1), Some(&CellValue::text("0.3333333333333333")));
    }

    #[test]
    fn test_title_widths_follow_value_text() {
        let mut sheet = SheetAccessor::new_excel();
        let scaled: Decimal = "1.50".parse().unwrap();
        sheet
            .title(vec![
                CellInput::from(12.0),
                CellInput::from(2.5f32),
                CellInput::from(scaled),
                CellInput::from(7),
            ])
            .unwrap();

        let ws = sheet.worksheet().unwrap();
        assert_eq!(ws.column_width(0), 12.0);
        assert_eq!(ws.column_width(1), 9.0);
        assert_eq!(ws.column_width(2), 12.0);
        assert_eq!(ws.column_width(3), 3.0);
        assert_eq!(ws.value(0, 0), Some(&CellValue::text("12")));
    }

    #[test]
    fn test_negative_date_serial_reads_as_number() {
        let mut sheet = SheetAccessor::new_excel();
        let dated = Style::new().number_format(NumberFormat::Builtin(14));
        let ws = sheet.sheet_mut().unwrap();
        ws.set_cell(0, 0, -1.5, &dated).unwrap();
        ws.set_cell(0, 1, 45292.0, &dated).unwrap();

        assert_eq!(sheet.read_date(0).as_deref(), Some("-1.5"));
        assert_eq!(sheet.read_date(1).as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_next_rows_saturates() {
        let mut sheet = SheetAccessor::new_excel();
        sheet.next_rows(3);
        assert_eq!(sheet.current_row(), 3);
        sheet.next_rows(-10);
        assert_eq!(sheet.current_row(), 0);
    }

    #[test]
    fn test_column_index_limit() {
        assert_eq!(column_index(5).unwrap(), 5);
        assert!(column_index(MAX_COLS as usize).is_err());
        assert!(column_index(70_000).is_err());
    }
}
