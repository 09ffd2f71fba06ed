//! One worksheet part: rows, cells, columns and merges

use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::xml::{attr, decode_text, flag, parsed};
use xlkit_core::{CellRange, CellRef, CellValue, ErrorValue, FormulaResult, Style, Worksheet, MAX_COLS};

/// Element whose text is being collected
#[derive(Clone, Copy, PartialEq)]
enum Target {
    None,
    Value,
    Formula,
    Inline,
}

/// A `<c>` element seen so far
struct PendingCell {
    at: CellRef,
    kind: Option<String>,
    style: usize,
    value: String,
    formula: Option<String>,
    inline: String,
}

impl PendingCell {
    fn bad(&self, reason: impl Into<String>) -> XlsxError {
        XlsxError::BadCell {
            at: self.at.to_string(),
            reason: reason.into(),
        }
    }

    fn plain_value(&self, strings: &[Arc<str>]) -> XlsxResult<CellValue> {
        let raw = self.value.trim();
        let value = match self.kind.as_deref() {
            Some("inlineStr") => CellValue::text(decode_text(&self.inline)),
            _ if raw.is_empty() => CellValue::Blank,
            Some("s") => {
                let index: usize = raw
                    .parse()
                    .map_err(|_| self.bad(format!("'{raw}' is not a string index")))?;
                let text = strings
                    .get(index)
                    .ok_or_else(|| self.bad(format!("no shared string {index}")))?;
                CellValue::Text(Arc::clone(text))
            }
            Some("b") => CellValue::Bool(matches!(raw, "1" | "true")),
            Some("e") => ErrorValue::parse(raw).map_or_else(|| CellValue::text(raw), CellValue::Error),
            Some("str") => CellValue::text(decode_text(&self.value)),
            None | Some("n") => raw
                .parse()
                .map_or_else(|_| CellValue::text(raw), CellValue::Number),
            Some(other) => {
                log::debug!("cell {} has unknown type '{other}', keeping text", self.at);
                CellValue::text(raw)
            }
        };
        Ok(value)
    }

    fn into_value(self, strings: &[Arc<str>]) -> XlsxResult<CellValue> {
        let plain = self.plain_value(strings)?;
        let Some(expr) = self.formula else {
            return Ok(plain);
        };
        let result = match plain {
            CellValue::Number(n) => Some(FormulaResult::Number(n)),
            CellValue::Text(s) => Some(FormulaResult::Text(s.to_string())),
            CellValue::Bool(b) => Some(FormulaResult::Bool(b)),
            CellValue::Error(e) => Some(FormulaResult::Error(e)),
            _ => None,
        };
        Ok(CellValue::formula(expr, result))
    }
}

struct SheetReader<'a> {
    sheet: &'a mut Worksheet,
    strings: &'a [Arc<str>],
    styles: &'a [Style],
    next_row: u32,
    row: u32,
    next_col: u16,
    cell: Option<PendingCell>,
    target: Target,
    in_phonetic: bool,
}

/// Fill `sheet` from its worksheet part
pub(super) fn read_sheet(
    xml: &[u8],
    sheet: &mut Worksheet,
    strings: &[Arc<str>],
    styles: &[Style],
) -> XlsxResult<()> {
    let mut state = SheetReader {
        sheet,
        strings,
        styles,
        next_row: 0,
        row: 0,
        next_col: 0,
        cell: None,
        target: Target::None,
        in_phonetic: false,
    };
    let mut reader = Reader::from_reader(xml);

    loop {
        match reader.read_event()? {
            Event::Start(e) => state.open(&e, false)?,
            Event::Empty(e) => state.open(&e, true)?,
            Event::Text(t) => {
                let text = t.unescape()?;
                state.push_text(&text);
            }
            Event::CData(c) => state.push_text(&String::from_utf8_lossy(&c)),
            Event::End(e) => match e.local_name().as_ref() {
                b"c" => state.finish_cell()?,
                b"rPh" => state.in_phonetic = false,
                b"v" | b"f" | b"t" => state.target = Target::None,
                _ => {}
            },
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

impl SheetReader<'_> {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> XlsxResult<()> {
        match e.local_name().as_ref() {
            b"row" => self.start_row(e)?,
            b"c" => {
                self.start_cell(e)?;
                if empty {
                    self.finish_cell()?;
                }
            }
            b"v" if !empty => self.target = Target::Value,
            b"f" => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.formula.get_or_insert_with(String::new);
                }
                if !empty {
                    self.target = Target::Formula;
                }
            }
            b"rPh" if !empty => self.in_phonetic = true,
            b"t" if !empty && !self.in_phonetic => self.target = Target::Inline,
            b"col" => self.read_columns(e)?,
            b"sheetCalcPr" => self
                .sheet
                .set_force_formula_recalculation(flag(e, "fullCalcOnLoad")),
            b"mergeCell" => self.read_merge(e)?,
            _ => {}
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        let Some(cell) = self.cell.as_mut() else {
            return;
        };
        match self.target {
            Target::Value => cell.value.push_str(text),
            Target::Formula => cell.formula.get_or_insert_with(String::new).push_str(text),
            Target::Inline => cell.inline.push_str(text),
            Target::None => {}
        }
    }

    fn start_row(&mut self, e: &BytesStart<'_>) -> XlsxResult<()> {
        let row = parsed::<u32>(e, "r")
            .and_then(|r| r.checked_sub(1))
            .unwrap_or(self.next_row);
        self.row = row;
        self.next_row = row.saturating_add(1);
        self.next_col = 0;

        self.sheet.create_row(row)?;
        if flag(e, "customHeight") {
            if let Some(height) = parsed::<f64>(e, "ht") {
                self.sheet.set_row_height(row, Some(height))?;
            }
        }
        if flag(e, "hidden") {
            self.sheet.set_row_hidden(row, true)?;
        }
        Ok(())
    }

    fn start_cell(&mut self, e: &BytesStart<'_>) -> XlsxResult<()> {
        let at = match attr(e, "r") {
            Some(r) => CellRef::parse(&r)?,
            None => CellRef::new(self.row, self.next_col),
        };
        self.next_col = at.col.saturating_add(1);
        self.cell = Some(PendingCell {
            at,
            kind: attr(e, "t"),
            style: parsed(e, "s").unwrap_or(0),
            value: String::new(),
            formula: None,
            inline: String::new(),
        });
        Ok(())
    }

    fn finish_cell(&mut self) -> XlsxResult<()> {
        self.target = Target::None;
        let Some(cell) = self.cell.take() else {
            return Ok(());
        };
        let at = cell.at;
        let style = self.styles.get(cell.style).ok_or_else(|| {
            cell.bad(format!("style {} is not in the style sheet", cell.style))
        })?;
        let value = cell.into_value(self.strings)?;
        self.sheet.set_cell(at.row, at.col, value, style)?;
        Ok(())
    }

    fn read_columns(&mut self, e: &BytesStart<'_>) -> XlsxResult<()> {
        let (Some(min), Some(max)) = (parsed::<u32>(e, "min"), parsed::<u32>(e, "max")) else {
            return Ok(());
        };
        let width = parsed::<f64>(e, "width");
        let hidden = flag(e, "hidden");
        let last = max.min(u32::from(MAX_COLS));
        for n in min.max(1)..=last {
            let col = (n - 1) as u16;
            if let Some(width) = width {
                self.sheet.set_column_width(col, width)?;
            }
            if hidden {
                self.sheet.set_column_hidden(col, true)?;
            }
        }
        Ok(())
    }

    fn read_merge(&mut self, e: &BytesStart<'_>) -> XlsxResult<()> {
        let Some(reference) = attr(e, "ref") else {
            return Ok(());
        };
        match CellRange::parse(&reference) {
            Ok(range) => self.sheet.add_merged_region(range)?,
            Err(err) => log::warn!("skipping merged region: {err}"),
        }
        Ok(())
    }
}
