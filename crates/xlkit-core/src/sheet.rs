//! Worksheet: rows of cells plus column, merge and style metadata
//!
//! Rows are physical: a row exists once anything creates it (a cell, a
//! height, an explicit [`Worksheet::create_row`]) even if it holds no
//! cells, and [`Worksheet::row_count`] counts exactly those rows.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::reference::CellRange;
use crate::style::{Style, StylePool};
use crate::value::CellValue;
use crate::{MAX_COLS, MAX_ROWS};

/// Row height in points when a row sets none
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// Column width in characters when a column sets none
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// A value and the pool index of its style
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Custom height in points
    pub height: Option<f64>,
    pub hidden: bool,
    cells: BTreeMap<u16, Cell>,
}

impl Row {
    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(&col)
    }

    /// Cells in column order
    pub fn cells(&self) -> impl Iterator<Item = (u16, &Cell)> {
        self.cells.iter().map(|(&col, cell)| (col, cell))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Column {
    /// Custom width in characters
    pub width: Option<f64>,
    pub hidden: bool,
}

#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    visible: bool,
    recalc_on_open: bool,
    rows: BTreeMap<u32, Row>,
    columns: BTreeMap<u16, Column>,
    merges: Vec<CellRange>,
    styles: StylePool,
}

fn check_row(row: u32) -> Result<()> {
    if row < MAX_ROWS {
        Ok(())
    } else {
        Err(Error::RowOutOfRange(u64::from(row)))
    }
}

fn check_col(col: u16) -> Result<()> {
    if col < MAX_COLS {
        Ok(())
    } else {
        Err(Error::ColumnOutOfRange(u64::from(col)))
    }
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            recalc_on_open: false,
            rows: BTreeMap::new(),
            columns: BTreeMap::new(),
            merges: Vec::new(),
            styles: StylePool::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether formulas are recalculated when the file is next opened
    pub fn force_formula_recalculation(&self) -> bool {
        self.recalc_on_open
    }

    pub fn set_force_formula_recalculation(&mut self, force: bool) {
        self.recalc_on_open = force;
    }

    // ===== Cells =====

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.rows.get(&row)?.cell(col)
    }

    pub fn value(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cell(row, col).map(|cell| &cell.value)
    }

    /// Style of a cell; absent cells have the default style
    pub fn style(&self, row: u32, col: u16) -> &Style {
        self.styles.get(self.cell(row, col).map_or(0, |cell| cell.style))
    }

    pub fn styles(&self) -> &StylePool {
        &self.styles
    }

    fn cell_entry(&mut self, row: u32, col: u16) -> Result<&mut Cell> {
        check_row(row)?;
        check_col(col)?;
        Ok(self
            .rows
            .entry(row)
            .or_default()
            .cells
            .entry(col)
            .or_default())
    }

    /// Store a value, keeping the cell's style
    pub fn set_value(&mut self, row: u32, col: u16, value: impl Into<CellValue>) -> Result<()> {
        self.cell_entry(row, col)?.value = value.into();
        Ok(())
    }

    /// Store a value together with its style
    pub fn set_cell(
        &mut self,
        row: u32,
        col: u16,
        value: impl Into<CellValue>,
        style: &Style,
    ) -> Result<()> {
        let style = self.styles.intern(style);
        *self.cell_entry(row, col)? = Cell {
            value: value.into(),
            style,
        };
        Ok(())
    }

    /// Make a cell blank, creating it if needed; its style stays
    pub fn set_blank(&mut self, row: u32, col: u16) -> Result<()> {
        self.set_value(row, col, CellValue::Blank)
    }

    // ===== Rows =====

    pub fn row(&self, row: u32) -> Option<&Row> {
        self.rows.get(&row)
    }

    pub fn rows(&self) -> impl Iterator<Item = (u32, &Row)> {
        self.rows.iter().map(|(&index, row)| (index, row))
    }

    pub fn has_row(&self, row: u32) -> bool {
        self.rows.contains_key(&row)
    }

    /// Create an empty row; an existing row is left as is
    pub fn create_row(&mut self, row: u32) -> Result<()> {
        check_row(row)?;
        self.rows.entry(row).or_default();
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn last_row(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    pub fn row_height(&self, row: u32) -> f64 {
        self.rows
            .get(&row)
            .and_then(|r| r.height)
            .unwrap_or(DEFAULT_ROW_HEIGHT)
    }

    /// Set a height in points, creating the row; `None` restores the default
    pub fn set_row_height(&mut self, row: u32, height: Option<f64>) -> Result<()> {
        check_row(row)?;
        self.rows.entry(row).or_default().height = height;
        Ok(())
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.rows.get(&row).is_some_and(|r| r.hidden)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) -> Result<()> {
        check_row(row)?;
        self.rows.entry(row).or_default().hidden = hidden;
        Ok(())
    }

    /// Move rows `start..=end` by `offset`, cells and row properties alike.
    ///
    /// Moved rows replace whatever was at their destination. Merged regions
    /// lying wholly inside the block move with it.
    pub fn shift_rows(&mut self, start: u32, end: u32, offset: i64) -> Result<()> {
        let fits = start <= end
            && CellRange::new(start, end, 0, 0)
                .offset_rows(offset)
                .is_some();
        if !fits {
            return Err(Error::RowShift { start, end, offset });
        }
        if offset == 0 {
            return Ok(());
        }

        let block: Vec<u32> = self.rows.range(start..=end).map(|(&r, _)| r).collect();
        let moved: Vec<(u32, Row)> = block
            .into_iter()
            .filter_map(|r| self.rows.remove(&r).map(|row| (r, row)))
            .collect();
        for (index, row) in moved {
            let dest = (i64::from(index) + offset) as u32;
            self.rows.insert(dest, row);
        }

        for region in self.merges.iter_mut() {
            if region.within_rows(start, end) {
                if let Some(shifted) = region.offset_rows(offset) {
                    *region = shifted;
                }
            }
        }
        Ok(())
    }

    // ===== Columns =====

    pub fn column(&self, col: u16) -> Option<&Column> {
        self.columns.get(&col)
    }

    /// Columns carrying a custom width or hidden flag
    pub fn columns(&self) -> impl Iterator<Item = (u16, &Column)> {
        self.columns.iter().map(|(&index, column)| (index, column))
    }

    pub fn column_width(&self, col: u16) -> f64 {
        self.columns
            .get(&col)
            .and_then(|c| c.width)
            .unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) -> Result<()> {
        check_col(col)?;
        self.columns.entry(col).or_default().width = Some(width);
        Ok(())
    }

    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.columns.get(&col).is_some_and(|c| c.hidden)
    }

    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) -> Result<()> {
        check_col(col)?;
        self.columns.entry(col).or_default().hidden = hidden;
        Ok(())
    }

    // ===== Merges =====

    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merges
    }

    /// Record a merged region. Overlaps are not checked.
    pub fn add_merged_region(&mut self, range: CellRange) -> Result<()> {
        check_row(range.last_row)?;
        check_col(range.last_col)?;
        self.merges.push(range);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NumberFormat;
    use crate::style::HorizontalAlignment;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_and_style_are_independent() {
        let mut ws = Worksheet::new("Sheet1");
        let left = Style::new().horizontal(HorizontalAlignment::Left);
        ws.set_cell(0, 0, CellValue::Blank, &left).unwrap();
        assert_eq!(ws.value(0, 0), Some(&CellValue::Blank));

        ws.set_value(0, 0, 4.0).unwrap();
        assert_eq!(ws.style(0, 0), &left);
        ws.set_blank(0, 0).unwrap();
        assert_eq!(ws.style(0, 0), &left);
        assert_eq!(ws.style(7, 7), &Style::default());
    }

    #[test]
    fn test_set_cell_replaces_both() {
        let mut ws = Worksheet::new("Sheet1");
        let dated = Style::new().number_format(NumberFormat::Builtin(14));
        ws.set_cell(2, 1, 45292.0, &dated).unwrap();
        ws.set_cell(2, 1, "x", &Style::default()).unwrap();
        assert_eq!(ws.value(2, 1), Some(&CellValue::text("x")));
        assert_eq!(ws.cell(2, 1).unwrap().style, 0);
        // the pool keeps both styles
        assert_eq!(ws.styles().len(), 2);
    }

    #[test]
    fn test_limits() {
        let mut ws = Worksheet::new("Sheet1");
        assert!(ws.set_value(MAX_ROWS, 0, 1.0).is_err());
        assert!(ws.set_value(0, MAX_COLS, 1.0).is_err());
        assert!(ws.create_row(MAX_ROWS).is_err());
        assert!(ws.set_column_width(MAX_COLS, 3.0).is_err());
        assert!(ws
            .add_merged_region(CellRange::new(0, MAX_ROWS, 0, 0))
            .is_err());
        assert_eq!(ws.row_count(), 0);
    }

    #[test]
    fn test_rows_exist_without_cells() {
        let mut ws = Worksheet::new("Sheet1");
        ws.create_row(4).unwrap();
        ws.set_row_height(9, Some(30.0)).unwrap();
        ws.set_value(1, 0, "a").unwrap();

        assert_eq!(ws.row_count(), 3);
        assert_eq!(ws.last_row(), Some(9));
        assert!(ws.row(4).unwrap().is_empty());
        assert_eq!(ws.row_height(9), 30.0);
        assert_eq!(ws.row_height(4), DEFAULT_ROW_HEIGHT);

        ws.set_row_height(9, None).unwrap();
        assert_eq!(ws.row(9).unwrap().height, None);
    }

    #[test]
    fn test_shift_rows_down_carries_properties_and_merges() {
        let mut ws = Worksheet::new("Sheet1");
        for r in 0..4u32 {
            ws.set_value(r, 0, f64::from(r)).unwrap();
        }
        ws.set_row_height(2, Some(20.0)).unwrap();
        ws.add_merged_region(CellRange::new(2, 3, 0, 1)).unwrap();
        ws.add_merged_region(CellRange::new(0, 2, 2, 2)).unwrap();

        ws.shift_rows(2, 3, 1).unwrap();

        assert!(!ws.has_row(2));
        assert_eq!(ws.value(3, 0), Some(&CellValue::Number(2.0)));
        assert_eq!(ws.value(4, 0), Some(&CellValue::Number(3.0)));
        assert_eq!(ws.row_height(3), 20.0);
        assert_eq!(
            ws.merged_regions(),
            &[CellRange::new(3, 4, 0, 1), CellRange::new(0, 2, 2, 2)]
        );
    }

    #[test]
    fn test_shift_rows_up_replaces_destination() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_value(0, 0, "old").unwrap();
        ws.set_value(1, 0, "new").unwrap();
        ws.shift_rows(1, 1, -1).unwrap();
        assert_eq!(ws.value(0, 0), Some(&CellValue::text("new")));
        assert_eq!(ws.row_count(), 1);
    }

    #[test]
    fn test_shift_rows_rejects_bad_ranges() {
        let mut ws = Worksheet::new("Sheet1");
        assert!(ws.shift_rows(3, 2, 1).is_err());
        assert!(ws.shift_rows(0, 2, -1).is_err());
        assert!(ws.shift_rows(0, MAX_ROWS - 1, 1).is_err());
    }

    #[test]
    fn test_columns() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_column_width(3, 20.0).unwrap();
        ws.set_column_hidden(5, true).unwrap();

        assert_eq!(ws.column_width(3), 20.0);
        assert_eq!(ws.column_width(0), DEFAULT_COLUMN_WIDTH);
        assert!(ws.is_column_hidden(5));
        assert_eq!(ws.column(5).unwrap().width, None);
        assert_eq!(ws.columns().count(), 2);
    }
}
