//! Workbook: ordered worksheets and the date system

use crate::error::{Error, Result};
use crate::sheet::Worksheet;

/// Longest sheet name Excel accepts
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_NAME_CHARS: [char; 7] = [':', '\\', '/', '?', '*', '[', ']'];

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    date_1904: bool,
}

impl Workbook {
    /// A workbook with one empty sheet named `Sheet1`
    pub fn new() -> Self {
        Self {
            sheets: vec![Worksheet::new("Sheet1")],
            date_1904: false,
        }
    }

    /// A workbook with no sheets, for readers to fill
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether serials count from 1904-01-01 instead of 1900-01-01
    pub fn date_1904(&self) -> bool {
        self.date_1904
    }

    pub fn set_date_1904(&mut self, date_1904: bool) {
        self.date_1904 = date_1904;
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.sheets.iter()
    }

    pub fn sheets_mut(&mut self) -> impl Iterator<Item = &mut Worksheet> {
        self.sheets.iter_mut()
    }

    /// Append a sheet, rejecting names Excel would refuse
    pub fn add_sheet(&mut self, name: &str) -> Result<&mut Worksheet> {
        self.check_name(name)?;
        self.sheets.push(Worksheet::new(name));
        let last = self.sheets.len() - 1;
        Ok(&mut self.sheets[last])
    }

    fn check_name(&self, name: &str) -> Result<()> {
        let reject = |reason| Error::InvalidSheetName {
            name: name.to_string(),
            reason,
        };
        if name.is_empty() {
            return Err(reject("is empty"));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(reject("is longer than 31 characters"));
        }
        if name.contains(FORBIDDEN_NAME_CHARS) {
            return Err(reject("contains one of : \\ / ? * [ ]"));
        }
        let lower = name.to_lowercase();
        if self.sheets.iter().any(|s| s.name().to_lowercase() == lower) {
            return Err(Error::DuplicateSheetName(name.to_string()));
        }
        Ok(())
    }
}
