//! What a cell holds

use std::fmt;
use std::sync::Arc;

/// Contents of one cell
///
/// Text is reference counted so a shared string table can hand the same
/// allocation to every cell that uses it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    /// A cell that exists but holds nothing
    #[default]
    Blank,
    Number(f64),
    Text(Arc<str>),
    Bool(bool),
    Error(ErrorValue),
    /// Formula text with the result last computed by the producing application
    Formula {
        expr: String,
        result: Option<FormulaResult>,
    },
}

/// Cached result of a formula
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaResult {
    Number(f64),
    Text(String),
    Bool(bool),
    Error(ErrorValue),
}

impl CellValue {
    pub fn text(s: impl AsRef<str>) -> Self {
        CellValue::Text(Arc::from(s.as_ref()))
    }

    pub fn formula(expr: impl Into<String>, result: Option<FormulaResult>) -> Self {
        CellValue::Formula {
            expr: expr.into(),
            result,
        }
    }

    /// The number a numeric reader sees: a number, or a formula's numeric result
    pub fn number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n)
            | CellValue::Formula {
                result: Some(FormulaResult::Number(n)),
                ..
            } => Some(*n),
            _ => None,
        }
    }

    /// Short name of the variant, for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            CellValue::Blank => "blank",
            CellValue::Number(_) => "number",
            CellValue::Text(_) => "text",
            CellValue::Bool(_) => "boolean",
            CellValue::Error(_) => "error",
            CellValue::Formula { .. } => "formula",
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(Arc::from(s))
    }
}

/// Spreadsheet error literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorValue {
    Null,
    Div0,
    Value,
    Ref,
    Name,
    Num,
    Na,
    GettingData,
}

const ERROR_TABLE: [(ErrorValue, &str, u8); 8] = [
    (ErrorValue::Null, "#NULL!", 0x00),
    (ErrorValue::Div0, "#DIV/0!", 0x07),
    (ErrorValue::Value, "#VALUE!", 0x0F),
    (ErrorValue::Ref, "#REF!", 0x17),
    (ErrorValue::Name, "#NAME?", 0x1D),
    (ErrorValue::Num, "#NUM!", 0x24),
    (ErrorValue::Na, "#N/A", 0x2A),
    (ErrorValue::GettingData, "#GETTING_DATA", 0x2B),
];

impl ErrorValue {
    /// Parse the literal as it appears in a cell, e.g. `#N/A`
    pub fn parse(literal: &str) -> Option<Self> {
        let literal = literal.trim();
        ERROR_TABLE
            .iter()
            .find(|(_, text, _)| text.eq_ignore_ascii_case(literal))
            .map(|(e, _, _)| *e)
    }

    /// Map a BIFF error byte
    pub fn from_code(code: u8) -> Option<Self> {
        ERROR_TABLE
            .iter()
            .find(|(_, _, c)| *c == code)
            .map(|(e, _, _)| *e)
    }

    pub fn as_str(self) -> &'static str {
        ERROR_TABLE
            .iter()
            .find(|(e, _, _)| *e == self)
            .map_or("#VALUE!", |(_, text, _)| text)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
