//! Cell styles and the per-sheet style pool
//!
//! A style here is only what the accessor reads or writes: alignment, text
//! wrapping and the number format. Cells refer to styles by index into
//! their sheet's [`StylePool`], so identical styles are stored once.

use ahash::AHashMap;

use crate::format::NumberFormat;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HorizontalAlignment {
    #[default]
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VerticalAlignment {
    Top,
    Center,
    #[default]
    Bottom,
    Justify,
    Distributed,
}

/// Formatting of one cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub wrap_text: bool,
    pub number_format: NumberFormat,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn horizontal(mut self, align: HorizontalAlignment) -> Self {
        self.horizontal = align;
        self
    }

    pub fn vertical(mut self, align: VerticalAlignment) -> Self {
        self.vertical = align;
        self
    }

    pub fn wrap(mut self, wrap: bool) -> Self {
        self.wrap_text = wrap;
        self
    }

    pub fn number_format(mut self, format: NumberFormat) -> Self {
        self.number_format = format;
        self
    }

    pub fn is_date(&self) -> bool {
        self.number_format.is_date()
    }

    /// Whether any alignment property differs from the default
    pub fn has_alignment(&self) -> bool {
        self.horizontal != HorizontalAlignment::General
            || self.vertical != VerticalAlignment::Bottom
            || self.wrap_text
    }
}

/// Deduplicated styles of one worksheet. Index 0 is always the default style.
#[derive(Debug, Clone)]
pub struct StylePool {
    styles: Vec<Style>,
    lookup: AHashMap<Style, u32>,
}

impl StylePool {
    pub fn new() -> Self {
        let mut lookup = AHashMap::new();
        lookup.insert(Style::default(), 0);
        Self {
            styles: vec![Style::default()],
            lookup,
        }
    }

    /// Index of `style`, adding it on first use
    pub fn intern(&mut self, style: &Style) -> u32 {
        if let Some(&index) = self.lookup.get(style) {
            return index;
        }
        let index = self.styles.len() as u32;
        self.styles.push(style.clone());
        self.lookup.insert(style.clone(), index);
        index
    }

    /// Unknown indices resolve to the default style
    pub fn get(&self, index: u32) -> &Style {
        self.styles.get(index as usize).unwrap_or(&self.styles[0])
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Style)> {
        self.styles.iter().enumerate().map(|(i, s)| (i as u32, s))
    }
}

impl Default for StylePool {
    fn default() -> Self {
        Self::new()
    }
}
