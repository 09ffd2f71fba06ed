//! FORMAT and XF records resolved into cell styles

use std::collections::HashMap;

use xlkit_core::{HorizontalAlignment, NumberFormat, Style, VerticalAlignment};

use crate::biff::Bytes;
use crate::error::XlsResult;

/// `XF.alc`, indexed by its 3-bit value
const HORIZONTAL: [HorizontalAlignment; 8] = [
    HorizontalAlignment::General,
    HorizontalAlignment::Left,
    HorizontalAlignment::Center,
    HorizontalAlignment::Right,
    HorizontalAlignment::Fill,
    HorizontalAlignment::Justify,
    HorizontalAlignment::CenterContinuous,
    HorizontalAlignment::Distributed,
];

/// `XF.alcV`; 5 to 7 are undefined and read as bottom
const VERTICAL: [VerticalAlignment; 5] = [
    VerticalAlignment::Top,
    VerticalAlignment::Center,
    VerticalAlignment::Bottom,
    VerticalAlignment::Justify,
    VerticalAlignment::Distributed,
];

/// The parts of an XF record this reader keeps
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Xf {
    pub format: u16,
    /// Alignment byte: bits 0-2 horizontal, bit 3 wrap, bits 4-6 vertical
    pub align: u8,
}

/// FORMAT: format id and its code
pub(crate) fn read_format(body: &[u8]) -> XlsResult<(u16, String)> {
    let mut bytes = Bytes::new(body);
    let id = bytes.u16()?;
    Ok((id, bytes.string()?))
}

/// XF: font(2) format(2) type(2) alignment(1) ...
pub(crate) fn read_xf(body: &[u8]) -> XlsResult<Xf> {
    let mut bytes = Bytes::new(body);
    bytes.skip(2)?;
    let format = bytes.u16()?;
    bytes.skip(2)?;
    let align = bytes.u8()?;
    Ok(Xf { format, align })
}

/// One style per XF record, indexed as cell records refer to them.
/// Codes from FORMAT records keep their id so id-based date checks agree.
pub(crate) fn styles(xfs: &[Xf], formats: &HashMap<u16, String>) -> Vec<Style> {
    xfs.iter()
        .map(|xf| {
            let number_format = match formats.get(&xf.format) {
                Some(code) => NumberFormat::custom(u32::from(xf.format), code.as_str()),
                None => NumberFormat::Builtin(u32::from(xf.format)),
            };
            let vertical = VERTICAL
                .get(usize::from((xf.align >> 4) & 0x07))
                .copied()
                .unwrap_or_default();
            Style::new()
                .horizontal(HORIZONTAL[usize::from(xf.align & 0x07)])
                .vertical(vertical)
                .wrap(xf.align & 0x08 != 0)
                .number_format(number_format)
        })
        .collect()
}
