//! `xl/styles.xml`: cell formats in both directions
//!
//! Only `cellXfs` matter here. Each record becomes one [`Style`] carrying
//! its alignment and number format; fonts, fills and borders are written
//! as the single defaults Excel requires and ignored on read.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::XlsxResult;
use crate::xml::{attr, escape, flag, parsed, HEADER};
use xlkit_core::format::FIRST_CUSTOM_FORMAT_ID;
use xlkit_core::{HorizontalAlignment, NumberFormat, Style, VerticalAlignment, Workbook};

const HORIZONTAL: [(HorizontalAlignment, &str); 8] = [
    (HorizontalAlignment::General, "general"),
    (HorizontalAlignment::Left, "left"),
    (HorizontalAlignment::Center, "center"),
    (HorizontalAlignment::Right, "right"),
    (HorizontalAlignment::Fill, "fill"),
    (HorizontalAlignment::Justify, "justify"),
    (HorizontalAlignment::CenterContinuous, "centerContinuous"),
    (HorizontalAlignment::Distributed, "distributed"),
];

const VERTICAL: [(VerticalAlignment, &str); 5] = [
    (VerticalAlignment::Top, "top"),
    (VerticalAlignment::Center, "center"),
    (VerticalAlignment::Bottom, "bottom"),
    (VerticalAlignment::Justify, "justify"),
    (VerticalAlignment::Distributed, "distributed"),
];

fn name_of<T: PartialEq>(table: &[(T, &'static str)], value: &T) -> &'static str {
    table
        .iter()
        .find(|(v, _)| v == value)
        .map_or("general", |(_, name)| name)
}

fn value_of<T: Copy>(table: &[(T, &str)], name: &str) -> Option<T> {
    table.iter().find(|(_, n)| *n == name).map(|(v, _)| *v)
}

const FIXED_PARTS: &str = r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#;

/// Workbook-wide `cellXfs`, built from every sheet's style pool
#[derive(Debug)]
pub(crate) struct StyleTable {
    xfs: Vec<Style>,
    /// Per sheet, pool index to xf index
    sheet_xfs: Vec<Vec<u32>>,
}

impl StyleTable {
    pub(crate) fn collect(workbook: &Workbook) -> Self {
        let mut xfs = vec![Style::default()];
        let mut known: HashMap<Style, u32> = HashMap::from([(Style::default(), 0)]);
        let mut sheet_xfs = Vec::with_capacity(workbook.sheet_count());

        for sheet in workbook.sheets() {
            let mut mapping = Vec::with_capacity(sheet.styles().len());
            for (_, style) in sheet.styles().iter() {
                let xf = *known.entry(style.clone()).or_insert_with(|| {
                    xfs.push(style.clone());
                    (xfs.len() - 1) as u32
                });
                mapping.push(xf);
            }
            sheet_xfs.push(mapping);
        }
        Self { xfs, sheet_xfs }
    }

    /// xf index for a cell's pool index
    pub(crate) fn xf(&self, sheet: usize, pool_index: u32) -> u32 {
        self.sheet_xfs
            .get(sheet)
            .and_then(|m| m.get(pool_index as usize))
            .copied()
            .unwrap_or(0)
    }

    /// Give every distinct custom code a `numFmtId`.
    ///
    /// A code keeps the id it came with unless another code holds it, in
    /// which case it moves to the first free id from 164 up.
    fn format_ids(&self) -> (Vec<(u32, &str)>, HashMap<&str, u32>) {
        let codes: Vec<(u32, &str)> = self
            .xfs
            .iter()
            .filter_map(|s| match &s.number_format {
                NumberFormat::Custom { id, code } => Some((*id, code.as_str())),
                NumberFormat::Builtin(_) => None,
            })
            .collect();

        let mut ids: HashMap<&str, u32> = HashMap::new();
        let mut taken: Vec<u32> = Vec::new();
        let mut moved = Vec::new();
        for &(id, code) in &codes {
            if ids.contains_key(code) {
                continue;
            }
            if taken.contains(&id) {
                moved.push(code);
            } else {
                ids.insert(code, id);
                taken.push(id);
            }
        }
        let mut next = FIRST_CUSTOM_FORMAT_ID;
        for code in moved {
            if ids.contains_key(code) {
                continue;
            }
            while taken.contains(&next) {
                next += 1;
            }
            ids.insert(code, next);
            taken.push(next);
        }

        let mut listed: Vec<(u32, &str)> = ids.iter().map(|(code, id)| (*id, *code)).collect();
        listed.sort_unstable();
        (listed, ids)
    }

    pub(crate) fn to_xml(&self) -> String {
        let (formats, ids) = self.format_ids();
        let mut xml = String::from(HEADER);
        xml.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !formats.is_empty() {
            xml.push_str(&format!(r#"<numFmts count="{}">"#, formats.len()));
            for (id, code) in &formats {
                xml.push_str(&format!(
                    r#"<numFmt numFmtId="{id}" formatCode="{}"/>"#,
                    escape(code)
                ));
            }
            xml.push_str("</numFmts>");
        }
        xml.push_str(FIXED_PARTS);

        xml.push_str(&format!(r#"<cellXfs count="{}">"#, self.xfs.len()));
        for style in &self.xfs {
            let fmt = match &style.number_format {
                NumberFormat::Builtin(id) => *id,
                NumberFormat::Custom { code, .. } => ids.get(code.as_str()).copied().unwrap_or(0),
            };
            push_xf(&mut xml, style, fmt);
        }
        xml.push_str("</cellXfs>");

        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
        xml.push_str("</styleSheet>");
        xml
    }
}

fn push_xf(xml: &mut String, style: &Style, fmt: u32) {
    xml.push_str(&format!(
        r#"<xf numFmtId="{fmt}" fontId="0" fillId="0" borderId="0" xfId="0""#
    ));
    if fmt != 0 {
        xml.push_str(r#" applyNumberFormat="1""#);
    }
    if !style.has_alignment() {
        xml.push_str("/>");
        return;
    }

    xml.push_str(r#" applyAlignment="1"><alignment"#);
    if style.horizontal != HorizontalAlignment::General {
        xml.push_str(&format!(
            r#" horizontal="{}""#,
            name_of(&HORIZONTAL, &style.horizontal)
        ));
    }
    if style.vertical != VerticalAlignment::Bottom {
        xml.push_str(&format!(
            r#" vertical="{}""#,
            name_of(&VERTICAL, &style.vertical)
        ));
    }
    if style.wrap_text {
        xml.push_str(r#" wrapText="1""#);
    }
    xml.push_str("/></xf>");
}

fn apply_alignment(e: &BytesStart<'_>, style: &mut Style) {
    if let Some(h) = attr(e, "horizontal").and_then(|n| value_of(&HORIZONTAL, &n)) {
        style.horizontal = h;
    }
    if let Some(v) = attr(e, "vertical").and_then(|n| value_of(&VERTICAL, &n)) {
        style.vertical = v;
    }
    style.wrap_text = flag(e, "wrapText");
}

/// One style per `cellXfs` record, indexed like a cell's `s` attribute.
/// A part without records yields just the default style.
pub(crate) fn read_styles(xml: &[u8]) -> XlsxResult<Vec<Style>> {
    let mut reader = Reader::from_reader(xml);
    let mut codes: HashMap<u32, String> = HashMap::new();
    let mut xfs: Vec<Style> = Vec::new();
    let mut in_cell_xfs = false;
    let mut open_xf = false;

    let resolve = |codes: &HashMap<u32, String>, e: &BytesStart<'_>| {
        let id: u32 = parsed(e, "numFmtId").unwrap_or(0);
        let number_format = match codes.get(&id) {
            Some(code) => NumberFormat::custom(id, code.as_str()),
            None => NumberFormat::Builtin(id),
        };
        Style::new().number_format(number_format)
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    xfs.push(resolve(&codes, &e));
                    open_xf = true;
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"numFmt" => {
                    if let (Some(id), Some(code)) = (parsed(&e, "numFmtId"), attr(&e, "formatCode")) {
                        codes.insert(id, code);
                    }
                }
                b"xf" if in_cell_xfs => xfs.push(resolve(&codes, &e)),
                b"alignment" if open_xf => {
                    if let Some(style) = xfs.last_mut() {
                        apply_alignment(&e, style);
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"cellXfs" => in_cell_xfs = false,
                b"xf" => open_xf = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if xfs.is_empty() {
        xfs.push(Style::default());
    }
    Ok(xfs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table_of(styles: &[Style]) -> StyleTable {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_mut(0).unwrap();
        for (i, style) in styles.iter().enumerate() {
            sheet.set_cell(0, i as u16, 1.0, style).unwrap();
        }
        StyleTable::collect(&wb)
    }

    #[test]
    fn test_styles_shared_across_sheets() {
        let centered = Style::new().horizontal(HorizontalAlignment::Center);
        let mut wb = Workbook::new();
        wb.sheet_mut(0).unwrap().set_cell(0, 0, 1.0, &centered).unwrap();
        wb.add_sheet("Two").unwrap().set_cell(0, 0, 2.0, &centered).unwrap();

        let table = StyleTable::collect(&wb);
        assert_eq!(table.xfs.len(), 2);
        assert_eq!(table.xf(0, 1), 1);
        assert_eq!(table.xf(1, 1), 1);
        assert_eq!(table.xf(5, 1), 0);
    }

    #[test]
    fn test_format_id_collisions_move_to_free_ids() {
        let table = table_of(&[
            Style::new().number_format(NumberFormat::custom(164, "yyyy-mm-dd")),
            Style::new().number_format(NumberFormat::custom(164, "0.000")),
            Style::new().number_format(NumberFormat::custom(31, "yyyy\"年\"")),
        ]);
        let (listed, _) = table.format_ids();
        assert_eq!(
            listed,
            vec![(31, "yyyy\"年\""), (164, "yyyy-mm-dd"), (165, "0.000")]
        );
    }

    #[test]
    fn test_written_styles_read_back() {
        let styles = [
            Style::new()
                .horizontal(HorizontalAlignment::Center)
                .vertical(VerticalAlignment::Center)
                .wrap(true),
            Style::new().number_format(NumberFormat::Builtin(14)),
            Style::new()
                .horizontal(HorizontalAlignment::Left)
                .number_format(NumberFormat::custom(170, "yyyy/mm/dd")),
        ];
        let xml = table_of(&styles).to_xml();
        let read = read_styles(xml.as_bytes()).unwrap();

        assert_eq!(read[0], Style::default());
        assert_eq!(&read[1..], &styles);
    }

    #[test]
    fn test_read_ignores_cell_style_xfs_and_dxfs() {
        let xml = br#"<styleSheet>
<cellStyleXfs count="1"><xf numFmtId="3"><alignment horizontal="right"/></xf></cellStyleXfs>
<cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="22" applyNumberFormat="1"/></cellXfs>
<dxfs count="1"><dxf><alignment horizontal="left"/></dxf></dxfs>
</styleSheet>"#;
        let read = read_styles(xml).unwrap();
        assert_eq!(
            read,
            vec![
                Style::default(),
                Style::new().number_format(NumberFormat::Builtin(22)),
            ]
        );
    }

    #[test]
    fn test_read_without_cell_xfs() {
        assert_eq!(read_styles(b"<styleSheet/>").unwrap(), vec![Style::default()]);
    }
}
