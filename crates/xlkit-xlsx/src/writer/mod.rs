//! Writes a [`Workbook`] as an `.xlsx` package
//!
//! Every part is generated as a string and deflated into the archive.
//! Text goes out as inline strings, so no shared string table is written.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::XlsxResult;
use crate::styles::StyleTable;
use crate::xml::{encode_text, escape, HEADER};
use xlkit_core::{CellRef, CellValue, ErrorValue, FormulaResult, Workbook, Worksheet};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WORKSHEET_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

pub struct XlsxWriter;

impl XlsxWriter {
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        Self::write(workbook, &mut out)?;
        out.flush()?;
        Ok(())
    }

    pub fn write<W: Write + Seek>(workbook: &Workbook, out: W) -> XlsxResult<()> {
        let styles = StyleTable::collect(workbook);
        let mut zip = ZipWriter::new(out);

        put(&mut zip, "[Content_Types].xml", &content_types(workbook))?;
        put(&mut zip, "_rels/.rels", &package_rels())?;
        put(&mut zip, "xl/workbook.xml", &workbook_xml(workbook))?;
        put(&mut zip, "xl/_rels/workbook.xml.rels", &workbook_rels(workbook))?;
        put(&mut zip, "xl/styles.xml", &styles.to_xml())?;
        for (i, sheet) in workbook.sheets().enumerate() {
            let name = format!("xl/worksheets/sheet{}.xml", i + 1);
            put(&mut zip, &name, &sheet_xml(sheet, |s| styles.xf(i, s)))?;
        }

        zip.finish()?;
        Ok(())
    }
}

fn put<W: Write + Seek>(zip: &mut ZipWriter<W>, name: &str, xml: &str) -> XlsxResult<()> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)?;
    zip.write_all(xml.as_bytes())?;
    Ok(())
}

fn content_types(workbook: &Workbook) -> String {
    let mut xml = format!(
        r#"{HEADER}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#
    );
    for i in 1..=workbook.sheet_count() {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn package_rels() -> String {
    format!(
        r#"{HEADER}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    )
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut xml = format!(r#"{HEADER}<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}">"#);
    if workbook.date_1904() {
        xml.push_str(r#"<workbookPr date1904="1"/>"#);
    }
    xml.push_str("<sheets>");
    for (i, sheet) in workbook.sheets().enumerate() {
        let state = if sheet.is_visible() { "" } else { r#" state="hidden""# };
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{n}"{state} r:id="rId{n}"/>"#,
            escape(sheet.name()),
            n = i + 1
        ));
    }
    xml.push_str("</sheets>");
    if workbook.sheets().any(Worksheet::force_formula_recalculation) {
        xml.push_str(r#"<calcPr fullCalcOnLoad="1"/>"#);
    }
    xml.push_str("</workbook>");
    xml
}

fn workbook_rels(workbook: &Workbook) -> String {
    let mut xml = format!(
        r#"{HEADER}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#
    );
    for n in 1..=workbook.sheet_count() {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="{WORKSHEET_TYPE}" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    let styles = workbook.sheet_count() + 1;
    xml.push_str(&format!(
        r#"<Relationship Id="rId{styles}" Type="{REL_NS}/styles" Target="styles.xml"/></Relationships>"#
    ));
    xml
}

fn sheet_xml(sheet: &Worksheet, xf: impl Fn(u32) -> u32) -> String {
    let mut xml = format!(r#"{HEADER}<worksheet xmlns="{MAIN_NS}" xmlns:r="{REL_NS}">"#);

    let columns: Vec<_> = sheet.columns().collect();
    if !columns.is_empty() {
        xml.push_str("<cols>");
        for (col, column) in columns {
            let n = u32::from(col) + 1;
            xml.push_str(&format!(r#"<col min="{n}" max="{n}""#));
            if let Some(width) = column.width {
                xml.push_str(&format!(r#" width="{width}" customWidth="1""#));
            }
            if column.hidden {
                xml.push_str(r#" hidden="1""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</cols>");
    }

    xml.push_str("<sheetData>");
    for (r, row) in sheet.rows() {
        xml.push_str(&format!(r#"<row r="{}""#, r + 1));
        if let Some(height) = row.height {
            xml.push_str(&format!(r#" ht="{height}" customHeight="1""#));
        }
        if row.hidden {
            xml.push_str(r#" hidden="1""#);
        }
        if row.is_empty() {
            xml.push_str("/>");
            continue;
        }
        xml.push('>');
        for (col, cell) in row.cells() {
            push_cell(&mut xml, CellRef::new(r, col), &cell.value, xf(cell.style));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if sheet.force_formula_recalculation() {
        xml.push_str(r#"<sheetCalcPr fullCalcOnLoad="1"/>"#);
    }

    let merges = sheet.merged_regions();
    if !merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, merges.len()));
        for range in merges {
            xml.push_str(&format!(r#"<mergeCell ref="{range}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }

    xml.push_str("</worksheet>");
    xml
}

fn push_cell(xml: &mut String, at: CellRef, value: &CellValue, xf: u32) {
    xml.push_str(&format!(r#"<c r="{at}""#));
    if xf != 0 {
        xml.push_str(&format!(r#" s="{xf}""#));
    }
    match value {
        CellValue::Blank => xml.push_str("/>"),
        CellValue::Number(n) if n.is_finite() => xml.push_str(&format!("><v>{n}</v></c>")),
        CellValue::Number(_) => push_error(xml, ErrorValue::Num),
        CellValue::Text(text) => xml.push_str(&format!(
            r#" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            encode_text(text)
        )),
        CellValue::Bool(b) => xml.push_str(&format!(r#" t="b"><v>{}</v></c>"#, u8::from(*b))),
        CellValue::Error(e) => push_error(xml, *e),
        CellValue::Formula { expr, result } => {
            let (kind, cached) = match result {
                Some(FormulaResult::Number(n)) if n.is_finite() => ("", n.to_string()),
                Some(FormulaResult::Number(_)) => (r#" t="e""#, ErrorValue::Num.to_string()),
                Some(FormulaResult::Text(s)) => (r#" t="str""#, encode_text(s)),
                Some(FormulaResult::Bool(b)) => (r#" t="b""#, u8::from(*b).to_string()),
                Some(FormulaResult::Error(e)) => (r#" t="e""#, e.to_string()),
                None => ("", String::new()),
            };
            xml.push_str(kind);
            xml.push('>');
            if !expr.is_empty() {
                xml.push_str(&format!("<f>{}</f>", escape(expr)));
            }
            if result.is_some() {
                xml.push_str(&format!("<v>{cached}</v>"));
            }
            xml.push_str("</c>");
        }
    }
}

fn push_error(xml: &mut String, error: ErrorValue) {
    xml.push_str(&format!(r#" t="e"><v>{}</v></c>"#, escape(error.as_str())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell_xml(value: CellValue) -> String {
        let mut xml = String::new();
        push_cell(&mut xml, CellRef::new(1, 2), &value, 0);
        xml
    }

    #[test]
    fn test_cell_encodings() {
        assert_eq!(cell_xml(CellValue::Number(1.5)), r#"<c r="C2"><v>1.5</v></c>"#);
        assert_eq!(
            cell_xml(CellValue::Number(f64::NAN)),
            r#"<c r="C2" t="e"><v>#NUM!</v></c>"#
        );
        assert_eq!(cell_xml(CellValue::Bool(true)), r#"<c r="C2" t="b"><v>1</v></c>"#);
        assert_eq!(cell_xml(CellValue::Blank), r#"<c r="C2"/>"#);
        assert_eq!(
            cell_xml(CellValue::Error(ErrorValue::Div0)),
            r#"<c r="C2" t="e"><v>#DIV/0!</v></c>"#
        );
    }

    #[test]
    fn test_text_cells_escape_underscores_and_controls() {
        assert_eq!(
            cell_xml(CellValue::text("_x0041_ & a\u{1}b")),
            r#"<c r="C2" t="inlineStr"><is><t xml:space="preserve">_x005F_x0041_ &amp; a_x0001_b</t></is></c>"#
        );
    }

    #[test]
    fn test_formula_cells() {
        assert_eq!(
            cell_xml(CellValue::formula(
                "IF(A1<2,\"x\",\"y\")",
                Some(FormulaResult::Text("x\u{2}".into()))
            )),
            r#"<c r="C2" t="str"><f>IF(A1&lt;2,&quot;x&quot;,&quot;y&quot;)</f><v>x_x0002_</v></c>"#
        );
        assert_eq!(
            cell_xml(CellValue::formula("SUM(A1:A3)", None)),
            r#"<c r="C2"><f>SUM(A1:A3)</f></c>"#
        );
        assert_eq!(
            cell_xml(CellValue::formula("", Some(FormulaResult::Number(3.0)))),
            r#"<c r="C2"><v>3</v></c>"#
        );
    }

    #[test]
    fn test_sheet_layout() {
        let mut sheet = Worksheet::new("S");
        sheet.set_column_width(1, 20.5).unwrap();
        sheet.set_row_height(0, Some(30.0)).unwrap();
        sheet.create_row(2).unwrap();
        sheet.set_row_hidden(2, true).unwrap();
        sheet
            .add_merged_region(xlkit_core::CellRange::new(0, 1, 0, 1))
            .unwrap();

        let xml = sheet_xml(&sheet, |s| s);
        assert!(xml.contains(r#"<cols><col min="2" max="2" width="20.5" customWidth="1"/></cols>"#));
        assert!(xml.contains(r#"<row r="1" ht="30" customHeight="1"/>"#));
        assert!(xml.contains(r#"<row r="3" hidden="1"/>"#));
        assert!(xml.contains(r#"<mergeCells count="1"><mergeCell ref="A1:B2"/></mergeCells>"#));
    }

    #[test]
    fn test_workbook_part() {
        let mut wb = Workbook::new();
        wb.set_date_1904(true);
        let hidden = wb.add_sheet("R&D").unwrap();
        hidden.set_visible(false);
        hidden.set_force_formula_recalculation(true);

        let xml = workbook_xml(&wb);
        assert!(xml.contains(r#"<workbookPr date1904="1"/>"#));
        assert!(xml.contains(r#"<sheet name="R&amp;D" sheetId="2" state="hidden" r:id="rId2"/>"#));
        assert!(xml.contains(r#"<calcPr fullCalcOnLoad="1"/>"#));
    }
}
