//! Loads an `.xlsx` package into a [`Workbook`]

mod sheet;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::read_styles;
use crate::xml::{attr, decode_text, flag};
use xlkit_core::{Style, Workbook};

pub struct XlsxReader;

impl XlsxReader {
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        Self::read(BufReader::new(File::open(path)?))
    }

    /// Read a package from any seekable source
    ///
    /// Fails when the archive is damaged, when the content types, workbook
    /// or a listed worksheet part is missing, or when a part is not well
    /// formed XML. A package listing no sheets gets an empty `Sheet1`.
    pub fn read<R: Read + Seek>(input: R) -> XlsxResult<Workbook> {
        let mut zip = ZipArchive::new(input)?;

        if read_part(&mut zip, "[Content_Types].xml")?.is_none() {
            return Err(XlsxError::MissingPart("[Content_Types].xml".into()));
        }
        let book_xml = read_part(&mut zip, "xl/workbook.xml")?
            .ok_or_else(|| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let strings = match read_part(&mut zip, "xl/sharedStrings.xml")? {
            Some(xml) => shared_strings(&xml)?,
            None => Vec::new(),
        };
        let styles = match read_part(&mut zip, "xl/styles.xml")? {
            Some(xml) => read_styles(&xml)?,
            None => vec![Style::default()],
        };
        let targets = match read_part(&mut zip, "xl/_rels/workbook.xml.rels")? {
            Some(xml) => worksheet_targets(&xml)?,
            None => HashMap::new(),
        };

        let mut workbook = Workbook::empty();
        let mut entries = Vec::new();
        each_element(&book_xml, |e| {
            match e.local_name().as_ref() {
                b"workbookPr" => workbook.set_date_1904(flag(e, "date1904")),
                b"sheet" => entries.push(SheetEntry {
                    name: attr(e, "name").unwrap_or_default(),
                    rel: attr(e, "r:id").unwrap_or_default(),
                    hidden: matches!(attr(e, "state").as_deref(), Some("hidden" | "veryHidden")),
                }),
                _ => {}
            }
            Ok(())
        })?;

        for entry in entries {
            let path = targets
                .get(&entry.rel)
                .ok_or_else(|| XlsxError::MissingPart(format!("worksheet for '{}'", entry.name)))?;
            let xml = read_part(&mut zip, path)?
                .ok_or_else(|| XlsxError::MissingPart(path.clone()))?;

            let sheet = workbook.add_sheet(&entry.name)?;
            sheet.set_visible(!entry.hidden);
            sheet::read_sheet(&xml, sheet, &strings, &styles)?;
        }

        if workbook.sheet_count() == 0 {
            log::debug!("package lists no sheets, adding an empty one");
            workbook.add_sheet("Sheet1")?;
        }
        Ok(workbook)
    }
}

struct SheetEntry {
    name: String,
    rel: String,
    hidden: bool,
}

/// Bytes of one part, or `None` when the archive has no such entry
fn read_part<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> XlsxResult<Option<Vec<u8>>> {
    let mut file = match zip.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

/// Run `f` on every start and empty element of a part
fn each_element(
    xml: &[u8],
    mut f: impl FnMut(&BytesStart<'_>) -> XlsxResult<()>,
) -> XlsxResult<()> {
    let mut reader = Reader::from_reader(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => f(&e)?,
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

/// Relationship id to archive path, for worksheet relationships only
fn worksheet_targets(xml: &[u8]) -> XlsxResult<HashMap<String, String>> {
    let mut targets = HashMap::new();
    each_element(xml, |e| {
        let is_sheet = attr(e, "Type").is_some_and(|t| t.ends_with("/worksheet"));
        if e.local_name().as_ref() == b"Relationship" && is_sheet {
            if let (Some(id), Some(target)) = (attr(e, "Id"), attr(e, "Target")) {
                let path = match target.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{target}"),
                };
                targets.insert(id, path);
            }
        }
        Ok(())
    })?;
    Ok(targets)
}

/// `xl/sharedStrings.xml` in index order; phonetic runs are dropped
fn shared_strings(xml: &[u8]) -> XlsxResult<Vec<Arc<str>>> {
    let mut reader = Reader::from_reader(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"rPh" => in_phonetic = true,
                b"t" => in_text = !in_phonetic,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(Arc::from("")),
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::CData(c) if in_text => current.push_str(&String::from_utf8_lossy(&c)),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(Arc::from(&*decode_text(&current))),
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}
