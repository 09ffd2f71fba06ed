//! Shared XML helpers: attribute lookup and SpreadsheetML string escaping
//!
//! Cell text is an `ST_Xstring`: besides the usual markup escapes, any
//! character XML cannot carry is written as `_xHHHH_`. A literal underscore
//! that would otherwise read back as such an escape is itself escaped as
//! `_x005F_`.

use std::borrow::Cow;

use quick_xml::events::BytesStart;

pub(crate) use quick_xml::escape::escape;

pub(crate) const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Unescaped value of an attribute, if present and well formed
pub(crate) fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    let found = e.try_get_attribute(name).ok().flatten()?;
    found.unescape_value().ok().map(Cow::into_owned)
}

/// Boolean attribute written as `1` or `true`
pub(crate) fn flag(e: &BytesStart<'_>, name: &str) -> bool {
    matches!(attr(e, name).as_deref(), Some("1" | "true"))
}

pub(crate) fn parsed<T: std::str::FromStr>(e: &BytesStart<'_>, name: &str) -> Option<T> {
    attr(e, name)?.trim().parse().ok()
}

/// The character an `_xHHHH_` sequence at the start of `s` stands for
fn escaped_char(s: &str) -> Option<char> {
    let hex = s.strip_prefix("_x")?.get(..4)?;
    if s.as_bytes().get(6) != Some(&b'_') || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    char::from_u32(u32::from_str_radix(hex, 16).ok()?)
}

/// Encode cell text for element content
pub(crate) fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        match c {
            '_' if escaped_char(&text[i..]).is_some() => out.push_str("_x005F_"),
            '\t' | '\n' => out.push(c),
            // CR would be folded into LF by any XML parser
            '\u{0}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}' => {
                out.push_str(&format!("_x{:04X}_", u32::from(c)));
            }
            _ => out.push(c),
        }
    }
    escape(&out).into_owned()
}

/// Decode `_xHHHH_` sequences in text already unescaped by the XML parser
pub(crate) fn decode_text(text: &str) -> Cow<'_, str> {
    if !text.contains("_x") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        match escaped_char(candidate) {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push('_');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
