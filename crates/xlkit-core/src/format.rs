//! Number formats and date detection

/// First id a workbook may assign to its own format codes
pub const FIRST_CUSTOM_FORMAT_ID: u32 = 164;

/// A cell's number format, identified the way both file formats store it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NumberFormat {
    /// One of the formats every application knows by id; 0 is General
    Builtin(u32),
    /// A format code carried in the workbook itself
    Custom { id: u32, code: String },
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat::Builtin(0)
    }
}

impl NumberFormat {
    pub fn custom(id: u32, code: impl Into<String>) -> Self {
        NumberFormat::Custom {
            id,
            code: code.into(),
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            NumberFormat::Builtin(id) | NumberFormat::Custom { id, .. } => *id,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            NumberFormat::Builtin(_) => None,
            NumberFormat::Custom { code, .. } => Some(code),
        }
    }

    /// Whether numbers under this format display as dates or times.
    ///
    /// The id decides first; a custom code is scanned for date tokens.
    pub fn is_date(&self) -> bool {
        is_date_format_id(self.id()) || self.code().is_some_and(is_date_format_code)
    }
}

/// Builtin ids reserved for date and time formats, including the
/// East Asian ones
pub fn is_date_format_id(id: u32) -> bool {
    matches!(id, 14..=22 | 27..=36 | 45..=47 | 50..=58)
}

/// Scan a format code for date or time tokens.
///
/// Only the first section counts. Quoted literals, escaped characters and
/// bracketed colors or conditions are skipped, but elapsed-time brackets
/// such as `[h]` count. A digit placeholder outside a seconds fraction
/// makes the code numeric.
pub fn is_date_format_code(code: &str) -> bool {
    let section = code.split(';').next().unwrap_or_default();
    let mut chars = section.chars();
    let mut found = false;
    let mut after_seconds_point = false;

    while let Some(c) = chars.next() {
        match c.to_ascii_lowercase() {
            '"' => {
                chars.by_ref().take_while(|q| *q != '"').for_each(drop);
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                let inner: String = chars.by_ref().take_while(|b| *b != ']').collect();
                let elapsed = !inner.is_empty()
                    && inner
                        .chars()
                        .all(|ch| matches!(ch.to_ascii_lowercase(), 'h' | 'm' | 's'));
                found |= elapsed;
            }
            'y' | 'm' | 'd' | 'h' | 's' => {
                found = true;
                after_seconds_point = false;
            }
            '.' if found => after_seconds_point = true,
            '0' if after_seconds_point => {}
            '0' | '#' | '?' => return false,
            _ => after_seconds_point = false,
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids() {
        assert!(NumberFormat::Builtin(14).is_date());
        assert!(NumberFormat::Builtin(22).is_date());
        assert!(NumberFormat::Builtin(58).is_date());
        assert!(!NumberFormat::Builtin(0).is_date());
        assert!(!NumberFormat::Builtin(2).is_date());
        assert!(!NumberFormat::Builtin(49).is_date());
    }

    #[test]
    fn test_date_codes() {
        for code in [
            "yyyy-mm-dd",
            "yyyy/mm/dd hh:mm",
            "h:mm:ss.000",
            "[h]:mm",
            "[$-409]d-mmm-yy",
            "yyyy\"年\"m\"月\"d\"日\"",
            "[Red]yyyy-mm-dd",
        ] {
            assert!(is_date_format_code(code), "{code} is a date");
        }
    }

    #[test]
    fn test_numeric_codes() {
        for code in ["0.00", "#,##0", "0%", "\"days\" 0", "[Red]0.00", "General", "@"] {
            assert!(!is_date_format_code(code), "{code} is not a date");
        }
    }

    #[test]
    fn test_custom_id_is_kept() {
        let format = NumberFormat::custom(176, "yyyy/mm/dd");
        assert_eq!(format.id(), 176);
        assert_eq!(format.code(), Some("yyyy/mm/dd"));
        assert!(format.is_date());
        // a custom code under a date id is still a date
        assert!(NumberFormat::custom(31, "0").is_date());
    }
}
