//! Values accepted by the accessor's write operations

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;

/// A value to write into a cell
///
/// Each variant maps to a fixed cell representation, see
/// [`SheetAccessor::write_at`](super::SheetAccessor::write_at).
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    /// Nothing to write; the target is left untouched
    Null,
    /// Written as text, shortest decimal form with trailing zeros stripped
    Double(f64),
    /// Rounded to 2 decimals, then written like `Double`
    Float(f32),
    /// Written as text with trailing zeros stripped
    Decimal(Decimal),
    /// Written as a number
    Int(i32),
    /// Written as a number
    Long(i64),
    /// A point in time, written as a numeric date serial
    Timestamp(NaiveDateTime),
    Bool(bool),
    Char(char),
    Text(String),
    /// Written as `yyyy-MM-dd` text
    Date(NaiveDate),
    /// Written as `yyyy-MM-dd HH:mm:ss` text
    DateTime(NaiveDateTime),
    /// A value of a type the accessor cannot write, named for the log
    Unsupported(&'static str),
}

impl CellInput {
    /// Build an `Unsupported` input naming `T`
    pub fn unsupported<T: ?Sized>() -> Self {
        CellInput::Unsupported(std::any::type_name::<T>())
    }

    /// Whether this input writes nothing
    pub fn is_null(&self) -> bool {
        matches!(self, CellInput::Null)
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for CellInput {
                fn from(value: $ty) -> Self {
                    CellInput::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    f64 => Double,
    f32 => Float,
    Decimal => Decimal,
    i32 => Int,
    i64 => Long,
    bool => Bool,
    char => Char,
    String => Text,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
}

impl From<&str> for CellInput {
    fn from(value: &str) -> Self {
        CellInput::Text(value.to_string())
    }
}

impl From<&String> for CellInput {
    fn from(value: &String) -> Self {
        CellInput::Text(value.clone())
    }
}

impl From<i16> for CellInput {
    fn from(value: i16) -> Self {
        CellInput::Int(value.into())
    }
}

impl From<u32> for CellInput {
    fn from(value: u32) -> Self {
        CellInput::Long(value.into())
    }
}

/// Zoned instants are written in their local wall-clock time
impl<Tz: TimeZone> From<DateTime<Tz>> for CellInput {
    fn from(value: DateTime<Tz>) -> Self {
        CellInput::Timestamp(value.naive_local())
    }
}

impl<T: Into<CellInput>> From<Option<T>> for CellInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellInput::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_conversions() {
        assert_eq!(CellInput::from(1.5), CellInput::Double(1.5));
        assert_eq!(CellInput::from(7), CellInput::Int(7));
        assert_eq!(CellInput::from(7i64), CellInput::Long(7));
        assert_eq!(CellInput::from("a"), CellInput::Text("a".into()));
        assert_eq!(CellInput::from(None::<i32>), CellInput::Null);
        assert_eq!(CellInput::from(Some('x')), CellInput::Char('x'));
    }

    #[test]
    fn test_zoned_datetime_is_timestamp() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(CellInput::from(dt), CellInput::Timestamp(dt.naive_utc()));
    }

    #[test]
    fn test_unsupported_names_type() {
        match CellInput::unsupported::<Vec<u8>>() {
            CellInput::Unsupported(name) => assert!(name.contains("Vec")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
