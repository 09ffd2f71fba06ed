//! Accessor configuration

/// Options for a [`SheetAccessor`](super::SheetAccessor)
#[derive(Debug, Clone)]
pub struct AccessorOptions {
    /// `Content-Type` set on exported responses (default: `application/octet-stream`)
    pub content_type: String,
    /// Suffix appended to exported file names (default: `.xlsx`)
    pub file_suffix: String,
    /// Column width, in characters, per character of a title cell (default: 3)
    pub title_width_factor: u32,
    /// chrono pattern for date-only formats and `CellInput::Date`
    pub date_pattern: String,
    /// chrono pattern for time-only formats
    pub time_pattern: String,
    /// chrono pattern for all other date formats and `CellInput::DateTime`
    pub datetime_pattern: String,
}

impl Default for AccessorOptions {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            file_suffix: ".xlsx".to_string(),
            title_width_factor: 3,
            date_pattern: "%Y-%m-%d".to_string(),
            time_pattern: "%H:%M".to_string(),
            datetime_pattern: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}
