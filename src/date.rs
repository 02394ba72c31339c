//! Generation timestamp formatting
//!
//! The preview records a single UTC timestamp when generation starts. It is
//! rendered two ways: as the three brace groups a LaTeX date macro takes, and
//! as the stamp in the final PDF file name.

use chrono::{NaiveDateTime, Utc};

/// Prefix of the final PDF file name
pub const OUTPUT_PREFIX: &str = "PCA_Template_Preview";

/// Current UTC time, the moment a preview is considered generated
pub fn generation_time() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Format a timestamp as LaTeX macro arguments: `{DD}{MM}{YYYY}`
///
/// Example: `{07}{01}{2026}`
pub fn date_macro_args(time: &NaiveDateTime) -> String {
    time.format("{%d}{%m}{%Y}").to_string()
}

/// Format a timestamp for a file name: ISO 8601 without colons or fractional seconds
///
/// Example: `2026-01-07T093005`
pub fn file_stamp(time: &NaiveDateTime) -> String {
    time.format("%Y-%m-%dT%H%M%S").to_string()
}

/// File name of the final PDF: `PCA_Template_Preview-<stamp>.pdf`
pub fn output_file_name(time: &NaiveDateTime) -> String {
    format!("{}-{}.pdf", OUTPUT_PREFIX, file_stamp(time))
}
