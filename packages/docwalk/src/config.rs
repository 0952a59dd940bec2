//! Configuration constants and validation functions.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{DocwalkError, Result};

/// Parameter holding the inclusive lower Unix timestamp bound for mail messages.
pub const PARAM_DATE_FROM: &str = "date_from";

/// Parameter holding the inclusive upper Unix timestamp bound for mail messages.
pub const PARAM_DATE_TO: &str = "date_to";

/// Parameter overriding [`MAX_NESTING_DEPTH`] for one traversal.
pub const PARAM_MAX_DEPTH: &str = "max_depth";

/// Maximum number of nested sub-documents opened inside each other.
///
/// An archive inside a mail attachment inside an mbox is three levels.
/// Anything deeper than this is almost certainly an archive bomb.
pub const MAX_NESTING_DEPTH: usize = 16;

/// Maximum `multipart/*` levels inside one mail message.
pub const MAX_MIME_DEPTH: usize = 16;

/// Maximum element depth walked in one XML document.
///
/// Deeper elements are dropped with their subtrees so the walk stays well
/// inside a default thread stack.
pub const MAX_ELEMENT_DEPTH: usize = 128;

/// Environment variable naming a plugin directory for the CLI.
pub const PLUGIN_DIR_ENV: &str = "DOCWALK_PLUGIN_DIR";

/// Default text wrap width for the plain text writer (0 disables wrapping).
pub const DEFAULT_WRAP_WIDTH: usize = 0;

/// Date pattern: YYYY-MM-DD.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// Convert a YYYY-MM-DD date into an inclusive Unix timestamp bound.
///
/// With `end_of_day` the bound is the last second of that day (UTC),
/// otherwise the first.
///
/// # Examples
/// ```
/// use docwalk::config::parse_date_bound;
///
/// assert_eq!(parse_date_bound("2024-01-01", false).unwrap(), 1_704_067_200);
/// assert_eq!(parse_date_bound("2024-01-01", true).unwrap(), 1_704_153_599);
/// assert!(parse_date_bound("2024-13-01", false).is_err());
/// ```
pub fn parse_date_bound(date_str: &str, end_of_day: bool) -> Result<u64> {
    if !DATE_PATTERN.is_match(date_str) {
        return Err(DocwalkError::InvalidDate(date_str.to_string()));
    }

    let date = chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| DocwalkError::InvalidDate(date_str.to_string()))?;

    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| DocwalkError::InvalidDate(date_str.to_string()))?;

    u64::try_from(time.and_utc().timestamp())
        .map_err(|_| DocwalkError::InvalidDate(format!("{date_str} is before 1970-01-01")))
}

/// Reduce a file name or extension to its lowercase lookup key.
///
/// The suffix after the last `.` is used; a name without a dot is taken as
/// the extension itself. Leading directories are ignored.
///
/// # Examples
/// ```
/// use docwalk::config::normalize_extension;
///
/// assert_eq!(normalize_extension("Inbox.MBOX"), "mbox");
/// assert_eq!(normalize_extension(".txt"), "txt");
/// assert_eq!(normalize_extension("eml"), "eml");
/// assert_eq!(normalize_extension("dir.d/archive.tar.gz"), "gz");
/// ```
pub fn normalize_extension(name: &str) -> String {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let suffix = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or(file_name);
    suffix.trim().to_lowercase()
}
