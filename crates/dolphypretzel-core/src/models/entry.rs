//! Entry model and file naming rules

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Name prefix marking a remote file as a shared entry.
pub const SHARED_PREFIX: &str = "shared_";

/// Prefix of generated entry file stems.
pub const ENTRY_PREFIX: &str = "entry_";

/// Recognized image extensions, in the order they are probed.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Timestamp layout inside generated stems.
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A unique identifier for an entry: the stem of its text file.
///
/// Ids generated locally look like `entry_20250101_093000` (local time,
/// second granularity, string-sortable). Ids derived from files received
/// from a peer keep whatever stem the de-prefixed file name carried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(String);

impl EntryId {
    /// Create an id stamped with the current local time.
    #[must_use]
    pub fn now() -> Self {
        Self::from_timestamp(Local::now().naive_local())
    }

    /// Create an id stamped with an explicit timestamp.
    #[must_use]
    pub fn from_timestamp(at: NaiveDateTime) -> Self {
        Self(format!("{ENTRY_PREFIX}{}", at.format(STAMP_FORMAT)))
    }

    /// Derive an id from a text file name.
    ///
    /// Returns `None` unless the name ends in `.txt` with a non-empty stem.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".txt")?;
        if stem.is_empty() {
            return None;
        }
        Some(Self(stem.to_string()))
    }

    /// Get the text file stem backing this id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the entry's text file.
    #[must_use]
    pub fn text_file_name(&self) -> String {
        format!("{}.txt", self.0)
    }

    /// File name of the entry's image for the given extension.
    #[must_use]
    pub fn image_file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.0)
    }

    /// Human-facing label: the stem without the `entry_` prefix.
    #[must_use]
    pub fn label(&self) -> &str {
        self.0.strip_prefix(ENTRY_PREFIX).unwrap_or(&self.0)
    }

    /// Creation time parsed from the stem, for ids following the generated
    /// `entry_<YYYYMMDD_HHMMSS>` pattern. `None` for foreign stems.
    #[must_use]
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        let re = Regex::new(r"^entry_(\d{8}_\d{6})$").expect("Invalid regex");
        let captures = re.captures(&self.0)?;
        NaiveDateTime::parse_from_str(&captures[1], STAMP_FORMAT).ok()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(crate::Error::Validation("entry id cannot be empty".into()));
        }
        if s.contains('/') || s.contains('\\') {
            return Err(crate::Error::Validation(format!(
                "entry id cannot contain path separators: {s}"
            )));
        }
        Ok(Self(s.to_string()))
    }
}

/// One journal record: required text plus an optional image alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier (shared base name of the entry's files)
    pub id: EntryId,
    /// Plain text content
    pub text: String,
    /// Path of the image sharing the entry's base name, if one exists
    pub image: Option<PathBuf>,
}

/// Mark a file name as shared for the remote side.
#[must_use]
pub fn shared_name(name: &str) -> String {
    format!("{SHARED_PREFIX}{name}")
}

/// Check whether a file name carries the shared marker.
#[must_use]
pub fn is_shared_name(name: &str) -> bool {
    name.starts_with(SHARED_PREFIX)
}

/// Strip the shared marker from a remote file name, if present.
///
/// # Examples
///
/// ```
/// use dolphypretzel_core::models::strip_shared_prefix;
///
/// assert_eq!(strip_shared_prefix("shared_entry_1.txt"), "entry_1.txt");
/// assert_eq!(strip_shared_prefix("entry_1.txt"), "entry_1.txt");
/// ```
#[must_use]
pub fn strip_shared_prefix(name: &str) -> &str {
    name.strip_prefix(SHARED_PREFIX).unwrap_or(name)
}

/// Check whether an extension names a recognized entry image type.
#[must_use]
pub fn is_image_extension(extension: &str) -> bool {
    IMAGE_EXTENSIONS
        .iter()
        .any(|known| extension.eq_ignore_ascii_case(known))
}
